//! Row shapes returned by the query side of [`Storage`](crate::Storage).

use {
    serde::{Deserialize, Serialize},
    stakehub_common::types::{Address, CommunityPool, Stake},
};

/// Mirrored stake row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub user_address: Address,
    pub validator_address: Address,
    #[serde(with = "stakehub_common::utils::decimal_u128")]
    pub amount: u128,
    pub since: i64,
    pub auto_compound: bool,
    #[serde(with = "stakehub_common::utils::decimal_u128")]
    pub rewards: u128,
    pub last_claim: i64,
}

impl From<&Stake> for StakeRecord {
    fn from(stake: &Stake) -> Self {
        Self {
            user_address: stake.user,
            validator_address: stake.validator,
            amount: stake.amount,
            since: stake.since,
            auto_compound: stake.auto_compound,
            rewards: stake.rewards,
            last_claim: stake.last_claim,
        }
    }
}

/// One staker of a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakerRecord {
    pub user_address: Address,
    #[serde(with = "stakehub_common::utils::decimal_u128")]
    pub amount: u128,
    pub since: i64,
    pub auto_compound: bool,
}

/// A user's stake joined with the validator it is held with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStakeRecord {
    #[serde(flatten)]
    pub stake: StakeRecord,
    pub validator_name: String,
    pub uptime: u16,
    pub commission_rate: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeRecord {
    pub name: String,
    pub description: String,
    pub level: u8,
    pub earned_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    #[serde(flatten)]
    pub pool: CommunityPool,
    pub validator_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub from_address: Address,
    pub to_address: Address,
    pub content: String,
    pub timestamp: i64,
}
