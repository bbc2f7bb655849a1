use {
    super::Address,
    serde::{Deserialize, Serialize},
};

/// A user's position with one validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub user: Address,
    pub validator: Address,
    #[serde(with = "crate::utils::decimal_u128")]
    pub amount: u128,
    /// Timestamp of the first stake to this validator.
    pub since: i64,
    pub auto_compound: bool,
    /// Net rewards settled but not yet claimed.
    #[serde(with = "crate::utils::decimal_u128")]
    pub rewards: u128,
    pub last_claim: i64,
    /// Rewards after this timestamp are still pending.
    pub accrued_at: i64,
}

impl Stake {
    pub fn new(user: Address, validator: Address, amount: u128, now: i64) -> Self {
        Self {
            user,
            validator,
            amount,
            since: now,
            auto_compound: false,
            rewards: 0,
            last_claim: now,
            accrued_at: now,
        }
    }
}
