//! Ledger events
//!
//! Every state change in the ledger is announced by one or more events. The
//! indexer consumes them in `(block_number, log_index)` order.

use {
    super::Address,
    serde::{Deserialize, Serialize},
    std::fmt::{Display, Formatter, Result as FmtResult},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub block_number: u64,
    pub log_index: u32,
    pub timestamp: i64,
    pub kind: EventKind,
}

impl ContractEvent {
    pub fn cursor(&self) -> EventCursor {
        EventCursor {
            block_number: self.block_number,
            log_index: self.log_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    ValidatorRegistered {
        validator: Address,
        name: String,
    },
    ValidatorUpdated {
        validator: Address,
    },
    StakePlaced {
        user: Address,
        validator: Address,
        #[serde(with = "crate::utils::decimal_u128")]
        amount: u128,
    },
    StakeUpdated {
        user: Address,
        validator: Address,
    },
    RewardClaimed {
        user: Address,
        validator: Address,
        #[serde(with = "crate::utils::decimal_u128")]
        amount: u128,
    },
    BadgeEarned {
        user: Address,
        badge_name: String,
        level: u8,
    },
    CommunityPoolCreated {
        pool_id: u64,
        name: String,
    },
    CommunityPoolClosed {
        pool_id: u64,
    },
    PoolContribution {
        pool_id: u64,
        user: Address,
        #[serde(with = "crate::utils::decimal_u128")]
        amount: u128,
    },
    ReferralRecorded {
        referrer: Address,
        referee: Address,
    },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ValidatorRegistered { .. } => "ValidatorRegistered",
            EventKind::ValidatorUpdated { .. } => "ValidatorUpdated",
            EventKind::StakePlaced { .. } => "StakePlaced",
            EventKind::StakeUpdated { .. } => "StakeUpdated",
            EventKind::RewardClaimed { .. } => "RewardClaimed",
            EventKind::BadgeEarned { .. } => "BadgeEarned",
            EventKind::CommunityPoolCreated { .. } => "CommunityPoolCreated",
            EventKind::CommunityPoolClosed { .. } => "CommunityPoolClosed",
            EventKind::PoolContribution { .. } => "PoolContribution",
            EventKind::ReferralRecorded { .. } => "ReferralRecorded",
        }
    }
}

/// Position of the last event applied to a mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct EventCursor {
    pub block_number: u64,
    pub log_index: u32,
}

impl Display for EventCursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.block_number, self.log_index)
    }
}
