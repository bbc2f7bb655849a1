//! Common data types used throughout the StakeHub crates

pub mod address;
pub mod badge;
pub mod event;
pub mod pool;
pub mod stake;
pub mod validator;

pub use address::Address;
pub use badge::{BadgeKind, UserBadge};
pub use event::{ContractEvent, EventCursor, EventKind};
pub use pool::CommunityPool;
pub use stake::Stake;
pub use validator::{Validator, ValidatorSummary};

/// Denominator for every basis-point quantity (commission, uptime, rates).
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Base units per whole token.
pub const DECIMALS: u32 = 18;

/// Position of the ledger in block time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockContext {
    pub number: u64,
    pub timestamp: i64,
}

impl BlockContext {
    pub fn new(number: u64, timestamp: i64) -> Self {
        Self { number, timestamp }
    }
}
