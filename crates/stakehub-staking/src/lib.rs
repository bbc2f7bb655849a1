//! StakeHub staking ledger
//!
//! Validator registry, per-(user, validator) stake accounting, commission and
//! reward accrual, community pools, badges and referrals. Calls execute one
//! at a time against a [`BlockContext`]; each successful call appends
//! [`ContractEvent`]s that an indexer can mirror.
//!
//! [`BlockContext`]: stakehub_common::types::BlockContext
//! [`ContractEvent`]: stakehub_common::types::ContractEvent

pub mod badges;
pub mod pools;
pub mod rewards;
pub mod staking;
pub mod tx;

pub use stakehub_common::StakingConfig;
pub use staking::{StakeHub, ValidatorProfile};
pub use tx::{Call, Transaction};

use {stakehub_common::Address, thiserror::Error};

/// Reasons a ledger call is rejected. A rejected call leaves state untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakingError {
    #[error("Commission rate cannot exceed {max} bps (got {rate})")]
    CommissionTooHigh { rate: u16, max: u16 },

    #[error("Validator already exists: {0}")]
    ValidatorExists(Address),

    #[error("Validator not found: {0}")]
    ValidatorNotFound(Address),

    #[error("Validator is not active: {0}")]
    ValidatorInactive(Address),

    #[error("Invalid stake amount: {0}")]
    InvalidStakeAmount(String),

    #[error("No stake from {user} with validator {validator}")]
    NoStake { user: Address, validator: Address },

    #[error("No rewards to claim")]
    NoRewards,

    #[error("Community pool not found: {0}")]
    PoolNotFound(u64),

    #[error("Community pool is not active: {0}")]
    PoolInactive(u64),

    #[error("Invalid contribution: {0}")]
    InvalidContribution(String),

    #[error("Invalid referral: {0}")]
    InvalidReferral(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validator index out of range: {0}")]
    InvalidIndex(usize),

    #[error("Block {number} at {timestamp} precedes the ledger clock")]
    StaleBlock { number: u64, timestamp: i64 },

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),
}

pub type Result<T> = std::result::Result<T, StakingError>;

pub(crate) fn checked_add(a: u128, b: u128, what: &'static str) -> Result<u128> {
    a.checked_add(b).ok_or(StakingError::Overflow(what))
}
