//! Reward accrual and commission math

mod calculation;

pub use calculation::{RewardCalculator, RewardSplit, SECONDS_PER_YEAR};
