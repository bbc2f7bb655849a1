// crates/stakehub-staking/src/rewards/calculation.rs

use {
    crate::{Result, StakingError},
    stakehub_common::types::{Stake, BPS_DENOMINATOR},
};

pub const SECONDS_PER_YEAR: u128 = 365 * 24 * 60 * 60;

/// Rewards accrued over one interval, split between staker and validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewardSplit {
    pub gross: u128,
    pub commission: u128,
    pub net: u128,
}

/// Simple-interest accrual: `principal × rate × elapsed / year`, with the
/// validator's commission taken out of the gross amount.
#[derive(Debug, Clone)]
pub struct RewardCalculator {
    reward_rate_bps: u16,
}

impl RewardCalculator {
    pub fn new(reward_rate_bps: u16) -> Self {
        Self { reward_rate_bps }
    }

    pub fn split(&self, principal: u128, commission_bps: u16, elapsed_secs: i64) -> Result<RewardSplit> {
        if elapsed_secs <= 0 || principal == 0 || self.reward_rate_bps == 0 {
            return Ok(RewardSplit::default());
        }

        let gross = mul_div(
            principal,
            self.reward_rate_bps as u128 * elapsed_secs as u128,
            BPS_DENOMINATOR * SECONDS_PER_YEAR,
        )
        .ok_or(StakingError::Overflow("reward accrual"))?;
        let commission = mul_div(gross, commission_bps as u128, BPS_DENOMINATOR)
            .ok_or(StakingError::Overflow("commission"))?;

        Ok(RewardSplit {
            gross,
            commission,
            net: gross - commission,
        })
    }

    /// Rewards accrued on `stake` since its last checkpoint.
    pub fn pending(&self, stake: &Stake, commission_bps: u16, now: i64) -> Result<RewardSplit> {
        self.split(stake.amount, commission_bps, now.saturating_sub(stake.accrued_at))
    }
}

/// `floor(value × mul / div)`, `None` only when the result itself does not
/// fit. `value` is split as `q × div + r` so the intermediate product stays
/// below `div × mul`.
fn mul_div(value: u128, mul: u128, div: u128) -> Option<u128> {
    let (q, r) = (value / div, value % div);
    let low = r.checked_mul(mul)? / div;
    q.checked_mul(mul)?.checked_add(low)
}

#[cfg(test)]
mod tests {
    use {super::*, stakehub_common::types::Address};

    const TOKEN: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn one_year_at_rate_with_commission() {
        let calc = RewardCalculator::new(520);
        let split = calc.split(100 * TOKEN, 1000, SECONDS_PER_YEAR as i64).unwrap();
        assert_eq!(split.gross, 5_200_000_000_000_000_000);
        assert_eq!(split.commission, 520_000_000_000_000_000);
        assert_eq!(split.net, 4_680_000_000_000_000_000);
    }

    #[test]
    fn zero_elapsed_accrues_nothing() {
        let calc = RewardCalculator::new(520);
        assert_eq!(calc.split(10 * TOKEN, 1000, 0).unwrap(), RewardSplit::default());
        assert_eq!(calc.split(10 * TOKEN, 1000, -5).unwrap(), RewardSplit::default());
    }

    #[test]
    fn net_never_exceeds_gross() {
        let calc = RewardCalculator::new(520);
        for commission in [0u16, 1, 999, 3000, 10_000] {
            let split = calc.split(7 * TOKEN + 3, commission, 86_400 * 17).unwrap();
            assert_eq!(split.gross, split.net + split.commission);
        }
    }

    #[test]
    fn large_principal_does_not_overflow() {
        let calc = RewardCalculator::new(520);
        let principal = 100_000_000_000 * TOKEN;
        let split = calc.split(principal, 1000, SECONDS_PER_YEAR as i64).unwrap();
        assert_eq!(split.gross, principal * 520 / 10_000);
        assert_eq!(split.commission, split.gross / 10);

        let split = calc.split(u128::MAX / 2, 0, 10).unwrap();
        assert!(split.gross > 0);
    }

    #[test]
    fn mul_div_is_exact() {
        assert_eq!(mul_div(7, 3, 2), Some(10));
        assert_eq!(mul_div(u128::MAX, 1, 1), Some(u128::MAX));
        assert_eq!(mul_div(u128::MAX, 3, 3), Some(u128::MAX));
        assert_eq!(mul_div(u128::MAX, 2, 1), None);
    }

    #[test]
    fn overflow_is_reported() {
        let calc = RewardCalculator::new(10_000);
        assert_eq!(
            calc.split(u128::MAX, 0, i64::MAX),
            Err(StakingError::Overflow("reward accrual"))
        );
    }

    #[test]
    fn clock_far_before_checkpoint_accrues_nothing() {
        let calc = RewardCalculator::new(520);
        let stake = Stake::new(Address::new([9; 20]), Address::new([1; 20]), 10 * TOKEN, 1_000);
        assert_eq!(calc.pending(&stake, 1000, i64::MIN).unwrap(), RewardSplit::default());
    }
}
