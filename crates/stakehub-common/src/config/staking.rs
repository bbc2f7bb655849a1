// crates/stakehub-common/src/config/staking.rs

use {
    crate::{errors::Result, types::BPS_DENOMINATOR, Error},
    serde::{Deserialize, Serialize},
};

const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Ledger parameters. All rates are in basis points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StakingConfig {
    /// Ceiling on validator commission.
    pub max_commission_bps: u16,
    /// Annual reward rate paid on staked principal.
    pub reward_rate_bps: u16,
    /// Uptime assigned to newly registered validators.
    pub default_uptime_bps: u16,
    /// Smallest accepted stake, in base units.
    #[serde(with = "crate::utils::decimal_u128")]
    pub min_stake: u128,
    /// Stake age required for the Loyal Staker badge.
    pub loyalty_period_secs: i64,
    /// Total stake across validators required for the Bulk Staker badge.
    #[serde(with = "crate::utils::decimal_u128")]
    pub bulk_stake_threshold: u128,
    /// Referrals required for the Referral Leader badge.
    pub referral_leader_threshold: u32,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            max_commission_bps: 3000,
            reward_rate_bps: 520,
            default_uptime_bps: 9800,
            min_stake: 1,
            loyalty_period_secs: 30 * 24 * 60 * 60,
            bulk_stake_threshold: 1000 * ONE_TOKEN,
            referral_leader_threshold: 5,
        }
    }
}

impl StakingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_commission_bps as u128 > BPS_DENOMINATOR {
            return Err(Error::Config(format!(
                "max_commission_bps {} exceeds {}",
                self.max_commission_bps, BPS_DENOMINATOR
            )));
        }
        if self.default_uptime_bps as u128 > BPS_DENOMINATOR {
            return Err(Error::Config("default_uptime_bps exceeds 10000".into()));
        }
        if self.min_stake == 0 {
            return Err(Error::Config("min_stake must be at least 1".into()));
        }
        if self.loyalty_period_secs < 0 {
            return Err(Error::Config("loyalty_period_secs must not be negative".into()));
        }
        Ok(())
    }
}
