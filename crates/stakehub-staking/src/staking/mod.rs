// crates/stakehub-staking/src/staking/mod.rs

//! The StakeHub ledger.
//!
//! Mirrors the on-chain contract: validators register with a bounded
//! commission, users stake against active validators, rewards accrue with
//! time on the staked principal and are claimed net of commission.

mod delegation;
mod registry;

pub use delegation::DelegationBook;
pub use registry::ValidatorRegistry;

use {
    crate::{
        badges::{BadgeTracker, ReferralBook},
        checked_add,
        pools::PoolManager,
        rewards::{RewardCalculator, RewardSplit},
        Result, StakingConfig, StakingError,
    },
    serde::{Deserialize, Serialize},
    stakehub_common::types::{
        Address, BadgeKind, BlockContext, CommunityPool, ContractEvent, EventKind, Stake,
        UserBadge, Validator, ValidatorSummary, BPS_DENOMINATOR,
    },
    tracing::{debug, info},
};

/// Editable validator fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub social_links: String,
    pub commission_rate: u16,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Result of bringing a stake's accrued rewards up to `now`.
#[derive(Debug, Clone, Copy)]
struct Settlement {
    split: RewardSplit,
    new_rewards: u128,
}

pub struct StakeHub {
    config: StakingConfig,
    owner: Address,
    registry: ValidatorRegistry,
    delegations: DelegationBook,
    calculator: RewardCalculator,
    pools: PoolManager,
    badges: BadgeTracker,
    referrals: ReferralBook,
    total_staked: u128,
    rewards_paid: u128,
    clock: Option<BlockContext>,
    next_log_index: u32,
    events: Vec<ContractEvent>,
}

impl StakeHub {
    pub fn new(config: StakingConfig, owner: Address) -> Self {
        let calculator = RewardCalculator::new(config.reward_rate_bps);
        Self {
            config,
            owner,
            registry: ValidatorRegistry::new(),
            delegations: DelegationBook::new(),
            calculator,
            pools: PoolManager::new(),
            badges: BadgeTracker::new(),
            referrals: ReferralBook::new(),
            total_staked: 0,
            rewards_paid: 0,
            clock: None,
            next_log_index: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &StakingConfig {
        &self.config
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn clock(&self) -> Option<BlockContext> {
        self.clock
    }

    // ---- validators ----

    pub fn register_validator(
        &mut self,
        ctx: BlockContext,
        sender: Address,
        name: &str,
        description: &str,
        social_links: &str,
        commission_rate: u16,
    ) -> Result<()> {
        self.check_clock(&ctx)?;
        self.check_commission(commission_rate)?;
        let name = require_text(name, "validator name")?;
        if self.registry.contains(&sender) {
            return Err(StakingError::ValidatorExists(sender));
        }

        self.registry.insert(Validator {
            address: sender,
            name: name.clone(),
            description: description.to_string(),
            social_links: social_links.to_string(),
            commission_rate,
            total_staked: 0,
            uptime: self.config.default_uptime_bps,
            user_count: 0,
            is_active: true,
            registered_at: ctx.timestamp,
            commission_earned: 0,
        });

        info!("Registered validator {} ({}), commission {} bps", sender, name, commission_rate);
        self.emit(&ctx, EventKind::ValidatorRegistered { validator: sender, name });
        Ok(())
    }

    /// Updates the sender's own validator profile. A commission change first
    /// settles every staker's pending rewards at the old rate.
    pub fn update_validator(
        &mut self,
        ctx: BlockContext,
        sender: Address,
        profile: ValidatorProfile,
    ) -> Result<()> {
        self.check_clock(&ctx)?;
        self.check_commission(profile.commission_rate)?;
        let name = require_text(&profile.name, "validator name")?;
        let validator = self
            .registry
            .get(&sender)
            .ok_or(StakingError::ValidatorNotFound(sender))?;

        let mut settlements = Vec::new();
        let mut commission_earned = validator.commission_earned;
        if validator.commission_rate != profile.commission_rate {
            for stake in self.delegations.stakers_of(&sender) {
                let settlement = self.settle(stake, validator.commission_rate, ctx.timestamp)?;
                commission_earned =
                    checked_add(commission_earned, settlement.split.commission, "commission earned")?;
                settlements.push((stake.user, settlement));
            }
        }

        let now = ctx.timestamp;
        for (user, settlement) in &settlements {
            let stake = self.stake_mut(user, &sender)?;
            stake.rewards = settlement.new_rewards;
            stake.accrued_at = now;
        }

        let validator = self.validator_mut(&sender)?;
        validator.name = name;
        validator.description = profile.description;
        validator.social_links = profile.social_links;
        validator.commission_rate = profile.commission_rate;
        validator.is_active = profile.is_active;
        validator.commission_earned = commission_earned;

        debug!("Updated validator {} (active: {})", sender, profile.is_active);
        self.emit(&ctx, EventKind::ValidatorUpdated { validator: sender });
        for (user, settlement) in settlements {
            if settlement.split.net > 0 {
                self.emit(&ctx, EventKind::StakeUpdated { user, validator: sender });
            }
        }
        Ok(())
    }

    /// Owner-only: records a validator's measured uptime.
    pub fn set_validator_uptime(
        &mut self,
        ctx: BlockContext,
        sender: Address,
        validator: Address,
        uptime: u16,
    ) -> Result<()> {
        self.check_clock(&ctx)?;
        if sender != self.owner {
            return Err(StakingError::Unauthorized(format!(
                "{} is not the ledger owner",
                sender
            )));
        }
        if uptime as u128 > BPS_DENOMINATOR {
            return Err(StakingError::InvalidInput(format!(
                "uptime {} exceeds {} bps",
                uptime, BPS_DENOMINATOR
            )));
        }
        self.validator_mut(&validator)?.uptime = uptime;
        self.emit(&ctx, EventKind::ValidatorUpdated { validator });
        Ok(())
    }

    // ---- stakes ----

    /// Stakes `amount` with `validator`. Repeat stakes accumulate into the
    /// existing record after settling its pending rewards.
    pub fn stake(
        &mut self,
        ctx: BlockContext,
        sender: Address,
        validator: Address,
        amount: u128,
    ) -> Result<()> {
        self.check_clock(&ctx)?;
        let info = self
            .registry
            .get(&validator)
            .filter(|v| v.is_active)
            .ok_or(StakingError::ValidatorInactive(validator))?;
        if amount < self.config.min_stake {
            return Err(StakingError::InvalidStakeAmount(format!(
                "{} is below the minimum of {}",
                amount, self.config.min_stake
            )));
        }

        let now = ctx.timestamp;
        let first_stake_ever = !self.delegations.has_any(&sender);
        let validator_total = checked_add(info.total_staked, amount, "validator total")?;
        let total_staked = checked_add(self.total_staked, amount, "total staked")?;

        match self.delegations.get(&sender, &validator) {
            Some(existing) => {
                let settlement = self.settle(existing, info.commission_rate, now)?;
                let new_amount = checked_add(existing.amount, amount, "stake amount")?;
                let commission_earned =
                    checked_add(info.commission_earned, settlement.split.commission, "commission earned")?;

                let stake = self.stake_mut(&sender, &validator)?;
                stake.amount = new_amount;
                stake.rewards = settlement.new_rewards;
                stake.accrued_at = now;

                let info = self.validator_mut(&validator)?;
                info.total_staked = validator_total;
                info.commission_earned = commission_earned;
            }
            None => {
                let user_count = info
                    .user_count
                    .checked_add(1)
                    .ok_or(StakingError::Overflow("user count"))?;
                self.delegations.insert(Stake::new(sender, validator, amount, now));

                let info = self.validator_mut(&validator)?;
                info.total_staked = validator_total;
                info.user_count = user_count;
            }
        }
        self.total_staked = total_staked;

        debug!("{} staked {} with {}", sender, amount, validator);
        self.emit(&ctx, EventKind::StakePlaced { user: sender, validator, amount });

        if first_stake_ever {
            self.award(&ctx, sender, BadgeKind::FirstStake);
        }
        self.check_bulk_badge(&ctx, sender);
        Ok(())
    }

    pub fn set_auto_compound(
        &mut self,
        ctx: BlockContext,
        sender: Address,
        validator: Address,
        enabled: bool,
    ) -> Result<()> {
        self.check_clock(&ctx)?;
        let stake = self
            .delegations
            .get(&sender, &validator)
            .ok_or(StakingError::NoStake { user: sender, validator })?;
        let info = self
            .registry
            .get(&validator)
            .ok_or(StakingError::ValidatorNotFound(validator))?;
        let settlement = self.settle(stake, info.commission_rate, ctx.timestamp)?;
        let commission_earned =
            checked_add(info.commission_earned, settlement.split.commission, "commission earned")?;

        let stake = self.stake_mut(&sender, &validator)?;
        stake.rewards = settlement.new_rewards;
        stake.accrued_at = ctx.timestamp;
        stake.auto_compound = enabled;
        self.validator_mut(&validator)?.commission_earned = commission_earned;

        self.emit(&ctx, EventKind::StakeUpdated { user: sender, validator });
        Ok(())
    }

    /// Rewards the user could claim at `now`: settled rewards plus pending
    /// net rewards since the last checkpoint.
    pub fn calculate_rewards(&self, user: &Address, validator: &Address, now: i64) -> Result<u128> {
        let Some(stake) = self.delegations.get(user, validator) else {
            return Ok(0);
        };
        let commission_rate = self
            .registry
            .get(validator)
            .map(|v| v.commission_rate)
            .unwrap_or(0);
        Ok(self.settle(stake, commission_rate, now)?.new_rewards)
    }

    /// Pays out the sender's rewards with `validator`, net of commission.
    /// With auto-compound enabled the payout is restaked instead.
    pub fn claim_rewards(&mut self, ctx: BlockContext, sender: Address, validator: Address) -> Result<u128> {
        self.check_clock(&ctx)?;
        let now = ctx.timestamp;
        let stake = self
            .delegations
            .get(&sender, &validator)
            .ok_or(StakingError::NoStake { user: sender, validator })?;
        let info = self
            .registry
            .get(&validator)
            .ok_or(StakingError::ValidatorNotFound(validator))?;

        let settlement = self.settle(stake, info.commission_rate, now)?;
        let claimable = settlement.new_rewards;
        if claimable == 0 {
            return Err(StakingError::NoRewards);
        }
        let commission_earned =
            checked_add(info.commission_earned, settlement.split.commission, "commission earned")?;
        let rewards_paid = checked_add(self.rewards_paid, claimable, "rewards paid")?;
        let compound = stake.auto_compound;
        let held_since = stake.since;
        let (new_amount, validator_total, total_staked) = if compound {
            (
                checked_add(stake.amount, claimable, "stake amount")?,
                checked_add(info.total_staked, claimable, "validator total")?,
                checked_add(self.total_staked, claimable, "total staked")?,
            )
        } else {
            (stake.amount, info.total_staked, self.total_staked)
        };

        let stake = self.stake_mut(&sender, &validator)?;
        stake.amount = new_amount;
        stake.rewards = 0;
        stake.last_claim = now;
        stake.accrued_at = now;

        let info = self.validator_mut(&validator)?;
        info.total_staked = validator_total;
        info.commission_earned = commission_earned;

        self.total_staked = total_staked;
        self.rewards_paid = rewards_paid;

        info!(
            "{} claimed {} from {}{}",
            sender,
            claimable,
            validator,
            if compound { " (compounded)" } else { "" }
        );
        self.emit(
            &ctx,
            EventKind::RewardClaimed { user: sender, validator, amount: claimable },
        );

        if now - held_since >= self.config.loyalty_period_secs {
            self.award(&ctx, sender, BadgeKind::LoyalStaker);
        }
        if compound {
            self.check_bulk_badge(&ctx, sender);
        }
        Ok(claimable)
    }

    // ---- community pools ----

    pub fn create_community_pool(
        &mut self,
        ctx: BlockContext,
        sender: Address,
        name: &str,
        validator: Option<Address>,
    ) -> Result<u64> {
        self.check_clock(&ctx)?;
        let name = require_text(name, "pool name")?;
        if let Some(validator) = validator {
            if !self.registry.is_active(&validator) {
                return Err(StakingError::ValidatorInactive(validator));
            }
        }
        let pool_id = self.pools.create(sender, name.clone(), validator, ctx.timestamp);
        info!("Created community pool {} ({})", pool_id, name);
        self.emit(&ctx, EventKind::CommunityPoolCreated { pool_id, name });
        Ok(pool_id)
    }

    pub fn contribute_to_pool(
        &mut self,
        ctx: BlockContext,
        sender: Address,
        pool_id: u64,
        amount: u128,
    ) -> Result<()> {
        self.check_clock(&ctx)?;
        let contribution = self.pools.contribute(pool_id, sender, amount)?;
        debug!(
            "{} contributed {} to pool {} ({} in total)",
            sender, amount, pool_id, contribution.user_total
        );
        self.emit(&ctx, EventKind::PoolContribution { pool_id, user: sender, amount });
        if contribution.first_for_user {
            self.award(&ctx, sender, BadgeKind::CommunityMember);
        }
        Ok(())
    }

    pub fn close_community_pool(&mut self, ctx: BlockContext, sender: Address, pool_id: u64) -> Result<()> {
        self.check_clock(&ctx)?;
        self.pools.close(pool_id, sender, self.owner)?;
        self.emit(&ctx, EventKind::CommunityPoolClosed { pool_id });
        Ok(())
    }

    // ---- referrals ----

    /// Records that `sender` was referred by `referrer`.
    pub fn record_referral(&mut self, ctx: BlockContext, sender: Address, referrer: Address) -> Result<()> {
        self.check_clock(&ctx)?;
        let count = self.referrals.record(referrer, sender)?;
        self.emit(&ctx, EventKind::ReferralRecorded { referrer, referee: sender });
        if count >= self.config.referral_leader_threshold {
            self.award(&ctx, referrer, BadgeKind::ReferralLeader);
        }
        Ok(())
    }

    // ---- views ----

    pub fn get_validator_count(&self) -> usize {
        self.registry.len()
    }

    pub fn get_validator_info(&self, index: usize) -> Result<ValidatorSummary> {
        self.registry
            .by_index(index)
            .map(ValidatorSummary::from)
            .ok_or(StakingError::InvalidIndex(index))
    }

    pub fn validator(&self, address: &Address) -> Option<&Validator> {
        self.registry.get(address)
    }

    pub fn validators(&self) -> impl Iterator<Item = &Validator> {
        self.registry.iter()
    }

    pub fn get_total_staked(&self) -> u128 {
        self.total_staked
    }

    pub fn get_user_stake(&self, user: &Address, validator: &Address) -> Option<&Stake> {
        self.delegations.get(user, validator)
    }

    pub fn stakers_of(&self, validator: &Address) -> Vec<&Stake> {
        self.delegations.stakers_of(validator)
    }

    pub fn community_pool(&self, pool_id: u64) -> Option<&CommunityPool> {
        self.pools.get(pool_id)
    }

    pub fn community_pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn pool_contribution(&self, pool_id: u64, user: &Address) -> u128 {
        self.pools.contribution(pool_id, user)
    }

    pub fn user_badges(&self, user: &Address) -> Vec<UserBadge> {
        self.badges.user_badges(user)
    }

    pub fn referral_count(&self, referrer: &Address) -> u32 {
        self.referrals.count(referrer)
    }

    pub fn rewards_paid(&self) -> u128 {
        self.rewards_paid
    }

    /// Takes the events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    /// Recomputes aggregate totals from the individual stakes and reports
    /// the first mismatch.
    pub fn audit(&self) -> std::result::Result<(), String> {
        let mut grand_total = 0u128;
        for validator in self.registry.iter() {
            let stakers = self.delegations.stakers_of(&validator.address);
            let sum = stakers
                .iter()
                .try_fold(0u128, |acc, s| acc.checked_add(s.amount))
                .ok_or_else(|| format!("stake sum overflows for {}", validator.address))?;
            if sum != validator.total_staked {
                return Err(format!(
                    "validator {} total {} != sum of stakes {}",
                    validator.address, validator.total_staked, sum
                ));
            }
            if stakers.len() != validator.user_count as usize {
                return Err(format!(
                    "validator {} user count {} != {} stakers",
                    validator.address,
                    validator.user_count,
                    stakers.len()
                ));
            }
            grand_total = grand_total
                .checked_add(sum)
                .ok_or_else(|| "grand total overflows".to_string())?;
        }
        if grand_total != self.total_staked {
            return Err(format!(
                "total staked {} != sum of validators {}",
                self.total_staked, grand_total
            ));
        }
        Ok(())
    }

    // ---- internals ----

    pub(crate) fn pending_event_count(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn split_events_from(&mut self, start: usize) -> Vec<ContractEvent> {
        self.events.split_off(start.min(self.events.len()))
    }

    fn check_clock(&self, ctx: &BlockContext) -> Result<()> {
        match self.clock {
            Some(clock) if ctx.number < clock.number || ctx.timestamp < clock.timestamp => {
                Err(StakingError::StaleBlock {
                    number: ctx.number,
                    timestamp: ctx.timestamp,
                })
            }
            _ => Ok(()),
        }
    }

    fn check_commission(&self, rate: u16) -> Result<()> {
        if rate > self.config.max_commission_bps {
            return Err(StakingError::CommissionTooHigh {
                rate,
                max: self.config.max_commission_bps,
            });
        }
        Ok(())
    }

    fn settle(&self, stake: &Stake, commission_rate: u16, now: i64) -> Result<Settlement> {
        let split = self.calculator.pending(stake, commission_rate, now)?;
        Ok(Settlement {
            split,
            new_rewards: checked_add(stake.rewards, split.net, "accrued rewards")?,
        })
    }

    fn validator_mut(&mut self, address: &Address) -> Result<&mut Validator> {
        self.registry
            .get_mut(address)
            .ok_or(StakingError::ValidatorNotFound(*address))
    }

    fn stake_mut(&mut self, user: &Address, validator: &Address) -> Result<&mut Stake> {
        self.delegations
            .get_mut(user, validator)
            .ok_or(StakingError::NoStake { user: *user, validator: *validator })
    }

    fn check_bulk_badge(&mut self, ctx: &BlockContext, user: Address) {
        if self.delegations.user_total(&user) >= self.config.bulk_stake_threshold {
            self.award(ctx, user, BadgeKind::BulkStaker);
        }
    }

    fn award(&mut self, ctx: &BlockContext, user: Address, badge: BadgeKind) {
        if self.badges.award(user, badge, ctx.timestamp) {
            info!("{} earned badge {}", user, badge.name());
            self.emit(
                ctx,
                EventKind::BadgeEarned {
                    user,
                    badge_name: badge.name().to_string(),
                    level: badge.level(),
                },
            );
        }
    }

    fn emit(&mut self, ctx: &BlockContext, kind: EventKind) {
        if self.clock.map(|c| c.number) != Some(ctx.number) {
            self.next_log_index = 0;
        }
        self.clock = Some(*ctx);
        self.events.push(ContractEvent {
            block_number: ctx.number,
            log_index: self.next_log_index,
            timestamp: ctx.timestamp,
            kind,
        });
        self.next_log_index += 1;
    }
}

fn require_text(value: &str, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StakingError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(value.to_string())
}
