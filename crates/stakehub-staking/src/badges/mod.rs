// crates/stakehub-staking/src/badges/mod.rs

//! Badge awards and referral bookkeeping

use {
    crate::{Result, StakingError},
    stakehub_common::types::{Address, BadgeKind, UserBadge},
    std::collections::{BTreeMap, HashMap},
};

/// Tracks which badges each user holds. A badge is awarded at most once.
#[derive(Debug, Default)]
pub struct BadgeTracker {
    earned: HashMap<Address, BTreeMap<BadgeKind, i64>>,
}

impl BadgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the badge is new for this user.
    pub fn award(&mut self, user: Address, badge: BadgeKind, now: i64) -> bool {
        let held = self.earned.entry(user).or_default();
        if held.contains_key(&badge) {
            return false;
        }
        held.insert(badge, now);
        true
    }

    pub fn user_badges(&self, user: &Address) -> Vec<UserBadge> {
        self.earned
            .get(user)
            .map(|held| {
                held.iter()
                    .map(|(badge, earned_at)| UserBadge {
                        user: *user,
                        badge: *badge,
                        earned_at: *earned_at,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct ReferralBook {
    referrer_of: HashMap<Address, Address>,
    counts: HashMap<Address, u32>,
}

impl ReferralBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a referral without recording it.
    pub fn check(&self, referrer: &Address, referee: &Address) -> Result<()> {
        if referrer == referee {
            return Err(StakingError::InvalidReferral("cannot refer yourself".into()));
        }
        if let Some(existing) = self.referrer_of.get(referee) {
            return Err(StakingError::InvalidReferral(format!(
                "{} was already referred by {}",
                referee, existing
            )));
        }
        Ok(())
    }

    /// Records a checked referral and returns the referrer's new count.
    pub fn record(&mut self, referrer: Address, referee: Address) -> Result<u32> {
        self.check(&referrer, &referee)?;
        self.referrer_of.insert(referee, referrer);
        let count = self.counts.entry(referrer).or_default();
        *count += 1;
        Ok(*count)
    }

    pub fn count(&self, referrer: &Address) -> u32 {
        self.counts.get(referrer).copied().unwrap_or(0)
    }

    pub fn referrer_of(&self, referee: &Address) -> Option<Address> {
        self.referrer_of.get(referee).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    #[test]
    fn badges_are_awarded_once() {
        let mut tracker = BadgeTracker::new();
        assert!(tracker.award(addr(1), BadgeKind::FirstStake, 10));
        assert!(!tracker.award(addr(1), BadgeKind::FirstStake, 20));
        assert!(tracker.award(addr(1), BadgeKind::BulkStaker, 30));

        let badges = tracker.user_badges(&addr(1));
        assert_eq!(badges.len(), 2);
        assert_eq!(badges[0].earned_at, 10);
        assert!(tracker.user_badges(&addr(2)).is_empty());
    }

    #[test]
    fn referrals_reject_self_and_repeat() {
        let mut book = ReferralBook::new();
        assert!(book.record(addr(1), addr(1)).is_err());
        assert_eq!(book.record(addr(1), addr(2)).unwrap(), 1);
        assert!(book.record(addr(3), addr(2)).is_err());
        assert_eq!(book.record(addr(1), addr(3)).unwrap(), 2);
        assert_eq!(book.count(&addr(1)), 2);
        assert_eq!(book.referrer_of(&addr(3)), Some(addr(1)));
    }
}
