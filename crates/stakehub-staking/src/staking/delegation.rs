// crates/stakehub-staking/src/staking/delegation.rs

use stakehub_common::types::{Address, Stake};
use std::collections::{BTreeSet, HashMap};

/// Stake records keyed by (user, validator), with reverse indexes.
#[derive(Debug, Default)]
pub struct DelegationBook {
    stakes: HashMap<(Address, Address), Stake>,
    by_validator: HashMap<Address, BTreeSet<Address>>,
    by_user: HashMap<Address, BTreeSet<Address>>,
}

impl DelegationBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user: &Address, validator: &Address) -> Option<&Stake> {
        self.stakes.get(&(*user, *validator))
    }

    pub(crate) fn get_mut(&mut self, user: &Address, validator: &Address) -> Option<&mut Stake> {
        self.stakes.get_mut(&(*user, *validator))
    }

    pub(crate) fn insert(&mut self, stake: Stake) {
        self.by_validator
            .entry(stake.validator)
            .or_default()
            .insert(stake.user);
        self.by_user
            .entry(stake.user)
            .or_default()
            .insert(stake.validator);
        self.stakes.insert((stake.user, stake.validator), stake);
    }

    pub fn has_any(&self, user: &Address) -> bool {
        self.by_user
            .get(user)
            .map(|validators| !validators.is_empty())
            .unwrap_or(false)
    }

    /// Stakers of a validator, ordered by user address.
    pub fn stakers_of(&self, validator: &Address) -> Vec<&Stake> {
        self.by_validator
            .get(validator)
            .map(|users| {
                users
                    .iter()
                    .filter_map(|user| self.stakes.get(&(*user, *validator)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn stakes_of(&self, user: &Address) -> Vec<&Stake> {
        self.by_user
            .get(user)
            .map(|validators| {
                validators
                    .iter()
                    .filter_map(|validator| self.stakes.get(&(*user, *validator)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sum of a user's principal across validators, saturating.
    pub fn user_total(&self, user: &Address) -> u128 {
        self.stakes_of(user)
            .iter()
            .fold(0u128, |acc, stake| acc.saturating_add(stake.amount))
    }
}
