// crates/stakehub-staking/src/staking/registry.rs

use stakehub_common::types::{Address, Validator};
use std::collections::HashMap;

/// Registered validators, kept in registration order for index lookups.
#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<Address, Validator>,
    order: Vec<Address>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, validator: Validator) {
        let address = validator.address;
        if self.validators.insert(address, validator).is_none() {
            self.order.push(address);
        }
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.validators.contains_key(address)
    }

    pub fn get(&self, address: &Address) -> Option<&Validator> {
        self.validators.get(address)
    }

    pub(crate) fn get_mut(&mut self, address: &Address) -> Option<&mut Validator> {
        self.validators.get_mut(address)
    }

    pub fn is_active(&self, address: &Address) -> bool {
        self.validators
            .get(address)
            .map(|info| info.is_active)
            .unwrap_or(false)
    }

    pub fn by_index(&self, index: usize) -> Option<&Validator> {
        self.order
            .get(index)
            .and_then(|address| self.validators.get(address))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Validator> {
        self.order.iter().filter_map(|address| self.validators.get(address))
    }
}
