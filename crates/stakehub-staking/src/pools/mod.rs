// crates/stakehub-staking/src/pools/mod.rs

//! Community pools: shared contribution vehicles, optionally tied to a
//! validator.

use {
    crate::{checked_add, Result, StakingError},
    stakehub_common::types::{Address, CommunityPool},
    std::collections::HashMap,
};

/// Outcome of a successful contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    pub first_for_user: bool,
    pub user_total: u128,
}

#[derive(Debug, Default)]
pub struct PoolManager {
    pools: Vec<CommunityPool>,
    contributions: HashMap<(u64, Address), u128>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        creator: Address,
        name: String,
        validator: Option<Address>,
        now: i64,
    ) -> u64 {
        let id = self.pools.len() as u64;
        self.pools.push(CommunityPool {
            id,
            name,
            creator,
            total_amount: 0,
            member_count: 0,
            validator,
            active: true,
            created_at: now,
        });
        id
    }

    pub fn get(&self, id: u64) -> Option<&CommunityPool> {
        self.pools.get(id as usize)
    }

    fn active_pool(&self, id: u64) -> Result<&CommunityPool> {
        let pool = self.get(id).ok_or(StakingError::PoolNotFound(id))?;
        if !pool.active {
            return Err(StakingError::PoolInactive(id));
        }
        Ok(pool)
    }

    pub fn contribute(&mut self, id: u64, user: Address, amount: u128) -> Result<Contribution> {
        if amount == 0 {
            return Err(StakingError::InvalidContribution(
                "contribution must be positive".into(),
            ));
        }
        let pool = self.active_pool(id)?;
        let previous = self.contributions.get(&(id, user)).copied();
        let user_total = checked_add(previous.unwrap_or(0), amount, "pool contribution")?;
        let total_amount = checked_add(pool.total_amount, amount, "pool total")?;
        let member_count = match previous {
            Some(_) => pool.member_count,
            None => pool
                .member_count
                .checked_add(1)
                .ok_or(StakingError::Overflow("pool members"))?,
        };

        let pool = &mut self.pools[id as usize];
        pool.total_amount = total_amount;
        pool.member_count = member_count;
        self.contributions.insert((id, user), user_total);

        Ok(Contribution {
            first_for_user: previous.is_none(),
            user_total,
        })
    }

    /// Closes a pool. Only its creator or the ledger owner may do so.
    pub fn close(&mut self, id: u64, caller: Address, owner: Address) -> Result<()> {
        let pool = self.active_pool(id)?;
        if caller != pool.creator && caller != owner {
            return Err(StakingError::Unauthorized(format!(
                "{} cannot close pool {}",
                caller, id
            )));
        }
        self.pools[id as usize].active = false;
        Ok(())
    }

    pub fn contribution(&self, id: u64, user: &Address) -> u128 {
        self.contributions.get(&(id, *user)).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    #[test]
    fn contributions_accumulate_per_user() {
        let mut pools = PoolManager::new();
        let id = pools.create(addr(1), "Builders".into(), None, 100);

        let first = pools.contribute(id, addr(2), 3).unwrap();
        assert_eq!(first, Contribution { first_for_user: true, user_total: 3 });
        let again = pools.contribute(id, addr(2), 4).unwrap();
        assert_eq!(again, Contribution { first_for_user: false, user_total: 7 });
        pools.contribute(id, addr(3), 5).unwrap();

        let pool = pools.get(id).unwrap();
        assert_eq!(pool.total_amount, 12);
        assert_eq!(pool.member_count, 2);
        assert_eq!(pools.contribution(id, &addr(2)), 7);
    }

    #[test]
    fn closed_pools_reject_contributions() {
        let mut pools = PoolManager::new();
        let id = pools.create(addr(1), "Builders".into(), None, 100);
        assert!(matches!(pools.contribute(id, addr(2), 0), Err(StakingError::InvalidContribution(_))));
        assert!(matches!(pools.close(id, addr(2), addr(0xee)), Err(StakingError::Unauthorized(_))));

        pools.close(id, addr(0xee), addr(0xee)).unwrap();
        assert_eq!(pools.contribute(id, addr(2), 1), Err(StakingError::PoolInactive(id)));
        assert_eq!(pools.contribute(9, addr(2), 1), Err(StakingError::PoolNotFound(9)));
    }
}
