// crates/stakehub-store/src/memory_store.rs

//! In-process mirror backed by ordered maps behind a mutex.

use {
    crate::{
        traits::Storage,
        types::{BadgeRecord, NewMessage, PoolRecord, StakeRecord, StakerRecord, UserStakeRecord},
        Result, StoreError,
    },
    anyhow::anyhow,
    async_trait::async_trait,
    stakehub_common::types::{Address, BadgeKind, CommunityPool, EventCursor, Stake, Validator},
    std::{
        collections::BTreeMap,
        sync::{Mutex, MutexGuard},
    },
};

#[derive(Debug, Clone)]
struct BadgeRow {
    id: u64,
    name: String,
    description: String,
    level: u8,
}

#[derive(Debug, Default)]
struct Tables {
    validators: BTreeMap<Address, Validator>,
    stakes: BTreeMap<(Address, Address), StakeRecord>,
    badges: Vec<BadgeRow>,
    user_badges: BTreeMap<(Address, u64), i64>,
    messages: Vec<NewMessage>,
    referrals: BTreeMap<(Address, Address), i64>,
    pools: BTreeMap<u64, CommunityPool>,
    contributions: BTreeMap<(u64, Address), (u128, i64)>,
    cursor: Option<EventCursor>,
}

impl Tables {
    fn badge_id(&mut self, name: &str, level: u8) -> u64 {
        if let Some(row) = self.badges.iter().find(|b| b.name == name && b.level == level) {
            return row.id;
        }
        let id = self.badges.len() as u64 + 1;
        self.badges.push(BadgeRow {
            id,
            name: name.to_string(),
            description: name.to_string(),
            level,
        });
        id
    }
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty mirror with the badge catalog seeded.
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for (i, kind) in BadgeKind::ALL.iter().enumerate() {
            tables.badges.push(BadgeRow {
                id: i as u64 + 1,
                name: kind.name().to_string(),
                description: kind.description().to_string(),
                level: kind.level(),
            });
        }
        Self {
            tables: Mutex::new(tables),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|e| StoreError::Other(anyhow!("Lock error: {}", e)))
    }

    pub fn message_count(&self) -> usize {
        self.lock().map(|t| t.messages.len()).unwrap_or(0)
    }

    pub fn referral_count(&self) -> usize {
        self.lock().map(|t| t.referrals.len()).unwrap_or(0)
    }

    pub fn pool_contribution(&self, pool_id: u64, user: &Address) -> Option<u128> {
        self.lock()
            .ok()
            .and_then(|t| t.contributions.get(&(pool_id, *user)).map(|(amount, _)| *amount))
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn upsert_validator(&self, validator: &Validator) -> Result<()> {
        self.lock()?.validators.insert(validator.address, validator.clone());
        Ok(())
    }

    async fn update_validator_profile(&self, validator: &Validator) -> Result<bool> {
        let mut tables = self.lock()?;
        match tables.validators.get_mut(&validator.address) {
            Some(row) => {
                row.name = validator.name.clone();
                row.description = validator.description.clone();
                row.social_links = validator.social_links.clone();
                row.commission_rate = validator.commission_rate;
                row.uptime = validator.uptime;
                row.is_active = validator.is_active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_validator_totals(&self, validator: &Validator) -> Result<()> {
        let mut tables = self.lock()?;
        let row = tables
            .validators
            .get_mut(&validator.address)
            .ok_or_else(|| StoreError::NotFound(format!("validator {}", validator.address)))?;
        row.total_staked = validator.total_staked;
        row.user_count = validator.user_count;
        row.commission_earned = validator.commission_earned;
        Ok(())
    }

    async fn upsert_stake(&self, stake: &Stake) -> Result<()> {
        let mut tables = self.lock()?;
        if !tables.validators.contains_key(&stake.validator) {
            return Err(StoreError::InvalidInput(format!(
                "stake references unknown validator {}",
                stake.validator
            )));
        }
        tables
            .stakes
            .insert((stake.user, stake.validator), StakeRecord::from(stake));
        Ok(())
    }

    async fn award_badge(&self, user: &Address, name: &str, level: u8, earned_at: i64) -> Result<bool> {
        let mut tables = self.lock()?;
        let badge_id = tables.badge_id(name, level);
        if tables.user_badges.contains_key(&(*user, badge_id)) {
            return Ok(false);
        }
        tables.user_badges.insert((*user, badge_id), earned_at);
        Ok(true)
    }

    async fn upsert_pool(&self, pool: &CommunityPool) -> Result<()> {
        self.lock()?.pools.insert(pool.id, pool.clone());
        Ok(())
    }

    async fn upsert_pool_contribution(&self, pool_id: u64, user: &Address, amount: u128, timestamp: i64) -> Result<()> {
        let mut tables = self.lock()?;
        if !tables.pools.contains_key(&pool_id) {
            return Err(StoreError::InvalidInput(format!(
                "contribution references unknown pool {}",
                pool_id
            )));
        }
        tables.contributions.insert((pool_id, *user), (amount, timestamp));
        Ok(())
    }

    async fn insert_referral(&self, referrer: &Address, referee: &Address, timestamp: i64) -> Result<()> {
        self.lock()?
            .referrals
            .entry((*referrer, *referee))
            .or_insert(timestamp);
        Ok(())
    }

    async fn list_validators(&self) -> Result<Vec<Validator>> {
        let tables = self.lock()?;
        let mut validators: Vec<Validator> = tables.validators.values().cloned().collect();
        validators.sort_by(|a, b| b.total_staked.cmp(&a.total_staked));
        Ok(validators)
    }

    async fn get_validator(&self, address: &Address) -> Result<Option<Validator>> {
        Ok(self.lock()?.validators.get(address).cloned())
    }

    async fn get_validator_stakers(&self, validator: &Address) -> Result<Vec<StakerRecord>> {
        let tables = self.lock()?;
        let mut stakers: Vec<StakerRecord> = tables
            .stakes
            .values()
            .filter(|s| s.validator_address == *validator)
            .map(|s| StakerRecord {
                user_address: s.user_address,
                amount: s.amount,
                since: s.since,
                auto_compound: s.auto_compound,
            })
            .collect();
        stakers.sort_by(|a, b| b.amount.cmp(&a.amount));
        Ok(stakers)
    }

    async fn get_user_badges(&self, user: &Address) -> Result<Vec<BadgeRecord>> {
        let tables = self.lock()?;
        let mut badges: Vec<BadgeRecord> = tables
            .user_badges
            .iter()
            .filter(|((holder, _), _)| holder == user)
            .filter_map(|((_, badge_id), earned_at)| {
                tables.badges.iter().find(|b| b.id == *badge_id).map(|b| BadgeRecord {
                    name: b.name.clone(),
                    description: b.description.clone(),
                    level: b.level,
                    earned_at: *earned_at,
                })
            })
            .collect();
        badges.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
        Ok(badges)
    }

    async fn get_user_stakes(&self, user: &Address) -> Result<Vec<UserStakeRecord>> {
        let tables = self.lock()?;
        Ok(tables
            .stakes
            .values()
            .filter(|s| s.user_address == *user)
            .filter_map(|s| {
                tables.validators.get(&s.validator_address).map(|v| UserStakeRecord {
                    stake: s.clone(),
                    validator_name: v.name.clone(),
                    uptime: v.uptime,
                    commission_rate: v.commission_rate,
                })
            })
            .collect())
    }

    async fn insert_message(&self, message: NewMessage) -> Result<u64> {
        if message.content.trim().is_empty() {
            return Err(StoreError::InvalidInput("message content is empty".into()));
        }
        let mut tables = self.lock()?;
        if !tables.validators.contains_key(&message.to_address) {
            return Err(StoreError::NotFound(format!("validator {}", message.to_address)));
        }
        tables.messages.push(message);
        Ok(tables.messages.len() as u64)
    }

    async fn list_active_pools(&self) -> Result<Vec<PoolRecord>> {
        let tables = self.lock()?;
        let mut pools: Vec<PoolRecord> = tables
            .pools
            .values()
            .filter(|p| p.active)
            .map(|p| PoolRecord {
                pool: p.clone(),
                validator_name: p
                    .validator
                    .and_then(|v| tables.validators.get(&v))
                    .map(|v| v.name.clone()),
            })
            .collect();
        pools.sort_by(|a, b| b.pool.total_amount.cmp(&a.pool.total_amount));
        Ok(pools)
    }

    async fn load_cursor(&self) -> Result<Option<EventCursor>> {
        Ok(self.lock()?.cursor)
    }

    async fn save_cursor(&self, cursor: EventCursor) -> Result<()> {
        self.lock()?.cursor = Some(cursor);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    fn validator(b: u8, total: u128) -> Validator {
        Validator {
            address: addr(b),
            name: format!("Validator {}", b),
            description: String::new(),
            social_links: "{}".into(),
            commission_rate: 500,
            total_staked: total,
            uptime: 9800,
            user_count: 0,
            is_active: true,
            registered_at: 0,
            commission_earned: 0,
        }
    }

    #[tokio::test]
    async fn validators_are_listed_by_total_stake() {
        let store = MemoryStore::new();
        store.upsert_validator(&validator(1, 10)).await.unwrap();
        store.upsert_validator(&validator(2, 30)).await.unwrap();
        store.upsert_validator(&validator(3, 20)).await.unwrap();

        let order: Vec<_> = store
            .list_validators()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.address)
            .collect();
        assert_eq!(order, vec![addr(2), addr(3), addr(1)]);
    }

    #[tokio::test]
    async fn profile_update_leaves_totals_alone() {
        let store = MemoryStore::new();
        let mut v = validator(1, 100);
        assert!(!store.update_validator_profile(&v).await.unwrap());
        store.upsert_validator(&v).await.unwrap();

        v.name = "Renamed".into();
        v.total_staked = 0;
        assert!(store.update_validator_profile(&v).await.unwrap());
        let row = store.get_validator(&addr(1)).await.unwrap().unwrap();
        assert_eq!(row.name, "Renamed");
        assert_eq!(row.total_staked, 100);
    }

    #[tokio::test]
    async fn totals_update_carries_commission_earned() {
        let store = MemoryStore::new();
        let mut v = validator(1, 100);
        assert!(matches!(
            store.update_validator_totals(&v).await,
            Err(StoreError::NotFound(_))
        ));
        store.upsert_validator(&v).await.unwrap();

        v.name = "Ignored".into();
        v.total_staked = 250;
        v.user_count = 3;
        v.commission_earned = 42;
        store.update_validator_totals(&v).await.unwrap();

        let row = store.get_validator(&addr(1)).await.unwrap().unwrap();
        assert_eq!(row.total_staked, 250);
        assert_eq!(row.user_count, 3);
        assert_eq!(row.commission_earned, 42);
        assert_eq!(row.name, "Validator 1");
    }

    #[tokio::test]
    async fn stakes_join_validator_columns() {
        let store = MemoryStore::new();
        let stake = Stake::new(addr(9), addr(1), 5, 100);
        assert!(matches!(
            store.upsert_stake(&stake).await,
            Err(StoreError::InvalidInput(_))
        ));

        store.upsert_validator(&validator(1, 5)).await.unwrap();
        store.upsert_stake(&stake).await.unwrap();
        store.upsert_stake(&Stake { amount: 8, ..stake.clone() }).await.unwrap();

        let stakers = store.get_validator_stakers(&addr(1)).await.unwrap();
        assert_eq!(stakers.len(), 1);
        assert_eq!(stakers[0].amount, 8);

        let user = store.get_user_stakes(&addr(9)).await.unwrap();
        assert_eq!(user[0].validator_name, "Validator 1");
        assert_eq!(user[0].commission_rate, 500);
    }

    #[tokio::test]
    async fn badges_are_unique_per_user() {
        let store = MemoryStore::new();
        assert!(store.award_badge(&addr(1), "First Stake", 1, 10).await.unwrap());
        assert!(!store.award_badge(&addr(1), "First Stake", 1, 20).await.unwrap());
        assert!(store.award_badge(&addr(1), "Bulk Staker", 3, 30).await.unwrap());
        assert!(store.award_badge(&addr(1), "Uncatalogued", 4, 40).await.unwrap());

        let badges = store.get_user_badges(&addr(1)).await.unwrap();
        let names: Vec<_> = badges.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Uncatalogued", "Bulk Staker", "First Stake"]);
        assert_eq!(badges[2].description, "Made a first stake");
    }

    #[tokio::test]
    async fn messages_require_known_validator() {
        let store = MemoryStore::new();
        let message = NewMessage {
            from_address: addr(9),
            to_address: addr(1),
            content: "hello".into(),
            timestamp: 0,
        };
        assert!(matches!(
            store.insert_message(message.clone()).await,
            Err(StoreError::NotFound(_))
        ));
        store.upsert_validator(&validator(1, 0)).await.unwrap();
        assert!(matches!(
            store
                .insert_message(NewMessage { content: "  ".into(), ..message.clone() })
                .await,
            Err(StoreError::InvalidInput(_))
        ));
        assert_eq!(store.insert_message(message).await.unwrap(), 1);
        assert_eq!(store.message_count(), 1);
    }

    #[tokio::test]
    async fn only_active_pools_are_listed() {
        let store = MemoryStore::new();
        store.upsert_validator(&validator(1, 0)).await.unwrap();
        let pool = |id: u64, total: u128, active: bool, validator: Option<Address>| CommunityPool {
            id,
            name: format!("Pool {}", id),
            creator: addr(9),
            total_amount: total,
            member_count: 1,
            validator,
            active,
            created_at: 0,
        };
        store.upsert_pool(&pool(0, 5, true, None)).await.unwrap();
        store.upsert_pool(&pool(1, 50, true, Some(addr(1)))).await.unwrap();
        store.upsert_pool(&pool(2, 500, false, None)).await.unwrap();

        let pools = store.list_active_pools().await.unwrap();
        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].pool.id, 1);
        assert_eq!(pools[0].validator_name.as_deref(), Some("Validator 1"));
        assert_eq!(pools[1].validator_name, None);
    }

    #[tokio::test]
    async fn cursor_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.load_cursor().await.unwrap(), None);
        let cursor = EventCursor { block_number: 7, log_index: 2 };
        store.save_cursor(cursor).await.unwrap();
        assert_eq!(store.load_cursor().await.unwrap(), Some(cursor));
    }
}
