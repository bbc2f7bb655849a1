// crates/stakehub-indexer/src/indexer.rs

//! Mirrors ledger events into a [`Storage`].
//!
//! Events are applied strictly in arrival order. Each handler re-reads the
//! affected rows from the ledger and writes them to the store, so applying
//! the same event twice leaves the mirror unchanged. A handler failure is
//! logged and counted and the indexer moves on; the cursor still advances
//! past the failed event.

use {
    crate::{ledger::LedgerReader, metrics::IndexingMetrics},
    anyhow::{anyhow, Context, Result},
    stakehub_common::{
        types::{Address, ContractEvent, EventCursor, EventKind},
        utils::format_timestamp,
    },
    stakehub_store::Storage,
    std::sync::{Arc, Mutex},
    tokio::sync::mpsc,
    tracing::{debug, error, info, warn},
};

pub struct EventIndexer {
    storage: Arc<dyn Storage>,
    ledger: Arc<dyn LedgerReader>,
    metrics: Arc<Mutex<IndexingMetrics>>,
    cursor: Option<EventCursor>,
}

impl EventIndexer {
    /// Creates an indexer resuming from the cursor saved in `storage`.
    pub async fn new(storage: Arc<dyn Storage>, ledger: Arc<dyn LedgerReader>) -> Result<Self> {
        let cursor = storage
            .load_cursor()
            .await
            .context("Failed to load indexer cursor")?;
        match cursor {
            Some(cursor) => info!("Resuming indexer after event {}", cursor),
            None => info!("Starting indexer from the first event"),
        }

        Ok(Self {
            storage,
            ledger,
            metrics: Arc::new(Mutex::new(IndexingMetrics::default())),
            cursor,
        })
    }

    pub fn metrics(&self) -> Arc<Mutex<IndexingMetrics>> {
        self.metrics.clone()
    }

    pub fn cursor(&self) -> Option<EventCursor> {
        self.cursor
    }

    /// Applies one event. Returns `false` if the event was at or before the
    /// cursor and therefore skipped. Only cursor persistence errors are
    /// returned; handler errors are logged.
    pub async fn process(&mut self, event: &ContractEvent) -> Result<bool> {
        let position = event.cursor();
        if self.cursor.is_some_and(|cursor| position <= cursor) {
            debug!("Skipping already indexed event {} at {}", event.kind.name(), position);
            self.with_metrics(|m| m.record_skipped());
            return Ok(false);
        }

        match self.handle(event).await {
            Ok(()) => {
                debug!("Indexed {} at {}", event.kind.name(), position);
                self.with_metrics(|m| m.record_processed(event.kind.name(), event.block_number));
            }
            Err(e) => {
                error!("Error processing {} at {}: {:#}", event.kind.name(), position, e);
                self.with_metrics(|m| m.record_failure());
            }
        }

        self.storage
            .save_cursor(position)
            .await
            .context("Failed to save indexer cursor")?;
        self.cursor = Some(position);
        Ok(true)
    }

    /// Consumes events until the sending side closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<ContractEvent>) -> Result<Self> {
        info!("🔍 Event indexer running");
        while let Some(event) = events.recv().await {
            self.process(&event).await?;
        }
        info!("Event channel closed, indexer stopping");
        Ok(self)
    }

    async fn handle(&self, event: &ContractEvent) -> Result<()> {
        match &event.kind {
            EventKind::ValidatorRegistered { validator, name } => {
                let row = self
                    .ledger
                    .validator(validator)
                    .await
                    .ok_or_else(|| anyhow!("validator {} not found in ledger", validator))?;
                self.storage.upsert_validator(&row).await?;
                info!(
                    "Validator registered: {} ({}) at {}",
                    validator,
                    name,
                    format_timestamp(event.timestamp)
                );
            }
            EventKind::ValidatorUpdated { validator } => {
                let row = self
                    .ledger
                    .validator(validator)
                    .await
                    .ok_or_else(|| anyhow!("validator {} not found in ledger", validator))?;
                if self.storage.update_validator_profile(&row).await? {
                    self.storage.update_validator_totals(&row).await?;
                } else {
                    warn!("Validator {} updated before it was mirrored, inserting it", validator);
                    self.storage.upsert_validator(&row).await?;
                }
            }
            EventKind::StakePlaced { user, validator, .. }
            | EventKind::StakeUpdated { user, validator }
            | EventKind::RewardClaimed { user, validator, .. } => {
                self.sync_stake(user, validator).await?;
            }
            EventKind::BadgeEarned { user, badge_name, level } => {
                let awarded = self
                    .storage
                    .award_badge(user, badge_name, *level, event.timestamp)
                    .await?;
                if awarded {
                    info!("Badge earned: {} by {}", badge_name, user);
                } else {
                    debug!("{} already holds {}", user, badge_name);
                }
            }
            EventKind::CommunityPoolCreated { pool_id, .. } | EventKind::CommunityPoolClosed { pool_id } => {
                self.sync_pool(*pool_id).await?;
            }
            EventKind::PoolContribution { pool_id, user, .. } => {
                self.sync_pool(*pool_id).await?;
                let total = self.ledger.pool_contribution(*pool_id, user).await;
                self.storage
                    .upsert_pool_contribution(*pool_id, user, total, event.timestamp)
                    .await?;
            }
            EventKind::ReferralRecorded { referrer, referee } => {
                self.storage
                    .insert_referral(referrer, referee, event.timestamp)
                    .await?;
            }
        }
        Ok(())
    }

    async fn sync_stake(&self, user: &Address, validator: &Address) -> Result<()> {
        let stake = self
            .ledger
            .stake(user, validator)
            .await
            .ok_or_else(|| anyhow!("no stake of {} with {} in ledger", user, validator))?;
        let row = self
            .ledger
            .validator(validator)
            .await
            .ok_or_else(|| anyhow!("validator {} not found in ledger", validator))?;

        self.storage.upsert_stake(&stake).await?;
        self.storage.update_validator_totals(&row).await?;
        Ok(())
    }

    async fn sync_pool(&self, pool_id: u64) -> Result<()> {
        let pool = self
            .ledger
            .community_pool(pool_id)
            .await
            .ok_or_else(|| anyhow!("community pool {} not found in ledger", pool_id))?;
        self.storage.upsert_pool(&pool).await?;
        Ok(())
    }

    fn with_metrics(&self, f: impl FnOnce(&mut IndexingMetrics)) {
        if let Ok(mut m) = self.metrics.lock() {
            f(&mut m);
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::ledger::LocalLedger,
        stakehub_common::{types::BlockContext, StakingConfig},
        stakehub_staking::StakeHub,
        stakehub_store::MemoryStore,
        tokio::sync::RwLock,
    };

    const ETHER: u128 = 1_000_000_000_000_000_000;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    fn setup() -> (Arc<RwLock<StakeHub>>, Arc<MemoryStore>, Arc<LocalLedger>) {
        let hub = Arc::new(RwLock::new(StakeHub::new(StakingConfig::default(), addr(0xAA))));
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(LocalLedger::new(hub.clone()));
        (hub, store, ledger)
    }

    async fn index_all(indexer: &mut EventIndexer, hub: &Arc<RwLock<StakeHub>>) -> Vec<ContractEvent> {
        let events = hub.write().await.drain_events();
        for event in &events {
            indexer.process(event).await.unwrap();
        }
        events
    }

    #[tokio::test]
    async fn mirrors_validators_and_stakes() {
        let (hub, store, ledger) = setup();
        let mut indexer = EventIndexer::new(store.clone(), ledger).await.unwrap();

        {
            let mut hub = hub.write().await;
            hub.register_validator(BlockContext::new(1, 1_000), addr(1), "Alpha", "", "{}", 500)
                .unwrap();
            hub.register_validator(BlockContext::new(1, 1_000), addr(2), "Beta", "", "{}", 300)
                .unwrap();
            hub.stake(BlockContext::new(2, 1_010), addr(9), addr(1), 5 * ETHER).unwrap();
            hub.stake(BlockContext::new(3, 1_020), addr(9), addr(1), 2 * ETHER).unwrap();
            hub.stake(BlockContext::new(3, 1_020), addr(8), addr(2), 20 * ETHER).unwrap();
        }
        index_all(&mut indexer, &hub).await;

        let validators = store.list_validators().await.unwrap();
        assert_eq!(validators.len(), 2);
        assert_eq!(validators[0].address, addr(2));
        assert_eq!(validators[1].total_staked, 7 * ETHER);
        assert_eq!(validators[1].user_count, 1);

        let stakes = store.get_user_stakes(&addr(9)).await.unwrap();
        assert_eq!(stakes.len(), 1);
        assert_eq!(stakes[0].stake.amount, 7 * ETHER);
        assert_eq!(stakes[0].validator_name, "Alpha");

        let badges = store.get_user_badges(&addr(9)).await.unwrap();
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].name, "First Stake");

        let metrics = indexer.metrics();
        let metrics = metrics.lock().unwrap();
        assert_eq!(metrics.events_failed, 0);
        assert_eq!(metrics.last_processed_block, 3);
    }

    #[tokio::test]
    async fn claims_mirror_commission_and_rewards() {
        let (hub, store, ledger) = setup();
        let mut indexer = EventIndexer::new(store.clone(), ledger).await.unwrap();
        const DAY: i64 = 86_400;

        hub.write()
            .await
            .register_validator(BlockContext::new(1, 1_000), addr(1), "Alpha", "", "{}", 1_000)
            .unwrap();
        index_all(&mut indexer, &hub).await;

        {
            let mut hub = hub.write().await;
            hub.stake(BlockContext::new(2, 1_000), addr(9), addr(1), 1_000 * ETHER).unwrap();
            hub.claim_rewards(BlockContext::new(3, 1_000 + 30 * DAY), addr(9), addr(1))
                .unwrap();
        }
        index_all(&mut indexer, &hub).await;

        let live = hub.read().await.validator(&addr(1)).cloned().unwrap();
        assert!(live.commission_earned > 0);
        let mirrored = store.get_validator(&addr(1)).await.unwrap().unwrap();
        assert_eq!(mirrored.commission_earned, live.commission_earned);
        assert_eq!(mirrored.total_staked, live.total_staked);

        let stake = hub.read().await.get_user_stake(&addr(9), &addr(1)).cloned().unwrap();
        let stakes = store.get_user_stakes(&addr(9)).await.unwrap();
        assert_eq!(stakes[0].stake.rewards, stake.rewards);
        assert_eq!(stakes[0].stake.last_claim, stake.last_claim);
        assert_eq!(stakes[0].stake.last_claim, 1_000 + 30 * DAY);
        assert_eq!(indexer.metrics().lock().unwrap().events_failed, 0);
    }

    #[tokio::test]
    async fn replaying_events_is_a_no_op() {
        let (hub, store, ledger) = setup();
        let mut indexer = EventIndexer::new(store.clone(), ledger.clone()).await.unwrap();

        {
            let mut hub = hub.write().await;
            hub.register_validator(BlockContext::new(1, 1_000), addr(1), "Alpha", "", "{}", 500)
                .unwrap();
            hub.stake(BlockContext::new(2, 1_010), addr(9), addr(1), ETHER).unwrap();
        }
        let events = index_all(&mut indexer, &hub).await;
        let before = store.list_validators().await.unwrap();

        for event in &events {
            assert!(!indexer.process(event).await.unwrap());
        }
        assert_eq!(store.list_validators().await.unwrap(), before);

        // a fresh indexer over the same store resumes after the saved cursor
        let mut resumed = EventIndexer::new(store.clone(), ledger).await.unwrap();
        assert_eq!(resumed.cursor(), events.last().map(|e| e.cursor()));
        for event in &events {
            assert!(!resumed.process(event).await.unwrap());
        }
        assert_eq!(resumed.metrics().lock().unwrap().events_skipped, events.len());
    }

    #[tokio::test]
    async fn failed_handler_is_logged_and_skipped() {
        let (hub, store, ledger) = setup();
        let mut indexer = EventIndexer::new(store.clone(), ledger).await.unwrap();

        // the ledger never saw this validator
        let orphan = ContractEvent {
            block_number: 1,
            log_index: 0,
            timestamp: 1_000,
            kind: EventKind::ValidatorRegistered {
                validator: addr(7),
                name: "Ghost".into(),
            },
        };
        assert!(indexer.process(&orphan).await.unwrap());
        assert_eq!(indexer.metrics().lock().unwrap().events_failed, 1);

        hub.write()
            .await
            .register_validator(BlockContext::new(2, 1_010), addr(1), "Alpha", "", "{}", 500)
            .unwrap();
        index_all(&mut indexer, &hub).await;

        assert_eq!(store.list_validators().await.unwrap().len(), 1);
        assert_eq!(indexer.cursor(), Some(EventCursor { block_number: 2, log_index: 0 }));
    }

    #[tokio::test]
    async fn mirrors_pools_referrals_and_profile_updates() {
        let (hub, store, ledger) = setup();
        let mut indexer = EventIndexer::new(store.clone(), ledger).await.unwrap();

        {
            let mut hub = hub.write().await;
            let ctx = BlockContext::new(1, 1_000);
            hub.register_validator(ctx, addr(1), "Alpha", "", "{}", 500).unwrap();
            let pool = hub
                .create_community_pool(ctx, addr(9), "Builders", Some(addr(1)))
                .unwrap();
            hub.contribute_to_pool(BlockContext::new(2, 1_010), addr(9), pool, 3).unwrap();
            hub.contribute_to_pool(BlockContext::new(2, 1_010), addr(8), pool, 4).unwrap();
            hub.contribute_to_pool(BlockContext::new(3, 1_020), addr(9), pool, 5).unwrap();
            hub.record_referral(BlockContext::new(3, 1_020), addr(8), addr(9)).unwrap();

            let profile = stakehub_staking::ValidatorProfile {
                name: "Alpha Prime".into(),
                description: "renamed".into(),
                social_links: "{}".into(),
                commission_rate: 600,
                is_active: true,
            };
            hub.update_validator(BlockContext::new(4, 1_030), addr(1), profile).unwrap();
        }
        index_all(&mut indexer, &hub).await;

        let pools = store.list_active_pools().await.unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].pool.total_amount, 12);
        assert_eq!(pools[0].pool.member_count, 2);
        assert_eq!(pools[0].validator_name.as_deref(), Some("Alpha Prime"));
        assert_eq!(store.pool_contribution(0, &addr(9)), Some(8));
        assert_eq!(store.referral_count(), 1);

        let validator = store.get_validator(&addr(1)).await.unwrap().unwrap();
        assert_eq!(validator.commission_rate, 600);
        assert_eq!(validator.description, "renamed");

        let badges = store.get_user_badges(&addr(8)).await.unwrap();
        assert!(badges.iter().any(|b| b.name == "Community Member"));
    }

    #[tokio::test]
    async fn run_drains_the_channel() {
        let (hub, store, ledger) = setup();
        let indexer = EventIndexer::new(store.clone(), ledger).await.unwrap();

        hub.write()
            .await
            .register_validator(BlockContext::new(1, 1_000), addr(1), "Alpha", "", "{}", 500)
            .unwrap();
        let (tx, rx) = mpsc::channel(8);
        for event in hub.write().await.drain_events() {
            tx.send(event).await.unwrap();
        }
        drop(tx);

        let indexer = indexer.run(rx).await.unwrap();
        assert_eq!(indexer.metrics().lock().unwrap().events_processed, 1);
        assert!(store.get_validator(&addr(1)).await.unwrap().is_some());
    }
}
