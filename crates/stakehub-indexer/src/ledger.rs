//! Read access to ledger state for the indexer.
//!
//! Events only carry identifiers; handlers re-read the current row from the
//! ledger the same way an indexer of a deployed contract would issue view
//! calls after each log.

use {
    async_trait::async_trait,
    stakehub_common::types::{Address, CommunityPool, Stake, Validator},
    stakehub_staking::StakeHub,
    std::sync::Arc,
    tokio::sync::RwLock,
};

#[async_trait]
pub trait LedgerReader: Send + Sync + 'static {
    async fn validator(&self, address: &Address) -> Option<Validator>;

    async fn stake(&self, user: &Address, validator: &Address) -> Option<Stake>;

    async fn community_pool(&self, pool_id: u64) -> Option<CommunityPool>;

    /// Cumulative amount a user has put into a pool
    async fn pool_contribution(&self, pool_id: u64, user: &Address) -> u128;
}

/// Reader over a ledger running in the same process.
#[derive(Clone)]
pub struct LocalLedger {
    hub: Arc<RwLock<StakeHub>>,
}

impl LocalLedger {
    pub fn new(hub: Arc<RwLock<StakeHub>>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl LedgerReader for LocalLedger {
    async fn validator(&self, address: &Address) -> Option<Validator> {
        self.hub.read().await.validator(address).cloned()
    }

    async fn stake(&self, user: &Address, validator: &Address) -> Option<Stake> {
        self.hub.read().await.get_user_stake(user, validator).cloned()
    }

    async fn community_pool(&self, pool_id: u64) -> Option<CommunityPool> {
        self.hub.read().await.community_pool(pool_id).cloned()
    }

    async fn pool_contribution(&self, pool_id: u64, user: &Address) -> u128 {
        self.hub.read().await.pool_contribution(pool_id, user)
    }
}
