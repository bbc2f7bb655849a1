// crates/stakehub-store/src/traits.rs

use {
    crate::{
        types::{BadgeRecord, NewMessage, PoolRecord, StakerRecord, UserStakeRecord},
        Result,
    },
    async_trait::async_trait,
    stakehub_common::types::{Address, CommunityPool, EventCursor, Stake, Validator},
    std::sync::Arc,
};

/// The relational mirror of ledger state.
///
/// The write side is driven by the indexer; the query side backs the
/// read-only endpoints (validator list, stakers, user stakes and badges,
/// community pools) and message submission.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Insert or fully overwrite a validator row
    async fn upsert_validator(&self, validator: &Validator) -> Result<()>;

    /// Update the editable columns (name, description, social links,
    /// commission, uptime, active flag). Returns `false` if no row exists.
    async fn update_validator_profile(&self, validator: &Validator) -> Result<bool>;

    /// Refresh a validator's aggregate columns (total staked, user count,
    /// commission earned) from a ledger row. Fails with `NotFound` if the
    /// validator was never mirrored.
    async fn update_validator_totals(&self, validator: &Validator) -> Result<()>;

    /// Insert or overwrite the stake row for (user, validator)
    async fn upsert_stake(&self, stake: &Stake) -> Result<()>;

    /// Give a user a badge, creating the catalog entry if it is missing.
    /// Returns `false` when the user already held it.
    async fn award_badge(&self, user: &Address, name: &str, level: u8, earned_at: i64) -> Result<bool>;

    /// Insert or overwrite a community pool row
    async fn upsert_pool(&self, pool: &CommunityPool) -> Result<()>;

    /// Set a user's cumulative contribution to a pool
    async fn upsert_pool_contribution(&self, pool_id: u64, user: &Address, amount: u128, timestamp: i64) -> Result<()>;

    /// Record a referral; repeats are ignored
    async fn insert_referral(&self, referrer: &Address, referee: &Address, timestamp: i64) -> Result<()>;

    /// All validators, largest total stake first
    async fn list_validators(&self) -> Result<Vec<Validator>>;

    async fn get_validator(&self, address: &Address) -> Result<Option<Validator>>;

    async fn get_validator_stakers(&self, validator: &Address) -> Result<Vec<StakerRecord>>;

    /// Badges held by a user, most recent first
    async fn get_user_badges(&self, user: &Address) -> Result<Vec<BadgeRecord>>;

    async fn get_user_stakes(&self, user: &Address) -> Result<Vec<UserStakeRecord>>;

    /// Store a message to a validator. Fails with `InvalidInput` on empty
    /// content and `NotFound` if the recipient is not a known validator.
    async fn insert_message(&self, message: NewMessage) -> Result<u64>;

    /// Active pools, largest first
    async fn list_active_pools(&self) -> Result<Vec<PoolRecord>>;

    /// Position of the last indexed event
    async fn load_cursor(&self) -> Result<Option<EventCursor>>;

    async fn save_cursor(&self, cursor: EventCursor) -> Result<()>;

    /// Close the storage (flush pending writes, close connections, etc.)
    async fn close(&self) -> Result<()>;
}

/// Factory trait for creating storage instances
#[async_trait]
pub trait StorageFactory: Send + Sync + 'static {
    /// Create a new storage instance with the given configuration
    async fn create_storage(&self) -> Result<Arc<dyn Storage>>;
}
