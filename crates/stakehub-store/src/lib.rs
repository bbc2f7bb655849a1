//! This is the stakehub-store crate - the relational mirror of ledger state

pub mod error;
pub mod factory;
pub mod memory_store;
pub mod postgres_store;
pub mod traits;
pub mod types;

pub use error::{Result, StoreError};
pub use factory::StakeHubStorageFactory;
pub use memory_store::MemoryStore;
pub use postgres_store::PostgresStore;
pub use traits::{Storage, StorageFactory};
pub use types::{BadgeRecord, NewMessage, PoolRecord, StakeRecord, StakerRecord, UserStakeRecord};
