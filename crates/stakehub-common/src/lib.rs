pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

pub use config::{IndexerConfig, PostgresConfig, StakingConfig, StorageConfig, StorageType};
pub use errors::{Error, Result};
pub use types::*;
