//! Configuration types for the StakeHub indexer and ledger

mod staking;
mod store;

pub use staking::StakingConfig;
pub use store::{PostgresConfig, StorageConfig, StorageType};

use {
    crate::{errors::Result, types::Address, Error},
    serde::{Deserialize, Serialize},
    std::{fs, path::Path},
    tracing::debug,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Account that deploys the ledger and may set validator uptime.
    pub owner: Address,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub staking: StakingConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_seconds: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_interval() -> u64 {
    30
}

fn default_channel_capacity() -> usize {
    1024
}

impl IndexerConfig {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            storage: StorageConfig::default(),
            staking: StakingConfig::default(),
            log_level: default_log_level(),
            metrics_interval_seconds: default_metrics_interval(),
            channel_capacity: default_channel_capacity(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading indexer configuration from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str::<Self>(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(Error::Config("channel_capacity must be positive".into()));
        }
        if self.storage.storage_type == StorageType::Postgres && self.storage.postgres.is_none() {
            return Err(Error::Config(
                "postgres storage selected without a postgres section".into(),
            ));
        }
        self.staking.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let json = r#"{ "owner": "0x00000000000000000000000000000000000000aa" }"#;
        let config: IndexerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.storage.storage_type, StorageType::Memory);
        assert_eq!(config.staking.max_commission_bps, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_postgres_without_section() {
        let json = r#"{
            "owner": "0x00000000000000000000000000000000000000aa",
            "storage": { "storage_type": "postgres" }
        }"#;
        let config: IndexerConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
