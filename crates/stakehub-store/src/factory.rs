use {
    crate::{
        memory_store::MemoryStore,
        postgres_store::PostgresStore,
        traits::{Storage, StorageFactory},
        Result, StoreError,
    },
    anyhow::anyhow,
    async_trait::async_trait,
    stakehub_common::{StorageConfig, StorageType},
    std::sync::Arc,
};

/// Factory for creating storage instances based on configuration
pub struct StakeHubStorageFactory {
    config: StorageConfig,
}

impl StakeHubStorageFactory {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StorageFactory for StakeHubStorageFactory {
    async fn create_storage(&self) -> Result<Arc<dyn Storage>> {
        match self.config.storage_type {
            StorageType::Memory => Ok(Arc::new(MemoryStore::new())),
            StorageType::Postgres => {
                let config = match &self.config.postgres {
                    Some(config) => config.clone(),
                    None => return Err(StoreError::Other(anyhow!("PostgreSQL configuration not provided"))),
                };

                let store = PostgresStore::new(config).await?;
                Ok(Arc::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_is_the_default() {
        let storage = StakeHubStorageFactory::new(StorageConfig::default())
            .create_storage()
            .await
            .unwrap();
        assert!(storage.list_validators().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn postgres_needs_connection_settings() {
        let config = StorageConfig {
            storage_type: StorageType::Postgres,
            postgres: None,
        };
        assert!(StakeHubStorageFactory::new(config).create_storage().await.is_err());
    }
}
