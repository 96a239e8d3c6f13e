//! Core SoftHaus functionality
//!
//! This module contains the main SoftHaus struct: it owns the executor every
//! model store runs through and boots each registered model exactly once.

use sqlx::PgPool;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use store_object::{DatabaseExecutor, Model, ModelStore, PgExecutor};

use crate::errors::SoftHausError;
use config::{AppConfig, DatabaseConfig};

/// Main SoftHaus coordinator that manages the database connection and model stores
pub struct SoftHaus {
    pool: Option<PgPool>,
    executor: Arc<dyn DatabaseExecutor>,
    stores: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl fmt::Debug for SoftHaus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftHaus")
            .field("executor", &self.executor)
            .field("registered_models", &self.stores.len())
            .finish()
    }
}

impl SoftHaus {
    /// Create new SoftHaus with database connection
    pub async fn new(config: DatabaseConfig) -> Result<Self, SoftHausError> {
        config.validate()?;
        let connection_string = config.connection_string();

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect(&connection_string)
            .await?;
        tracing::info!(
            host = %config.host,
            database = %config.database,
            "connected to database"
        );

        Ok(Self {
            executor: Arc::new(PgExecutor::new(pool.clone())),
            pool: Some(pool),
            stores: HashMap::new(),
        })
    }

    /// Create SoftHaus from `SOFTHAUS_CONFIG` or `./softhaus.toml`
    pub async fn from_config() -> Result<Self, SoftHausError> {
        let config = AppConfig::load()?;
        Self::new(config.database).await
    }

    /// Create SoftHaus over any executor, without a connection pool
    pub fn with_executor(executor: Arc<dyn DatabaseExecutor>) -> Self {
        Self {
            pool: None,
            executor,
            stores: HashMap::new(),
        }
    }

    /// Get database pool reference
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    pub fn executor(&self) -> &Arc<dyn DatabaseExecutor> {
        &self.executor
    }

    /// Boot a model and keep its store; each model type is booted once
    pub fn register<M: Model>(&mut self) -> Result<ModelStore<M>, SoftHausError> {
        let key = TypeId::of::<M>();
        if self.stores.contains_key(&key) {
            return Err(SoftHausError::ModelAlreadyRegistered(
                M::model_name().to_string(),
            ));
        }

        let store = ModelStore::<M>::boot(Arc::clone(&self.executor))?;
        self.stores.insert(key, Box::new(store.clone()));
        crate::debug_log!("registered model {}", M::model_name());
        Ok(store)
    }

    /// Get the store of a registered model
    pub fn store<M: Model>(&self) -> Result<ModelStore<M>, SoftHausError> {
        crate::trace_log!("looking up store for {}", M::model_name());
        self.stores
            .get(&TypeId::of::<M>())
            .and_then(|store| store.downcast_ref::<ModelStore<M>>())
            .cloned()
            .ok_or_else(|| SoftHausError::ModelNotRegistered(M::model_name().to_string()))
    }

    pub fn is_registered<M: Model>(&self) -> bool {
        self.stores.contains_key(&TypeId::of::<M>())
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), SoftHausError> {
        let pool = self.pool.as_ref().ok_or(SoftHausError::NoDatabasePool)?;
        sqlx::query("SELECT 1").fetch_one(pool).await?;
        Ok(())
    }
}
