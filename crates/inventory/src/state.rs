use crate::{
    di::{DependenciesInject, DependenciesInjectDeps},
    reconciler::ReservationReconciler,
};
use anyhow::{Context, Result};
use prometheus_client::registry::Registry;
use shared::config::{Config, ConnectionPool, RedisClient, RedisConfig};
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub di_container: DependenciesInject,
    pub registry: Arc<Mutex<Registry>>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("deps", &self.di_container)
            .field("registry", &self.registry)
            .finish()
    }
}

impl AppState {
    /// Connects Redis and wires every service. The reconciler is returned
    /// separately because the caller owns its task.
    pub async fn new(pool: ConnectionPool, config: &Config) -> Result<(Self, ReservationReconciler)> {
        let mut registry = Registry::default();

        let redis_config = RedisConfig::new(
            config.redis_host.clone(),
            config.redis_port,
            config.redis_db,
            config.redis_password.clone(),
        )
        .with_pool_size(config.redis_pool_size);

        let redis = RedisClient::new(&redis_config).context("Failed to connect to Redis")?;

        redis
            .ping()
            .await
            .context("Failed to ping Redis server")?;

        info!("✅ Redis connection established");

        let deps = DependenciesInjectDeps {
            pool,
            redis,
            cache: config.cache.clone(),
            inventory: config.inventory.clone(),
        };

        let di_container = DependenciesInject::new(deps, &mut registry);
        let reconciler = di_container.reconciler(&config.inventory, &mut registry);

        Ok((
            Self {
                di_container,
                registry: Arc::new(Mutex::new(registry)),
            },
            reconciler,
        ))
    }
}
