use anyhow::{Context, Result, anyhow};
use std::{str::FromStr, time::Duration};

/// Knobs for the cart cache and its retrying client.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cart_ttl: Duration,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cart_ttl: Duration::from_secs(15 * 60),
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub reconcile_interval: Duration,
    pub resell_max_markup_percent: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(120),
            resell_max_markup_percent: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub run_migrations: bool,
    pub db_max_conn: u32,
    pub db_min_conn: u32,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: u8,
    pub redis_password: Option<String>,
    pub redis_pool_size: usize,
    pub metric_port: u16,
    pub otel_endpoint: String,
    pub cache: CacheConfig,
    pub inventory: InventoryConfig,
}

impl Config {
    pub fn init() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; `init` reads the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").context("Missing environment variable: DATABASE_URL")?;
        let run_migrations_str =
            lookup("RUN_MIGRATIONS").context("Missing environment variable: RUN_MIGRATIONS")?;

        let run_migrations = match run_migrations_str.as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(anyhow!(
                    "RUN_MIGRATIONS must be 'true' or 'false', got '{}'",
                    other
                ));
            }
        };

        let db_max_conn: u32 = env_or(&lookup, "DB_MAX_CONNECTION", 5)?;
        let db_min_conn: u32 = env_or(&lookup, "DB_MIN_CONNECTION", 1)?;

        // redis
        let redis_host = lookup("REDIS_HOST").unwrap_or_else(|| "localhost".to_string());
        let redis_port: u16 = env_or(&lookup, "REDIS_PORT", 6379)?;
        let redis_db: u8 = env_or(&lookup, "REDIS_DB", 0)?;
        let redis_password = lookup("REDIS_PASSWORD").filter(|pw| !pw.is_empty());
        let redis_pool_size: usize = env_or(&lookup, "REDIS_POOL_SIZE", 16)?;

        // cart cache
        let cart_ttl_secs: u64 = env_or(&lookup, "CART_TTL_SECS", 900)?;
        let retry_attempts: u32 = env_or(&lookup, "CACHE_RETRY_ATTEMPTS", 3)?;
        let retry_backoff_ms: u64 = env_or(&lookup, "CACHE_RETRY_BACKOFF_MS", 100)?;

        if cart_ttl_secs == 0 {
            return Err(anyhow!("CART_TTL_SECS must be greater than zero"));
        }

        if retry_attempts == 0 {
            return Err(anyhow!("CACHE_RETRY_ATTEMPTS must be at least 1"));
        }

        // inventory
        let reconcile_interval_secs: u64 = env_or(&lookup, "RECONCILE_INTERVAL_SECS", 120)?;
        let resell_max_markup_percent: u32 = env_or(&lookup, "RESELL_MAX_MARKUP_PERCENT", 60)?;

        if reconcile_interval_secs == 0 {
            return Err(anyhow!("RECONCILE_INTERVAL_SECS must be greater than zero"));
        }

        let metric_port: u16 = env_or(&lookup, "METRIC_PORT", 9090)?;
        let otel_endpoint = lookup("OTEL_ENDPOINT")
            .unwrap_or_else(|| "http://otel-collector:4317".to_string());

        Ok(Self {
            database_url,
            run_migrations,
            db_max_conn,
            db_min_conn,
            redis_host,
            redis_port,
            redis_db,
            redis_password,
            redis_pool_size,
            metric_port,
            otel_endpoint,
            cache: CacheConfig {
                cart_ttl: Duration::from_secs(cart_ttl_secs),
                retry_attempts,
                retry_backoff: Duration::from_millis(retry_backoff_ms),
            },
            inventory: InventoryConfig {
                reconcile_interval: Duration::from_secs(reconcile_interval_secs),
                resell_max_markup_percent,
            },
        })
    }
}

fn env_or<T, F>(lookup: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Unable to parse {name}: '{raw}'")),
        None => Ok(default),
    }
}
