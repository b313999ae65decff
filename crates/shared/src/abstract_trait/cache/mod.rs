use crate::errors::CacheError;
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

pub type DynKeyValueStore = Arc<dyn KeyValueStoreTrait + Send + Sync>;

/// Raw expiring key-value primitives. Implementations report connection
/// loss and timeouts as [`CacheError::Transient`].
#[async_trait]
pub trait KeyValueStoreTrait {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
    /// Returns `false` when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError>;
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}
