use crate::{abstract_trait::KeyValueStoreTrait, errors::CacheError};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Process-local store with Redis-like TTL semantics. Expired entries are
/// invisible to every operation and purged on access.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Backend("in-memory store lock poisoned".into()))
    }

    fn purge_expired(entries: &mut HashMap<String, Entry>) {
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_live(now));
    }

    /// Remaining time to live, `None` for a missing key or one without expiry.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let mut entries = self.lock().ok()?;
        Self::purge_expired(&mut entries);
        entries
            .get(key)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}

#[async_trait]
impl KeyValueStoreTrait for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.lock()?;
        Self::purge_expired(&mut entries);
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut entries = self.lock()?;
        Self::purge_expired(&mut entries);
        Ok(entries.contains_key(key))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        let mut entries = self.lock()?;
        Self::purge_expired(&mut entries);
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let mut entries = self.lock()?;
        Self::purge_expired(&mut entries);
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_keys_disappear_silently() {
        let store = InMemoryKeyValueStore::new();
        store
            .set("cart:a@x.com", "{}", Some(Duration::from_millis(20)))
            .await
            .unwrap();
        store.set("cart:b@x.com", "{}", None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(store.get("cart:a@x.com").await.unwrap(), None);
        assert!(!store.exists("cart:a@x.com").await.unwrap());
        assert_eq!(
            store.scan_prefix("cart:").await.unwrap(),
            vec!["cart:b@x.com".to_string()]
        );
    }

    #[tokio::test]
    async fn expire_refreshes_only_live_keys() {
        let store = InMemoryKeyValueStore::new();
        store.set("k", "v", None).await.unwrap();

        assert!(store.expire("k", Duration::from_secs(60)).await.unwrap());
        assert!(!store.expire("missing", Duration::from_secs(60)).await.unwrap());
        assert!(store.ttl("k").unwrap() > Duration::from_secs(50));
    }
}
