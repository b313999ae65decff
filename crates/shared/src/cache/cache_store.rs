use crate::{abstract_trait::DynKeyValueStore, errors::CacheError};
use serde::{Serialize, de::DeserializeOwned};
use std::{future::Future, time::Duration};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// Cache client that retries transient store failures with a fixed back-off.
///
/// Store failures reach the caller as [`CacheError::Unavailable`]: either a
/// non-transient error on the first attempt, or the last transient error once
/// the attempts are exhausted. A value that was read but cannot be decoded is
/// [`CacheError::Corrupt`] and is never retried.
#[derive(Clone)]
pub struct CacheStore {
    store: DynKeyValueStore,
    policy: RetryPolicy,
}

impl CacheStore {
    pub fn new(store: DynKeyValueStore, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, key: &str, mut f: F) -> Result<T, CacheError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CacheError>>,
    {
        let mut attempt = 1;

        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    warn!(
                        operation,
                        key,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        "Transient cache failure, retrying: {err}"
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(operation, key, attempt, "Cache operation failed: {err}");
                    return Err(CacheError::Unavailable {
                        attempts: attempt,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    pub async fn get_string(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.with_retry("get", key, || self.store.get(key)).await
    }

    pub async fn set_string(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.with_retry("set", key, || self.store.set(key, value, ttl))
            .await
    }

    pub async fn delete_key(&self, key: &str) -> Result<(), CacheError> {
        self.with_retry("delete", key, || self.store.delete(key)).await
    }

    pub async fn key_exists(&self, key: &str) -> Result<bool, CacheError> {
        self.with_retry("exists", key, || self.store.exists(key)).await
    }

    pub async fn expire_key(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        self.with_retry("expire", key, || self.store.expire(key, ttl))
            .await
    }

    pub async fn list_keys_by_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        self.with_retry("scan", prefix, || self.store.scan_prefix(prefix))
            .await
    }

    /// A missing key is `Ok(None)`, never a default value.
    pub async fn get_object<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        let Some(data) = self.get_string(key).await? else {
            debug!("Cache miss for key: {key}");
            return Ok(None);
        };

        serde_json::from_str::<T>(&data).map(Some).map_err(|e| {
            error!(
                "Failed to deserialize cached value for key '{}': {:?}",
                key, e
            );
            CacheError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
    }

    pub async fn set_object<T>(
        &self,
        key: &str,
        data: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>
    where
        T: Serialize + Sync,
    {
        let json_data = serde_json::to_string(data).map_err(|e| {
            error!("Failed to serialize data for key '{}': {:?}", key, e);
            CacheError::Unavailable {
                attempts: 1,
                reason: format!("unserializable value for key '{key}': {e}"),
            }
        })?;

        self.set_string(key, &json_data, ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{abstract_trait::KeyValueStoreTrait, cache::InMemoryKeyValueStore};
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    /// Fails the first `failures` calls with the given error, then delegates.
    struct FlakyStore {
        inner: InMemoryKeyValueStore,
        failures: u32,
        error: CacheError,
        calls: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32, error: CacheError) -> Self {
            Self {
                inner: InMemoryKeyValueStore::new(),
                failures,
                error,
                calls: AtomicU32::new(0),
            }
        }

        fn trip(&self) -> Result<(), CacheError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(self.error.clone())
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl KeyValueStoreTrait for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.trip()?;
            self.inner.get(key).await
        }

        async fn set(
            &self,
            key: &str,
            value: &str,
            ttl: Option<Duration>,
        ) -> Result<(), CacheError> {
            self.trip()?;
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.trip()?;
            self.inner.delete(key).await
        }

        async fn exists(&self, key: &str) -> Result<bool, CacheError> {
            self.trip()?;
            self.inner.exists(key).await
        }

        async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
            self.trip()?;
            self.inner.expire(key, ttl).await
        }

        async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
            self.trip()?;
            self.inner.scan_prefix(prefix).await
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let flaky = Arc::new(FlakyStore::new(
            2,
            CacheError::Transient("connection reset".into()),
        ));
        let cache = CacheStore::new(flaky.clone(), fast_policy());

        cache.set_string("k", "v", None).await.unwrap();

        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.get_string("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_unavailable() {
        let flaky = Arc::new(FlakyStore::new(
            10,
            CacheError::Transient("timed out".into()),
        ));
        let cache = CacheStore::new(flaky.clone(), fast_policy());

        let err = cache.get_string("k").await.unwrap_err();

        assert!(matches!(err, CacheError::Unavailable { attempts: 3, .. }));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_failures_are_not_retried() {
        let flaky = Arc::new(FlakyStore::new(
            10,
            CacheError::Backend("WRONGTYPE".into()),
        ));
        let cache = CacheStore::new(flaky.clone(), fast_policy());

        let err = cache.delete_key("k").await.unwrap_err();

        assert!(matches!(err, CacheError::Unavailable { attempts: 1, .. }));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_object_is_absent_not_default() {
        let cache = CacheStore::new(Arc::new(InMemoryKeyValueStore::new()), fast_policy());

        let value: Option<Sample> = cache.get_object("nothing").await.unwrap();
        assert!(value.is_none());

        let sample = Sample {
            name: "vip".into(),
            count: 0,
        };
        cache.set_object("something", &sample, None).await.unwrap();
        let value: Option<Sample> = cache.get_object("something").await.unwrap();
        assert_eq!(value, Some(sample));
    }

    #[tokio::test]
    async fn corrupt_object_is_reported_as_corrupt() {
        let cache = CacheStore::new(Arc::new(InMemoryKeyValueStore::new()), fast_policy());
        cache.set_string("bad", "not json", None).await.unwrap();

        let err = cache.get_object::<Sample>("bad").await.unwrap_err();
        assert!(matches!(err, CacheError::Corrupt { ref key, .. } if key == "bad"));
    }
}
