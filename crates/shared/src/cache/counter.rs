use crate::{cache::CacheStore, errors::CacheError};
use tracing::{debug, warn};

pub const COUNTER_KEY_PREFIX: &str = "reserved:ticket_type:";

/// Aggregate per-ticket-type reservation totals derived from live carts.
///
/// Values are snapshots written by reconciliation and may lag the carts by up
/// to one reconciliation interval. Request handlers only ever read them.
#[derive(Clone)]
pub struct ReservationCounter {
    cache: CacheStore,
}

impl ReservationCounter {
    pub fn new(cache: CacheStore) -> Self {
        Self { cache }
    }

    pub fn counter_key(ticket_type_id: i32) -> String {
        format!("{COUNTER_KEY_PREFIX}{ticket_type_id}")
    }

    /// Absent counter reads as zero.
    pub async fn get(&self, ticket_type_id: i32) -> Result<u64, CacheError> {
        let key = Self::counter_key(ticket_type_id);

        match self.cache.get_string(&key).await? {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                warn!("Counter '{key}' holds a non-numeric value '{raw}'");
                CacheError::Corrupt {
                    key: key.clone(),
                    reason: e.to_string(),
                }
            }),
            None => Ok(0),
        }
    }

    pub async fn set(&self, ticket_type_id: i32, total: u64) -> Result<(), CacheError> {
        let key = Self::counter_key(ticket_type_id);
        self.cache.set_string(&key, &total.to_string(), None).await?;
        debug!("Counter '{key}' set to {total}");
        Ok(())
    }

    pub async fn delete(&self, ticket_type_id: i32) -> Result<(), CacheError> {
        self.cache
            .delete_key(&Self::counter_key(ticket_type_id))
            .await
    }

    /// Ticket type ids that currently have a counter. Keys with an
    /// unparseable suffix are skipped.
    pub async fn list_ticket_type_ids(&self) -> Result<Vec<i32>, CacheError> {
        let keys = self.cache.list_keys_by_prefix(COUNTER_KEY_PREFIX).await?;

        let mut ids: Vec<i32> = keys
            .iter()
            .filter_map(|key| {
                let id = key.strip_prefix(COUNTER_KEY_PREFIX)?.parse::<i32>().ok();
                if id.is_none() {
                    warn!("Ignoring malformed counter key '{key}'");
                }
                id
            })
            .collect();
        ids.sort_unstable();

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemoryKeyValueStore, RetryPolicy};
    use std::{sync::Arc, time::Duration};

    fn counter() -> (ReservationCounter, CacheStore) {
        let cache = CacheStore::new(
            Arc::new(InMemoryKeyValueStore::new()),
            RetryPolicy::new(3, Duration::from_millis(1)),
        );
        (ReservationCounter::new(cache.clone()), cache)
    }

    #[tokio::test]
    async fn absent_counter_reads_zero() {
        let (counter, _) = counter();
        assert_eq!(counter.get(5).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn set_list_delete() {
        let (counter, _) = counter();
        counter.set(2, 7).await.unwrap();
        counter.set(11, 1).await.unwrap();

        assert_eq!(counter.get(2).await.unwrap(), 7);
        assert_eq!(counter.list_ticket_type_ids().await.unwrap(), vec![2, 11]);

        counter.delete(2).await.unwrap();
        assert_eq!(counter.get(2).await.unwrap(), 0);
        assert_eq!(counter.list_ticket_type_ids().await.unwrap(), vec![11]);
    }

    #[tokio::test]
    async fn malformed_keys_are_skipped() {
        let (counter, cache) = counter();
        cache
            .set_string("reserved:ticket_type:oops", "3", None)
            .await
            .unwrap();
        counter.set(4, 3).await.unwrap();

        assert_eq!(counter.list_ticket_type_ids().await.unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn non_numeric_counter_is_corrupt() {
        let (counter, cache) = counter();
        cache
            .set_string("reserved:ticket_type:3", "many", None)
            .await
            .unwrap();

        let err = counter.get(3).await.unwrap_err();
        assert!(matches!(
            err,
            CacheError::Corrupt { ref key, .. } if key == "reserved:ticket_type:3"
        ));
    }
}
