//! Service container. `inventory` and `reservation` are the entry points for
//! a request layer; this binary itself only drives reconciliation through
//! `carts` and `counter`.

use crate::reconciler::ReservationReconciler;
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::{DynInventoryService, DynKeyValueStore, DynReservationService},
    cache::{CacheStore, CartStore, RedisKeyValueStore, ReservationCounter, RetryPolicy},
    config::{CacheConfig, ConnectionPool, InventoryConfig, RedisClient},
    repository::{TicketRepository, TicketTypeQueryRepository},
    service::{InventoryService, InventoryServiceDeps, ReservationService, ReservationServiceDeps},
};
use std::{fmt, sync::Arc};

#[derive(Clone)]
pub struct DependenciesInject {
    pub inventory: DynInventoryService,
    pub reservation: DynReservationService,
    pub carts: CartStore,
    pub counter: ReservationCounter,
}

impl fmt::Debug for DependenciesInject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependenciesInject")
            .field("inventory", &"InventoryService")
            .field("reservation", &"ReservationService")
            .field("carts", &"CartStore")
            .field("counter", &"ReservationCounter")
            .finish()
    }
}

#[derive(Clone)]
pub struct DependenciesInjectDeps {
    pub pool: ConnectionPool,
    pub redis: RedisClient,
    pub cache: CacheConfig,
    pub inventory: InventoryConfig,
}

impl DependenciesInject {
    pub fn new(deps: DependenciesInjectDeps, registry: &mut Registry) -> Self {
        let DependenciesInjectDeps {
            pool,
            redis,
            cache: cache_config,
            inventory: inventory_config,
        } = deps;

        let store = Arc::new(RedisKeyValueStore::new(redis.pool.clone())) as DynKeyValueStore;

        Self::with_store(pool, store, cache_config, inventory_config, registry)
    }

    /// Wires services over an arbitrary key-value store.
    pub fn with_store(
        pool: ConnectionPool,
        store: DynKeyValueStore,
        cache_config: CacheConfig,
        inventory_config: InventoryConfig,
        registry: &mut Registry,
    ) -> Self {
        let cache = CacheStore::new(
            store,
            RetryPolicy::new(cache_config.retry_attempts, cache_config.retry_backoff),
        );

        let carts = CartStore::new(cache.clone(), cache_config.cart_ttl);
        let counter = ReservationCounter::new(cache);

        let ticket_repo = TicketRepository::new(pool.clone());
        let ticket_type_repo = Arc::new(TicketTypeQueryRepository::new(pool));

        let inventory: DynInventoryService = Arc::new(InventoryService::new(
            InventoryServiceDeps {
                ticket_query: ticket_repo.query.clone(),
                ticket_command: ticket_repo.command.clone(),
                ticket_type_query: ticket_type_repo,
                counter: counter.clone(),
                resell_max_markup_percent: inventory_config.resell_max_markup_percent,
            },
            registry,
        ));

        let reservation: DynReservationService = Arc::new(ReservationService::new(
            ReservationServiceDeps {
                carts: carts.clone(),
                inventory: inventory.clone(),
                ticket_query: ticket_repo.query,
            },
            registry,
        ));

        Self {
            inventory,
            reservation,
            carts,
            counter,
        }
    }

    pub fn reconciler(
        &self,
        inventory_config: &InventoryConfig,
        registry: &mut Registry,
    ) -> ReservationReconciler {
        ReservationReconciler::new(
            self.carts.clone(),
            self.counter.clone(),
            inventory_config.reconcile_interval,
            registry,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{
        abstract_trait::ReservationServiceTrait, cache::InMemoryKeyValueStore,
        domain::responses::ReservationItemResponse,
    };
    use sqlx::postgres::PgPoolOptions;
    use tokio::sync::watch;

    #[tokio::test]
    async fn request_services_share_the_reconciled_store() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/inventory")
            .unwrap();
        let store = Arc::new(InMemoryKeyValueStore::new());
        let mut registry = Registry::default();
        let config = InventoryConfig::default();

        let deps = DependenciesInject::with_store(
            pool,
            store,
            CacheConfig::default(),
            config.clone(),
            &mut registry,
        );
        deps.carts
            .add_new_ticket_reservation("a@x.com", 4, 2)
            .await
            .unwrap();

        let cart = deps.reservation.get_cart("a@x.com").await.unwrap();
        assert_eq!(
            cart.data.new_ticket_reservations,
            vec![ReservationItemResponse {
                ticket_type_id: 4,
                quantity: 2
            }]
        );

        let (_tx, rx) = watch::channel(false);
        deps.reconciler(&config, &mut registry)
            .run_once(&rx)
            .await
            .unwrap();
        assert_eq!(deps.counter.get(4).await.unwrap(), 2);
    }
}
