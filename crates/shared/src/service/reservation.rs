use crate::{
    abstract_trait::{DynInventoryService, DynTicketQueryRepository, ReservationServiceTrait},
    cache::CartStore,
    domain::{
        requests::{AddReservationRequest, RemoveReservationRequest, ResellReservationRequest},
        responses::{ApiResponse, CartResponse},
    },
    errors::ServiceError,
    utils::{Method, Metrics, OperationTracer},
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use tracing::{info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct ReservationServiceDeps {
    pub carts: CartStore,
    pub inventory: DynInventoryService,
    pub ticket_query: DynTicketQueryRepository,
}

#[derive(Clone)]
pub struct ReservationService {
    carts: CartStore,
    inventory: DynInventoryService,
    ticket_query: DynTicketQueryRepository,
    tracer: OperationTracer,
}

impl ReservationService {
    pub fn new(deps: ReservationServiceDeps, registry: &mut Registry) -> Self {
        let metrics = Metrics::new();
        metrics.register("reservation_service", "ReservationService", registry);

        Self {
            carts: deps.carts,
            inventory: deps.inventory,
            ticket_query: deps.ticket_query,
            tracer: OperationTracer::new("reservation-service", metrics),
        }
    }

    async fn ensure_available(&self, ticket_type_id: i32, requested: u32) -> Result<(), ServiceError> {
        let availability = self.inventory.available_count(ticket_type_id).await?.data;

        if availability.available < u64::from(requested) {
            warn!(
                "⚠️ Ticket type {ticket_type_id} cannot cover {requested}, only {} left",
                availability.available
            );
            return Err(ServiceError::InsufficientAvailability {
                ticket_type_id,
                requested,
                available: availability.available,
            });
        }

        Ok(())
    }

    async fn ensure_resellable(&self, req: &ResellReservationRequest) -> Result<(), ServiceError> {
        let ticket = self
            .ticket_query
            .find_by_id(req.ticket_id, None)
            .await?
            .ok_or_else(|| {
                ServiceError::BadRequest(format!("Ticket {} does not exist", req.ticket_id))
            })?;

        if !ticket.for_resell {
            return Err(ServiceError::BadRequest(format!(
                "Ticket {} is not listed for resale",
                req.ticket_id
            )));
        }

        if ticket.used {
            return Err(ServiceError::BadRequest(format!(
                "Ticket {} has already been used",
                req.ticket_id
            )));
        }

        if ticket.owner_email.eq_ignore_ascii_case(&req.customer_email) {
            return Err(ServiceError::BadRequest(
                "Cannot reserve your own resale ticket".into(),
            ));
        }

        Ok(())
    }

    fn finish<T>(
        &self,
        tracing_ctx: &crate::utils::TracingContext,
        method: Method,
        result: Result<T, ServiceError>,
        success_message: &str,
    ) -> Result<T, ServiceError> {
        match &result {
            Ok(_) => self
                .tracer
                .complete_tracing_success(tracing_ctx, method, success_message),
            Err(e) => self
                .tracer
                .complete_tracing_error(tracing_ctx, method, &e.to_string()),
        }
        result
    }
}

#[async_trait]
impl ReservationServiceTrait for ReservationService {
    async fn get_cart(
        &self,
        customer_email: &str,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        let tracing_ctx = self.tracer.start_tracing(
            "get_cart",
            vec![KeyValue::new("customer.email", customer_email.to_string())],
        );

        let result = self.carts.get_cart(customer_email).await;
        let cart = self.finish(&tracing_ctx, Method::Get, result, "Cart fetched")?;

        Ok(ApiResponse::success(
            "Cart fetched successfully",
            CartResponse::from_cart(customer_email, cart),
        ))
    }

    async fn add_reservation(
        &self,
        req: &AddReservationRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        req.validate()?;

        info!(
            "🛒 {} reserving {} of ticket type {}",
            req.customer_email, req.quantity, req.ticket_type_id
        );

        let tracing_ctx = self.tracer.start_tracing(
            "add_reservation",
            vec![
                KeyValue::new("customer.email", req.customer_email.clone()),
                KeyValue::new("ticket_type.id", req.ticket_type_id.to_string()),
                KeyValue::new("reservation.quantity", i64::from(req.quantity)),
            ],
        );

        let result = match self.ensure_available(req.ticket_type_id, req.quantity).await {
            Ok(()) => {
                self.carts
                    .add_new_ticket_reservation(
                        &req.customer_email,
                        req.ticket_type_id,
                        req.quantity,
                    )
                    .await
            }
            Err(e) => Err(e),
        };
        let cart = self.finish(&tracing_ctx, Method::Post, result, "Reservation added")?;

        Ok(ApiResponse::success(
            "Reservation added successfully",
            CartResponse::from_cart(&req.customer_email, cart),
        ))
    }

    async fn remove_reservation(
        &self,
        req: &RemoveReservationRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        req.validate()?;

        let tracing_ctx = self.tracer.start_tracing(
            "remove_reservation",
            vec![
                KeyValue::new("customer.email", req.customer_email.clone()),
                KeyValue::new("ticket_type.id", req.ticket_type_id.to_string()),
                KeyValue::new("reservation.quantity", i64::from(req.quantity)),
            ],
        );

        let result = self
            .carts
            .remove_new_ticket_reservation(&req.customer_email, req.ticket_type_id, req.quantity)
            .await;
        let cart = self.finish(&tracing_ctx, Method::Delete, result, "Reservation removed")?;

        Ok(ApiResponse::success(
            "Reservation removed successfully",
            CartResponse::from_cart(&req.customer_email, cart),
        ))
    }

    async fn add_resell_reservation(
        &self,
        req: &ResellReservationRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        req.validate()?;

        info!(
            "💱 {} reserving resale ticket {}",
            req.customer_email, req.ticket_id
        );

        let tracing_ctx = self.tracer.start_tracing(
            "add_resell_reservation",
            vec![
                KeyValue::new("customer.email", req.customer_email.clone()),
                KeyValue::new("ticket.id", req.ticket_id.to_string()),
            ],
        );

        let result = match self.ensure_resellable(req).await {
            Ok(()) => {
                self.carts
                    .add_resell_reservation(&req.customer_email, req.ticket_id)
                    .await
            }
            Err(e) => Err(e),
        };
        let cart = self.finish(
            &tracing_ctx,
            Method::Post,
            result,
            "Resale reservation added",
        )?;

        Ok(ApiResponse::success(
            "Resale reservation added successfully",
            CartResponse::from_cart(&req.customer_email, cart),
        ))
    }

    async fn remove_resell_reservation(
        &self,
        req: &ResellReservationRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        req.validate()?;

        let tracing_ctx = self.tracer.start_tracing(
            "remove_resell_reservation",
            vec![
                KeyValue::new("customer.email", req.customer_email.clone()),
                KeyValue::new("ticket.id", req.ticket_id.to_string()),
            ],
        );

        let result = self
            .carts
            .remove_resell_reservation(&req.customer_email, req.ticket_id)
            .await;
        let cart = self.finish(
            &tracing_ctx,
            Method::Delete,
            result,
            "Resale reservation removed",
        )?;

        Ok(ApiResponse::success(
            "Resale reservation removed successfully",
            CartResponse::from_cart(&req.customer_email, cart),
        ))
    }

    async fn clear_cart(&self, customer_email: &str) -> Result<ApiResponse<()>, ServiceError> {
        let tracing_ctx = self.tracer.start_tracing(
            "clear_cart",
            vec![KeyValue::new("customer.email", customer_email.to_string())],
        );

        let result = self.carts.clear_cart(customer_email).await;
        self.finish(&tracing_ctx, Method::Delete, result, "Cart cleared")?;

        Ok(ApiResponse::success("Cart cleared successfully", ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::{CacheStore, InMemoryKeyValueStore, ReservationCounter, RetryPolicy},
        domain::requests::SetTicketForResellRequest,
        errors::ErrorKind,
        repository::InMemoryTicketStore,
        service::{InventoryService, InventoryServiceDeps},
    };
    use std::{sync::Arc, time::Duration};

    const BUYER: &str = "buyer@x.com";
    const SELLER: &str = "seller@x.com";

    struct Fixture {
        reservations: ReservationService,
        inventory: DynInventoryService,
        store: Arc<InMemoryTicketStore>,
        counter: ReservationCounter,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryTicketStore::new());
        let cache = CacheStore::new(
            Arc::new(InMemoryKeyValueStore::new()),
            RetryPolicy::new(3, Duration::from_millis(1)),
        );
        let counter = ReservationCounter::new(cache.clone());
        let mut registry = Registry::default();

        let inventory: DynInventoryService = Arc::new(InventoryService::new(
            InventoryServiceDeps {
                ticket_query: store.clone(),
                ticket_command: store.clone(),
                ticket_type_query: store.clone(),
                counter: counter.clone(),
                resell_max_markup_percent: 60,
            },
            &mut registry,
        ));

        let reservations = ReservationService::new(
            ReservationServiceDeps {
                carts: CartStore::new(cache, Duration::from_secs(900)),
                inventory: inventory.clone(),
                ticket_query: store.clone(),
            },
            &mut registry,
        );

        Fixture {
            reservations,
            inventory,
            store,
            counter,
        }
    }

    fn add(ticket_type_id: i32, quantity: u32) -> AddReservationRequest {
        AddReservationRequest {
            customer_email: BUYER.into(),
            ticket_type_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn add_then_remove_reservation() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 10).unwrap();

        let added = f.reservations.add_reservation(&add(1, 3)).await.unwrap();
        assert_eq!(added.data.new_ticket_reservations[0].quantity, 3);

        let removed = f
            .reservations
            .remove_reservation(&RemoveReservationRequest {
                customer_email: BUYER.into(),
                ticket_type_id: 1,
                quantity: 1,
            })
            .await
            .unwrap();
        assert_eq!(removed.data.new_ticket_reservations[0].quantity, 2);
    }

    #[tokio::test]
    async fn zero_quantity_fails_validation() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 10).unwrap();

        let err = f.reservations.add_reservation(&add(1, 0)).await.unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn sold_out_is_reported_distinctly() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 5).unwrap();
        f.store.issue_tickets(1, SELLER, 2).unwrap();
        f.counter.set(1, 2).await.unwrap();

        let err = f.reservations.add_reservation(&add(1, 2)).await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::InsufficientAvailability {
                ticket_type_id: 1,
                requested: 2,
                available: 1
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(f.reservations.get_cart(BUYER).await.unwrap().data.new_ticket_reservations.is_empty());
    }

    #[tokio::test]
    async fn resale_reservation_requires_listed_foreign_ticket() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 10).unwrap();
        let ids = f.store.issue_tickets(1, SELLER, 1).unwrap();
        let req = ResellReservationRequest {
            customer_email: BUYER.into(),
            ticket_id: ids[0],
        };

        let unlisted = f.reservations.add_resell_reservation(&req).await.unwrap_err();
        assert_eq!(unlisted.kind(), ErrorKind::BadRequest);

        f.inventory
            .set_ticket_for_resell(&SetTicketForResellRequest {
                ticket_id: ids[0],
                owner_email: SELLER.into(),
                price: 120,
                currency: "USD".into(),
            })
            .await
            .unwrap();

        let own = f
            .reservations
            .add_resell_reservation(&ResellReservationRequest {
                customer_email: SELLER.into(),
                ticket_id: ids[0],
            })
            .await
            .unwrap_err();
        assert_eq!(own.kind(), ErrorKind::BadRequest);

        let cart = f.reservations.add_resell_reservation(&req).await.unwrap();
        assert_eq!(cart.data.resell_reservations, vec![ids[0]]);

        let cart = f.reservations.remove_resell_reservation(&req).await.unwrap();
        assert!(cart.data.resell_reservations.is_empty());
    }

    #[tokio::test]
    async fn unknown_resale_ticket_is_bad_request() {
        let f = fixture();
        let err = f
            .reservations
            .add_resell_reservation(&ResellReservationRequest {
                customer_email: BUYER.into(),
                ticket_id: 77,
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn clear_cart_empties_everything() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 10).unwrap();
        f.reservations.add_reservation(&add(1, 2)).await.unwrap();

        f.reservations.clear_cart(BUYER).await.unwrap();

        let cart = f.reservations.get_cart(BUYER).await.unwrap();
        assert!(cart.data.new_ticket_reservations.is_empty());
        assert!(cart.data.resell_reservations.is_empty());
    }
}
