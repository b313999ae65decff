use crate::{
    abstract_trait::{
        DynTicketCommandRepository, DynTicketQueryRepository, DynTicketTypeQueryRepository,
        InventoryServiceTrait,
    },
    cache::ReservationCounter,
    domain::{
        requests::SetTicketForResellRequest,
        responses::{ApiResponse, AvailabilityResponse, TicketResponse},
    },
    errors::{RepositoryError, ResaleRejection, ServiceError},
    model::TicketType as TicketTypeModel,
    utils::{Method, Metrics, OperationTracer},
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use tracing::{error, info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct InventoryServiceDeps {
    pub ticket_query: DynTicketQueryRepository,
    pub ticket_command: DynTicketCommandRepository,
    pub ticket_type_query: DynTicketTypeQueryRepository,
    pub counter: ReservationCounter,
    pub resell_max_markup_percent: u32,
}

#[derive(Clone)]
pub struct InventoryService {
    ticket_query: DynTicketQueryRepository,
    ticket_command: DynTicketCommandRepository,
    ticket_type_query: DynTicketTypeQueryRepository,
    counter: ReservationCounter,
    resell_max_markup_percent: u32,
    tracer: OperationTracer,
}

impl InventoryService {
    pub fn new(deps: InventoryServiceDeps, registry: &mut Registry) -> Self {
        let InventoryServiceDeps {
            ticket_query,
            ticket_command,
            ticket_type_query,
            counter,
            resell_max_markup_percent,
        } = deps;

        let metrics = Metrics::new();
        metrics.register("inventory_service", "InventoryService", registry);

        Self {
            ticket_query,
            ticket_command,
            ticket_type_query,
            counter,
            resell_max_markup_percent,
            tracer: OperationTracer::new("inventory-service", metrics),
        }
    }

    /// Highest resale price allowed for a ticket whose type costs `original_price`.
    pub fn resell_ceiling(&self, original_price: i64) -> i64 {
        let ceiling =
            i128::from(original_price) * i128::from(100 + self.resell_max_markup_percent) / 100;
        i64::try_from(ceiling).unwrap_or(i64::MAX)
    }

    fn exceeds_ceiling(&self, price: i64, original_price: i64) -> bool {
        i128::from(price) * 100
            > i128::from(original_price) * i128::from(100 + self.resell_max_markup_percent)
    }

    /// `max_count - sold - reserved` for an already loaded ticket type.
    ///
    /// A negative result means the cache and the durable store disagree
    /// beyond tolerance and is reported as an internal error, never clamped.
    pub async fn compute_availability(
        &self,
        ticket_type: &TicketTypeModel,
    ) -> Result<AvailabilityResponse, ServiceError> {
        let ticket_type_id = ticket_type.ticket_type_id;

        let sold = self
            .ticket_query
            .count_sold_tickets(ticket_type_id)
            .await
            .map_err(ServiceError::Repo)?;

        let reserved = self.counter.get(ticket_type_id).await.map_err(|e| {
            error!("❌ Failed to read reservation counter for type {ticket_type_id}: {e}");
            ServiceError::Cache(e)
        })?;

        let available =
            i128::from(ticket_type.max_count) - i128::from(sold) - i128::from(reserved);

        if available < 0 {
            error!(
                ticket_type_id,
                max_count = ticket_type.max_count,
                sold,
                reserved,
                "❌ Available ticket count is negative"
            );
            return Err(ServiceError::Internal(
                "available ticket count is negative".into(),
            ));
        }

        Ok(AvailabilityResponse {
            ticket_type_id,
            max_count: u64::try_from(ticket_type.max_count).unwrap_or(0),
            sold: u64::try_from(sold).unwrap_or(0),
            reserved,
            available: u64::try_from(available).unwrap_or(u64::MAX),
        })
    }

    async fn load_ticket_type(&self, ticket_type_id: i32) -> Result<TicketTypeModel, ServiceError> {
        self.ticket_type_query
            .find_by_id(ticket_type_id)
            .await
            .map_err(ServiceError::Repo)?
            .ok_or_else(|| ServiceError::NotFound(format!("Ticket type {ticket_type_id} not found")))
    }

    async fn check_resell(
        &self,
        req: &SetTicketForResellRequest,
    ) -> Result<(), ServiceError> {
        req.validate()?;

        let ticket = self
            .ticket_query
            .find_by_id(req.ticket_id, Some(&req.owner_email))
            .await
            .map_err(ServiceError::Repo)?
            .ok_or_else(|| ServiceError::NotFound(format!("Ticket {} not found", req.ticket_id)))?;

        if req.price <= 0 {
            return Err(ServiceError::ResaleRejected(
                ResaleRejection::NonPositivePrice,
            ));
        }

        let ticket_type = self
            .ticket_type_query
            .find_by_id(ticket.ticket_type_id)
            .await
            .map_err(ServiceError::Repo)?
            .ok_or_else(|| {
                ServiceError::Internal(format!(
                    "Ticket {} references missing ticket type {}",
                    ticket.ticket_id, ticket.ticket_type_id
                ))
            })?;

        if self.exceeds_ceiling(req.price, ticket_type.price) {
            return Err(ServiceError::ResaleRejected(
                ResaleRejection::PriceAboveCeiling {
                    price: req.price,
                    ceiling: self.resell_ceiling(ticket_type.price),
                },
            ));
        }

        if !req.currency.eq_ignore_ascii_case(&ticket_type.currency) {
            return Err(ServiceError::ResaleRejected(
                ResaleRejection::CurrencyMismatch {
                    expected: ticket_type.currency,
                    got: req.currency.clone(),
                },
            ));
        }

        if ticket.for_resell {
            return Err(ServiceError::ResaleRejected(ResaleRejection::AlreadyListed));
        }

        if ticket.used {
            return Err(ServiceError::ResaleRejected(ResaleRejection::AlreadyUsed));
        }

        Ok(())
    }
}

#[async_trait]
impl InventoryServiceTrait for InventoryService {
    async fn available_count(
        &self,
        ticket_type_id: i32,
    ) -> Result<ApiResponse<AvailabilityResponse>, ServiceError> {
        info!("🎫 Computing availability for ticket type {ticket_type_id}");

        let method = Method::Get;
        let tracing_ctx = self.tracer.start_tracing(
            "available_count",
            vec![
                KeyValue::new("component", "inventory"),
                KeyValue::new("ticket_type.id", ticket_type_id.to_string()),
            ],
        );

        let result = match self.load_ticket_type(ticket_type_id).await {
            Ok(ticket_type) => self.compute_availability(&ticket_type).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(availability) => {
                let message = format!(
                    "Ticket type {} has {} tickets available",
                    ticket_type_id, availability.available
                );
                self.tracer
                    .complete_tracing_success(&tracing_ctx, method, &message);
                Ok(ApiResponse::success(message, availability))
            }
            Err(e) => {
                self.tracer.complete_tracing_error(
                    &tracing_ctx,
                    method,
                    &format!("Failed to compute availability: {e}"),
                );
                Err(e)
            }
        }
    }

    async fn set_ticket_for_resell(
        &self,
        req: &SetTicketForResellRequest,
    ) -> Result<ApiResponse<TicketResponse>, ServiceError> {
        info!(
            "💱 Listing ticket {} for resale at {} {}",
            req.ticket_id, req.price, req.currency
        );

        let method = Method::Put;
        let tracing_ctx = self.tracer.start_tracing(
            "set_ticket_for_resell",
            vec![
                KeyValue::new("component", "inventory"),
                KeyValue::new("ticket.id", req.ticket_id.to_string()),
                KeyValue::new("ticket.resell_price", req.price.to_string()),
            ],
        );

        if let Err(e) = self.check_resell(req).await {
            warn!("⚠️ Resale of ticket {} refused: {e}", req.ticket_id);
            self.tracer
                .complete_tracing_error(&tracing_ctx, method, &e.to_string());
            return Err(e);
        }

        let currency = req.currency.to_ascii_uppercase();

        match self
            .ticket_command
            .set_resell(req.ticket_id, req.price, &currency)
            .await
        {
            Ok(ticket) => {
                self.tracer.complete_tracing_success(
                    &tracing_ctx,
                    method,
                    "Ticket listed for resale",
                );
                Ok(ApiResponse::success(
                    "Ticket listed for resale successfully",
                    TicketResponse::from(ticket),
                ))
            }
            Err(err) => {
                error!("❌ Failed to list ticket {} for resale: {err:?}", req.ticket_id);
                self.tracer.complete_tracing_error(
                    &tracing_ctx,
                    method,
                    "Failed to list ticket for resale",
                );
                Err(ServiceError::Repo(err))
            }
        }
    }

    async fn scan_ticket(&self, ticket_id: i32) -> Result<ApiResponse<TicketResponse>, ServiceError> {
        info!("🔍 Scanning ticket {ticket_id}");

        let method = Method::Post;
        let tracing_ctx = self.tracer.start_tracing(
            "scan_ticket",
            vec![
                KeyValue::new("component", "inventory"),
                KeyValue::new("ticket.id", ticket_id.to_string()),
            ],
        );

        match self.ticket_command.mark_ticket_used(ticket_id).await {
            Ok(ticket) => {
                self.tracer
                    .complete_tracing_success(&tracing_ctx, method, "Ticket scanned");
                Ok(ApiResponse::success(
                    "Ticket scanned successfully",
                    TicketResponse::from(ticket),
                ))
            }
            Err(err) => {
                let service_err = match err {
                    RepositoryError::Conflict(msg) => {
                        warn!("⚠️ Rejected re-entry with ticket {ticket_id}");
                        ServiceError::Conflict(msg)
                    }
                    RepositoryError::NotFound => {
                        ServiceError::NotFound(format!("Ticket {ticket_id} not found"))
                    }
                    other => ServiceError::Repo(other),
                };
                self.tracer.complete_tracing_error(
                    &tracing_ctx,
                    method,
                    &service_err.to_string(),
                );
                Err(service_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::{CacheStore, InMemoryKeyValueStore, RetryPolicy},
        errors::ErrorKind,
        repository::InMemoryTicketStore,
    };
    use std::{sync::Arc, time::Duration};

    const OWNER: &str = "owner@x.com";

    struct Fixture {
        service: InventoryService,
        store: Arc<InMemoryTicketStore>,
        counter: ReservationCounter,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryTicketStore::new());
        let cache = CacheStore::new(
            Arc::new(InMemoryKeyValueStore::new()),
            RetryPolicy::new(3, Duration::from_millis(1)),
        );
        let counter = ReservationCounter::new(cache);
        let mut registry = Registry::default();

        let service = InventoryService::new(
            InventoryServiceDeps {
                ticket_query: store.clone(),
                ticket_command: store.clone(),
                ticket_type_query: store.clone(),
                counter: counter.clone(),
                resell_max_markup_percent: 60,
            },
            &mut registry,
        );

        Fixture {
            service,
            store,
            counter,
        }
    }

    fn resell(ticket_id: i32, price: i64) -> SetTicketForResellRequest {
        SetTicketForResellRequest {
            ticket_id,
            owner_email: OWNER.into(),
            price,
            currency: "USD".into(),
        }
    }

    fn rejection(err: ServiceError) -> ResaleRejection {
        match err {
            ServiceError::ResaleRejected(reason) => reason,
            other => panic!("expected a resale rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn availability_subtracts_sold_and_reserved() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 10).unwrap();
        f.store.issue_tickets(1, OWNER, 2).unwrap();
        f.counter.set(1, 3).await.unwrap();

        let res = f.service.available_count(1).await.unwrap();

        assert_eq!(res.data.sold, 2);
        assert_eq!(res.data.reserved, 3);
        assert_eq!(res.data.available, 5);
    }

    #[tokio::test]
    async fn absent_counter_counts_as_zero_reserved() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 4).unwrap();

        let res = f.service.available_count(1).await.unwrap();
        assert_eq!(res.data.available, 4);
    }

    #[tokio::test]
    async fn negative_availability_is_internal_error() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 3).unwrap();
        f.store.issue_tickets(1, OWNER, 2).unwrap();
        f.counter.set(1, 2).await.unwrap();

        let err = f.service.available_count(1).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(err.to_string().contains("available ticket count is negative"));
    }

    #[tokio::test]
    async fn unknown_ticket_type_is_not_found() {
        let f = fixture();
        let err = f.service.available_count(99).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn resale_price_boundary() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 10).unwrap();
        let ids = f.store.issue_tickets(1, OWNER, 3).unwrap();

        let accepted = f.service.set_ticket_for_resell(&resell(ids[0], 160)).await.unwrap();
        assert!(accepted.data.for_resell);
        assert_eq!(accepted.data.resell_price, Some(160));

        let too_high = f
            .service
            .set_ticket_for_resell(&resell(ids[1], 161))
            .await
            .unwrap_err();
        assert_eq!(too_high.kind(), ErrorKind::BadRequest);
        assert_eq!(
            rejection(too_high),
            ResaleRejection::PriceAboveCeiling {
                price: 161,
                ceiling: 160
            }
        );

        let zero = f
            .service
            .set_ticket_for_resell(&resell(ids[2], 0))
            .await
            .unwrap_err();
        assert_eq!(rejection(zero), ResaleRejection::NonPositivePrice);
        assert!(!f.store.ticket(ids[2]).unwrap().for_resell);
    }

    #[tokio::test]
    async fn resale_rejects_double_listing_and_used_tickets() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 10).unwrap();
        let ids = f.store.issue_tickets(1, OWNER, 2).unwrap();

        f.service.set_ticket_for_resell(&resell(ids[0], 120)).await.unwrap();
        let listed = f
            .service
            .set_ticket_for_resell(&resell(ids[0], 120))
            .await
            .unwrap_err();
        assert_eq!(listed.kind(), ErrorKind::BadRequest);
        assert_eq!(rejection(listed), ResaleRejection::AlreadyListed);

        f.service.scan_ticket(ids[1]).await.unwrap();
        let used = f
            .service
            .set_ticket_for_resell(&resell(ids[1], 120))
            .await
            .unwrap_err();
        assert_eq!(used.kind(), ErrorKind::BadRequest);
        assert_eq!(rejection(used), ResaleRejection::AlreadyUsed);
    }

    #[tokio::test]
    async fn resale_by_non_owner_looks_like_missing_ticket() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 10).unwrap();
        let ids = f.store.issue_tickets(1, OWNER, 1).unwrap();

        let mut req = resell(ids[0], 100);
        req.owner_email = "thief@x.com".into();

        let err = f.service.set_ticket_for_resell(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn resale_in_another_currency_is_rejected() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 10).unwrap();
        let ids = f.store.issue_tickets(1, OWNER, 1).unwrap();

        let mut req = resell(ids[0], 100);
        req.currency = "EUR".into();

        let err = f.service.set_ticket_for_resell(&req).await.unwrap_err();
        assert!(matches!(
            rejection(err),
            ResaleRejection::CurrencyMismatch { .. }
        ));
    }

    #[tokio::test]
    async fn scanning_twice_is_a_conflict() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 10).unwrap();
        let ids = f.store.issue_tickets(1, OWNER, 1).unwrap();

        let first = f.service.scan_ticket(ids[0]).await.unwrap();
        assert!(first.data.used);

        let second = f.service.scan_ticket(ids[0]).await.unwrap_err();
        assert_eq!(second.kind(), ErrorKind::Conflict);
        assert!(f.store.ticket(ids[0]).unwrap().used);
    }

    #[tokio::test]
    async fn scanning_unknown_ticket_is_not_found() {
        let f = fixture();
        let err = f.service.scan_ticket(404).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn scanning_withdraws_resale_listing() {
        let f = fixture();
        f.store.insert_ticket_type(1, 100, "USD", 10).unwrap();
        let ids = f.store.issue_tickets(1, OWNER, 1).unwrap();
        f.service.set_ticket_for_resell(&resell(ids[0], 150)).await.unwrap();

        let scanned = f.service.scan_ticket(ids[0]).await.unwrap();

        assert!(scanned.data.used);
        assert!(!scanned.data.for_resell);
    }
}
