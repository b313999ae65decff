use crate::{
    domain::{
        requests::SetTicketForResellRequest,
        responses::{ApiResponse, AvailabilityResponse, TicketResponse},
    },
    errors::ServiceError,
};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynInventoryService = Arc<dyn InventoryServiceTrait + Send + Sync>;

#[async_trait]
pub trait InventoryServiceTrait {
    async fn available_count(
        &self,
        ticket_type_id: i32,
    ) -> Result<ApiResponse<AvailabilityResponse>, ServiceError>;
    async fn set_ticket_for_resell(
        &self,
        req: &SetTicketForResellRequest,
    ) -> Result<ApiResponse<TicketResponse>, ServiceError>;
    async fn scan_ticket(&self, ticket_id: i32) -> Result<ApiResponse<TicketResponse>, ServiceError>;
}
