use crate::{
    domain::{
        requests::{AddReservationRequest, RemoveReservationRequest, ResellReservationRequest},
        responses::{ApiResponse, CartResponse},
    },
    errors::ServiceError,
};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynReservationService = Arc<dyn ReservationServiceTrait + Send + Sync>;

#[async_trait]
pub trait ReservationServiceTrait {
    async fn get_cart(&self, customer_email: &str)
    -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn add_reservation(
        &self,
        req: &AddReservationRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn remove_reservation(
        &self,
        req: &RemoveReservationRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn add_resell_reservation(
        &self,
        req: &ResellReservationRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn remove_resell_reservation(
        &self,
        req: &ResellReservationRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn clear_cart(&self, customer_email: &str) -> Result<ApiResponse<()>, ServiceError>;
}
