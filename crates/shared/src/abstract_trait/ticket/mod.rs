use crate::{
    errors::RepositoryError,
    model::{Ticket as TicketModel, TicketType as TicketTypeModel},
};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynTicketQueryRepository = Arc<dyn TicketQueryRepositoryTrait + Send + Sync>;
pub type DynTicketCommandRepository = Arc<dyn TicketCommandRepositoryTrait + Send + Sync>;
pub type DynTicketTypeQueryRepository = Arc<dyn TicketTypeQueryRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait TicketQueryRepositoryTrait {
    async fn count_sold_tickets(&self, ticket_type_id: i32) -> Result<i64, RepositoryError>;
    /// With `owner_email` set, a ticket owned by someone else is reported as absent.
    async fn find_by_id(
        &self,
        ticket_id: i32,
        owner_email: Option<&str>,
    ) -> Result<Option<TicketModel>, RepositoryError>;
}

#[async_trait]
pub trait TicketCommandRepositoryTrait {
    /// Fails with `Conflict` when the ticket is already used, `NotFound` when absent.
    async fn mark_ticket_used(&self, ticket_id: i32) -> Result<TicketModel, RepositoryError>;
    /// Fails with `Conflict` when the ticket is used or already listed.
    async fn set_resell(
        &self,
        ticket_id: i32,
        price: i64,
        currency: &str,
    ) -> Result<TicketModel, RepositoryError>;
}

#[async_trait]
pub trait TicketTypeQueryRepositoryTrait {
    async fn find_by_id(
        &self,
        ticket_type_id: i32,
    ) -> Result<Option<TicketTypeModel>, RepositoryError>;
}
