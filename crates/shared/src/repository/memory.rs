use crate::{
    abstract_trait::{
        TicketCommandRepositoryTrait, TicketQueryRepositoryTrait, TicketTypeQueryRepositoryTrait,
    },
    errors::RepositoryError,
    model::{Ticket as TicketModel, TicketType as TicketTypeModel},
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

#[derive(Default)]
struct Tables {
    ticket_types: BTreeMap<i32, TicketTypeModel>,
    tickets: BTreeMap<i32, TicketModel>,
}

/// Durable-store stand-in with the same guarded transitions as the SQL
/// repositories, for tests and local runs without Postgres.
#[derive(Default)]
pub struct InMemoryTicketStore {
    tables: Mutex<Tables>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Custom("in-memory ticket store lock poisoned".into()))
    }

    pub fn insert_ticket_type(
        &self,
        ticket_type_id: i32,
        price: i64,
        currency: &str,
        max_count: i32,
    ) -> Result<(), RepositoryError> {
        let now = Some(Utc::now().naive_utc());
        self.lock()?.ticket_types.insert(
            ticket_type_id,
            TicketTypeModel {
                ticket_type_id,
                event_id: 1,
                name: format!("Ticket type {ticket_type_id}"),
                price,
                currency: currency.to_string(),
                max_count,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    /// Issues `count` tickets of a type to `owner_email`, returning their ids.
    pub fn issue_tickets(
        &self,
        ticket_type_id: i32,
        owner_email: &str,
        count: usize,
    ) -> Result<Vec<i32>, RepositoryError> {
        let mut tables = self.lock()?;
        let now = Some(Utc::now().naive_utc());
        let mut ids = Vec::with_capacity(count);

        for _ in 0..count {
            let ticket_id = tables.tickets.keys().next_back().copied().unwrap_or(0) + 1;
            tables.tickets.insert(
                ticket_id,
                TicketModel {
                    ticket_id,
                    ticket_type_id,
                    owner_email: owner_email.to_string(),
                    used: false,
                    for_resell: false,
                    resell_price: None,
                    resell_currency: None,
                    created_at: now,
                    updated_at: now,
                },
            );
            ids.push(ticket_id);
        }

        Ok(ids)
    }

    pub fn ticket(&self, ticket_id: i32) -> Option<TicketModel> {
        self.lock().ok()?.tickets.get(&ticket_id).cloned()
    }
}

#[async_trait]
impl TicketQueryRepositoryTrait for InMemoryTicketStore {
    async fn count_sold_tickets(&self, ticket_type_id: i32) -> Result<i64, RepositoryError> {
        let tables = self.lock()?;
        let sold = tables
            .tickets
            .values()
            .filter(|ticket| ticket.ticket_type_id == ticket_type_id)
            .count();
        Ok(sold as i64)
    }

    async fn find_by_id(
        &self,
        ticket_id: i32,
        owner_email: Option<&str>,
    ) -> Result<Option<TicketModel>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .tickets
            .get(&ticket_id)
            .filter(|ticket| owner_email.is_none_or(|owner| ticket.owner_email == owner))
            .cloned())
    }
}

#[async_trait]
impl TicketCommandRepositoryTrait for InMemoryTicketStore {
    async fn mark_ticket_used(&self, ticket_id: i32) -> Result<TicketModel, RepositoryError> {
        let mut tables = self.lock()?;
        let ticket = tables
            .tickets
            .get_mut(&ticket_id)
            .ok_or(RepositoryError::NotFound)?;

        if ticket.used {
            return Err(RepositoryError::Conflict(format!(
                "ticket {ticket_id} has already been used"
            )));
        }

        ticket.used = true;
        ticket.for_resell = false;
        ticket.resell_price = None;
        ticket.resell_currency = None;
        ticket.updated_at = Some(Utc::now().naive_utc());

        Ok(ticket.clone())
    }

    async fn set_resell(
        &self,
        ticket_id: i32,
        price: i64,
        currency: &str,
    ) -> Result<TicketModel, RepositoryError> {
        let mut tables = self.lock()?;
        let ticket = tables
            .tickets
            .get_mut(&ticket_id)
            .ok_or(RepositoryError::NotFound)?;

        if ticket.used || ticket.for_resell {
            return Err(RepositoryError::Conflict(format!(
                "ticket {ticket_id} is no longer eligible for resale"
            )));
        }

        ticket.for_resell = true;
        ticket.resell_price = Some(price);
        ticket.resell_currency = Some(currency.to_string());
        ticket.updated_at = Some(Utc::now().naive_utc());

        Ok(ticket.clone())
    }
}

#[async_trait]
impl TicketTypeQueryRepositoryTrait for InMemoryTicketStore {
    async fn find_by_id(
        &self,
        ticket_type_id: i32,
    ) -> Result<Option<TicketTypeModel>, RepositoryError> {
        Ok(self.lock()?.ticket_types.get(&ticket_type_id).cloned())
    }
}
