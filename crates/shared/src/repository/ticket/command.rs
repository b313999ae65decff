use crate::{
    abstract_trait::TicketCommandRepositoryTrait, config::ConnectionPool, errors::RepositoryError,
    model::Ticket as TicketModel,
};
use async_trait::async_trait;
use tracing::{error, info, warn};

pub struct TicketCommandRepository {
    db: ConnectionPool,
}

impl TicketCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TicketCommandRepositoryTrait for TicketCommandRepository {
    async fn mark_ticket_used(&self, ticket_id: i32) -> Result<TicketModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let updated = sqlx::query_as::<_, TicketModel>(
            r#"
            UPDATE tickets
            SET used = TRUE,
                for_resell = FALSE,
                resell_price = NULL,
                resell_currency = NULL,
                updated_at = current_timestamp
            WHERE ticket_id = $1 AND used = FALSE
            RETURNING ticket_id, ticket_type_id, owner_email, used, for_resell,
                      resell_price, resell_currency, created_at, updated_at
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to mark ticket {} as used: {:?}", ticket_id, err);
            RepositoryError::from(err)
        })?;

        if let Some(ticket) = updated {
            info!("🎟️ Ticket ID {} marked as used", ticket.ticket_id);
            return Ok(ticket);
        }

        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM tickets WHERE ticket_id = $1)
            "#,
        )
        .bind(ticket_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(RepositoryError::from)?;

        if exists {
            warn!("⚠️ Ticket ID {} was already used", ticket_id);
            Err(RepositoryError::Conflict(format!(
                "ticket {ticket_id} has already been used"
            )))
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn set_resell(
        &self,
        ticket_id: i32,
        price: i64,
        currency: &str,
    ) -> Result<TicketModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let updated = sqlx::query_as::<_, TicketModel>(
            r#"
            UPDATE tickets
            SET for_resell = TRUE,
                resell_price = $2,
                resell_currency = $3,
                updated_at = current_timestamp
            WHERE ticket_id = $1 AND for_resell = FALSE AND used = FALSE
            RETURNING ticket_id, ticket_type_id, owner_email, used, for_resell,
                      resell_price, resell_currency, created_at, updated_at
            "#,
        )
        .bind(ticket_id)
        .bind(price)
        .bind(currency)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to list ticket {} for resale: {:?}", ticket_id, err);
            RepositoryError::from(err)
        })?;

        match updated {
            Some(ticket) => {
                info!(
                    "✅ Ticket ID {} listed for resale at {} {}",
                    ticket.ticket_id, price, currency
                );
                Ok(ticket)
            }
            None => Err(RepositoryError::Conflict(format!(
                "ticket {ticket_id} is no longer eligible for resale"
            ))),
        }
    }
}
