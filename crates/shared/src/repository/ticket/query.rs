use crate::{
    abstract_trait::TicketQueryRepositoryTrait, config::ConnectionPool, errors::RepositoryError,
    model::Ticket as TicketModel,
};
use async_trait::async_trait;
use tracing::{error, info};

pub struct TicketQueryRepository {
    db: ConnectionPool,
}

impl TicketQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TicketQueryRepositoryTrait for TicketQueryRepository {
    async fn count_sold_tickets(&self, ticket_type_id: i32) -> Result<i64, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM tickets
            WHERE ticket_type_id = $1
            "#,
        )
        .bind(ticket_type_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| {
            error!(
                "❌ Failed to count sold tickets of type {}: {:?}",
                ticket_type_id, err
            );
            RepositoryError::from(err)
        })?;

        Ok(count)
    }

    async fn find_by_id(
        &self,
        ticket_id: i32,
        owner_email: Option<&str>,
    ) -> Result<Option<TicketModel>, RepositoryError> {
        info!("🆔 Fetching ticket by ID: {}", ticket_id);

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query_as::<_, TicketModel>(
            r#"
            SELECT
                ticket_id,
                ticket_type_id,
                owner_email,
                used,
                for_resell,
                resell_price,
                resell_currency,
                created_at,
                updated_at
            FROM tickets
            WHERE ticket_id = $1
              AND ($2::TEXT IS NULL OR owner_email = $2)
            "#,
        )
        .bind(ticket_id)
        .bind(owner_email)
        .fetch_optional(&mut *conn)
        .await
        .map_err(RepositoryError::from)?;

        Ok(result)
    }
}
