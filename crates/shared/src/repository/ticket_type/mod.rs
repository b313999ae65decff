use crate::{
    abstract_trait::TicketTypeQueryRepositoryTrait, config::ConnectionPool,
    errors::RepositoryError, model::TicketType as TicketTypeModel,
};
use async_trait::async_trait;
use tracing::info;

pub struct TicketTypeQueryRepository {
    db: ConnectionPool,
}

impl TicketTypeQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TicketTypeQueryRepositoryTrait for TicketTypeQueryRepository {
    async fn find_by_id(
        &self,
        ticket_type_id: i32,
    ) -> Result<Option<TicketTypeModel>, RepositoryError> {
        info!("🆔 Fetching ticket type by ID: {}", ticket_type_id);

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query_as::<_, TicketTypeModel>(
            r#"
            SELECT
                ticket_type_id,
                event_id,
                name,
                price,
                currency,
                max_count,
                created_at,
                updated_at
            FROM ticket_types
            WHERE ticket_type_id = $1
            "#,
        )
        .bind(ticket_type_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(RepositoryError::from)?;

        Ok(result)
    }
}
