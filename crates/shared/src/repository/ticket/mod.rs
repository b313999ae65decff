mod command;
mod query;

pub use self::command::TicketCommandRepository;
pub use self::query::TicketQueryRepository;

use crate::{
    abstract_trait::{DynTicketCommandRepository, DynTicketQueryRepository},
    config::ConnectionPool,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct TicketRepository {
    pub query: DynTicketQueryRepository,
    pub command: DynTicketCommandRepository,
}

impl TicketRepository {
    pub fn new(pool: ConnectionPool) -> Self {
        let query = Arc::new(TicketQueryRepository::new(pool.clone())) as DynTicketQueryRepository;

        let command =
            Arc::new(TicketCommandRepository::new(pool.clone())) as DynTicketCommandRepository;

        Self { query, command }
    }
}
