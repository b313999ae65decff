mod memory;
mod ticket;
mod ticket_type;

pub use self::memory::InMemoryTicketStore;
pub use self::ticket::{TicketCommandRepository, TicketQueryRepository, TicketRepository};
pub use self::ticket_type::TicketTypeQueryRepository;
