mod cart;
mod ticket;
mod ticket_type;

pub use self::cart::ReservationCart;
pub use self::ticket::Ticket;
pub use self::ticket_type::TicketType;
