mod api;
mod availability;
mod cart;
mod ticket;

pub use self::api::ApiResponse;
pub use self::availability::AvailabilityResponse;
pub use self::cart::{CartResponse, ReservationItemResponse};
pub use self::ticket::TicketResponse;
