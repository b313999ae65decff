mod reservation;
mod ticket;

pub use self::reservation::{
    AddReservationRequest, RemoveReservationRequest, ResellReservationRequest,
};
pub use self::ticket::SetTicketForResellRequest;
