mod cache;
mod inventory;
mod reservation;
mod ticket;

pub use self::cache::{DynKeyValueStore, KeyValueStoreTrait};
pub use self::inventory::{DynInventoryService, InventoryServiceTrait};
pub use self::reservation::{DynReservationService, ReservationServiceTrait};
pub use self::ticket::{
    DynTicketCommandRepository, DynTicketQueryRepository, DynTicketTypeQueryRepository,
    TicketCommandRepositoryTrait, TicketQueryRepositoryTrait, TicketTypeQueryRepositoryTrait,
};
