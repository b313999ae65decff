mod inventory;
mod reservation;

pub use self::inventory::{InventoryService, InventoryServiceDeps};
pub use self::reservation::{ReservationService, ReservationServiceDeps};
