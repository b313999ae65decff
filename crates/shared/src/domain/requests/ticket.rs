use serde::{Deserialize, Serialize};
use validator::Validate;

/// Price bounds are business rules checked by the inventory service, so they
/// are not validated here.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetTicketForResellRequest {
    #[validate(range(min = 1, message = "Ticket ID is required"))]
    pub ticket_id: i32,

    #[validate(email(message = "Owner email is invalid"))]
    pub owner_email: String,

    pub price: i64,

    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
}
