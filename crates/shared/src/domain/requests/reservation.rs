use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddReservationRequest {
    #[validate(email(message = "Customer email is invalid"))]
    pub customer_email: String,

    #[validate(range(min = 1, message = "Ticket type ID is required"))]
    pub ticket_type_id: i32,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RemoveReservationRequest {
    #[validate(email(message = "Customer email is invalid"))]
    pub customer_email: String,

    #[validate(range(min = 1, message = "Ticket type ID is required"))]
    pub ticket_type_id: i32,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResellReservationRequest {
    #[validate(email(message = "Customer email is invalid"))]
    pub customer_email: String,

    #[validate(range(min = 1, message = "Ticket ID is required"))]
    pub ticket_id: i32,
}
