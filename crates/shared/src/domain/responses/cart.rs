use crate::model::ReservationCart;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationItemResponse {
    pub ticket_type_id: i32,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartResponse {
    pub customer_email: String,
    pub new_ticket_reservations: Vec<ReservationItemResponse>,
    pub resell_reservations: Vec<i32>,
}

impl CartResponse {
    pub fn from_cart(customer_email: &str, cart: ReservationCart) -> Self {
        CartResponse {
            customer_email: customer_email.to_string(),
            new_ticket_reservations: cart
                .new_ticket_reservations
                .into_iter()
                .map(|(ticket_type_id, quantity)| ReservationItemResponse {
                    ticket_type_id,
                    quantity,
                })
                .collect(),
            resell_reservations: cart.resell_reservations.into_iter().collect(),
        }
    }
}
