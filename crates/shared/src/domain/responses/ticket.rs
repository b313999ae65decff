use crate::model::Ticket as TicketModel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResponse {
    pub id: i32,
    pub ticket_type_id: i32,
    pub owner_email: String,
    pub used: bool,
    pub for_resell: bool,
    pub resell_price: Option<i64>,
    pub resell_currency: Option<String>,
    #[serde(rename = "updated_at")]
    pub updated_at: Option<String>,
}

// model to response
impl From<TicketModel> for TicketResponse {
    fn from(value: TicketModel) -> Self {
        TicketResponse {
            id: value.ticket_id,
            ticket_type_id: value.ticket_type_id,
            owner_email: value.owner_email,
            used: value.used,
            for_resell: value.for_resell,
            resell_price: value.resell_price,
            resell_currency: value.resell_currency,
            updated_at: value.updated_at.map(|dt| dt.to_string()),
        }
    }
}
