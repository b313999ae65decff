use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub ticket_id: i32,
    pub ticket_type_id: i32,
    pub owner_email: String,
    pub used: bool,
    pub for_resell: bool,
    pub resell_price: Option<i64>,
    pub resell_currency: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}
