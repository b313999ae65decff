use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub ticket_type_id: i32,
    pub max_count: u64,
    pub sold: u64,
    pub reserved: u64,
    pub available: u64,
}
