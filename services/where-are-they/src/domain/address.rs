use serde::{Deserialize, Serialize};

/// Postal address owned by an observer user.
///
/// Coordinates are kept as decimal strings so they round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub name: String,
    pub street: String,
    pub number: String,
    pub floor: Option<String>,
    pub apartment: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub latitude: String,
    pub longitude: String,
    pub observer_user_id: i64,
}
