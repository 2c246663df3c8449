use serde::{Deserialize, Serialize};

/// Bus driven by an observed user. The id is an external identifier chosen
/// by the client, not generated by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolBus {
    pub id: String,
    pub license_plate: String,
    pub model: String,
    pub brand: String,
    pub license: String,
    pub observed_user_id: i64,
}
