use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub school_name: String,
    pub school_start_time: NaiveTime,
    pub school_end_time: NaiveTime,
    pub observer_user_id: i64,
}
