//! Zone filter tags.
//!
//! A zone owns nothing: items hold a nullable reference, and removing a zone
//! only clears that reference.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ZoneId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}
