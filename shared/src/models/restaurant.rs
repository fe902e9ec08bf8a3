//! Restaurant Model

use serde::{Deserialize, Serialize};

/// Restaurant entity
///
/// The slug is the public half of the QR payload: immutable and unique.
/// Deactivation is a soft flag; restaurants are never hard-deleted so that
/// historical orders stay attributable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: i64,
}

/// Create restaurant payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantCreate {
    pub slug: String,
    pub name: String,
}

/// Update restaurant payload (slug is immutable and therefore absent)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}
