//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table entity
///
/// The QR payload for a table is derived solely from
/// `(restaurant slug, table label)`; there is no stored token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    pub restaurant_id: String,
    pub label: String,
    pub is_active: bool,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub restaurant_id: String,
    pub label: String,
}

/// Update dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub label: Option<String>,
    pub is_active: Option<bool>,
}
