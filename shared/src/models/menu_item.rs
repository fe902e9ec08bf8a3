//! Menu Item Model

use serde::{Deserialize, Serialize};

/// Menu item entity
///
/// Prices are integer minor units (cents). The catalog is read-only from
/// the session/order core's perspective: carts and order snapshots copy
/// price and name at lookup time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub price_cents: i64,
    pub is_available: bool,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub restaurant_id: String,
    pub name: String,
    pub price_cents: i64,
}

/// Update menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub is_available: Option<bool>,
}
