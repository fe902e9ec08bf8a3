//! Cart sessions
//!
//! A session binds one resolved `(restaurant, table)` pair to a mutable cart
//! for a fixed TTL. Expiry is absolute: set once at creation and never
//! extended by activity. A session leaves `Active` exactly once, either by
//! expiring or by converting into an order.

use serde::{Deserialize, Serialize};

use crate::util::now_millis;

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Expired,
    Converted,
}

/// One cart line: a menu item snapshot plus quantity.
///
/// `name` and `price_cents` are copied from the catalog at the moment the
/// line is added, so later catalog edits never touch an existing cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub menu_item_id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customizations: Vec<String>,
}

impl CartItem {
    pub fn line_total_cents(&self) -> i64 {
        self.price_cents * self.quantity as i64
    }
}

/// A single cart mutation, applied through the session manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CartOp {
    Add {
        menu_item_id: String,
        quantity: u32,
        #[serde(default)]
        customizations: Vec<String>,
    },
    #[serde(rename = "update")]
    SetQuantity {
        menu_item_id: String,
        quantity: u32,
    },
    Remove {
        menu_item_id: String,
    },
}

/// Cart session entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub restaurant_id: String,
    pub table_id: String,
    pub table_label: String,
    pub cart: Vec<CartItem>,
    pub status: SessionStatus,
    pub created_at: i64,
    /// Absolute expiry, fixed at creation.
    pub expires_at: i64,
    /// Set when the session converts, linking it to the order it produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl Session {
    /// True once the wall clock has passed the fixed expiry, regardless of
    /// whether the stored status has been flipped yet.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    pub fn cart_total_cents(&self) -> i64 {
        self.cart.iter().map(CartItem::line_total_cents).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_expiry(expires_at: i64) -> Session {
        Session {
            id: "s1".into(),
            restaurant_id: "r1".into(),
            table_id: "t1".into(),
            table_label: "A5".into(),
            cart: Vec::new(),
            status: SessionStatus::Active,
            created_at: 0,
            expires_at,
            order_id: None,
        }
    }

    #[test]
    fn expiry_is_inclusive_at_the_boundary() {
        let s = session_with_expiry(1_000);
        assert!(!s.is_expired_at(999));
        assert!(s.is_expired_at(1_000));
        assert!(s.is_expired_at(1_001));
    }

    #[test]
    fn cart_total_sums_line_totals() {
        let mut s = session_with_expiry(i64::MAX);
        s.cart.push(CartItem {
            menu_item_id: "m1".into(),
            name: "Ramen".into(),
            price_cents: 1250,
            quantity: 2,
            customizations: vec![],
        });
        s.cart.push(CartItem {
            menu_item_id: "m2".into(),
            name: "Tea".into(),
            price_cents: 300,
            quantity: 1,
            customizations: vec!["no ice".into()],
        });
        assert_eq!(s.cart_total_cents(), 2800);
    }
}
