//! Orders and the order state machine
//!
//! An order is an immutable snapshot of a converted cart plus a mutable
//! status. Status changes are restricted to a fixed transition table; the
//! legality check lives here on [`OrderStatus`] so every caller (HTTP
//! handlers, the auto-cancel timer, tests) shares one definition.

mod event;

pub use event::{OrderTransitionEvent, TransitionActor};

use serde::{Deserialize, Serialize};

use crate::session::CartItem;

/// Order lifecycle states.
///
/// Forward path: `Pending -> Confirmed -> Preparing -> Ready -> Completed`.
/// `Cancelled` is reachable from `Pending`, `Confirmed` and `Preparing`.
/// `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Self-transitions are not legal; a no-op update must be rejected the
    /// same way as any other illegal move.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Preparing)
                | (Preparing, Ready)
                | (Ready, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Preparing, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One order line, frozen at conversion time.
pub type OrderItem = CartItem;

/// Optional guest contact details captured at conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Order entity.
///
/// Restaurant and table identity are denormalized copies taken at
/// conversion, so an order remains readable even if the catalog row is
/// later deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub restaurant_id: String,
    pub table_id: String,
    pub table_label: String,
    pub session_id: String,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactInfo>,
    pub created_at: i64,
    pub updated_at: i64,
}
