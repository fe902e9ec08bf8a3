//! Order transition events
//!
//! Emitted after every committed status change, including creation
//! (`previous_status: None`). Delivery is best-effort at-least-once;
//! consumers must tolerate duplicates and key on
//! `(order_id, previous_status, new_status)`.

use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// Who drove a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionActor {
    /// A staff member, identified by their account id.
    Staff { staff_id: String },
    /// The pending-timeout timer.
    Timer,
    /// The guest, via session conversion (order creation only).
    Guest,
}

/// A committed order status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTransitionEvent {
    pub order_id: String,
    pub restaurant_id: String,
    /// `None` for the creation event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<OrderStatus>,
    pub new_status: OrderStatus,
    pub actor: TransitionActor,
    pub occurred_at: i64,
}
