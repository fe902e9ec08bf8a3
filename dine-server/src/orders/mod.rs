//! Order state machine
//!
//! Applies the fixed transition table from [`shared::OrderStatus`] to stored
//! orders. Every transition is one write transaction: load, validate against
//! `can_transition_to`, stamp `updated_at`, maintain the pending-deadline
//! index, commit. The matching [`OrderTransitionEvent`] is broadcast only
//! after the commit; a failed or lagging broadcast never rolls anything back.
//!
//! # Auto-cancel
//!
//! Orders enter the store as `Pending` with a deadline in the
//! `pending_orders` index. [`OrderManager::cancel_overdue`] (driven by a
//! periodic task) cancels any pending order past its deadline; the same
//! check also runs lazily at the start of a staff transition, so a guest
//! never sees a stale pending order confirmed after its timeout. The status
//! check inside the transaction makes repeated firing a no-op.

use shared::util::now_millis;
use shared::{Order, OrderStatus, OrderTransitionEvent, TransitionActor};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::store::{Store, StoreError};

/// Order manager errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type OrderResult<T> = Result<T, OrderError>;

/// Order manager over the shared store
pub struct OrderManager {
    store: Store,
    events: broadcast::Sender<OrderTransitionEvent>,
}

impl OrderManager {
    pub fn new(store: Store, events: broadcast::Sender<OrderTransitionEvent>) -> Self {
        Self { store, events }
    }

    /// Public order read (the order id is the capability)
    pub fn get_order(&self, id: &str) -> OrderResult<Order> {
        self.store
            .get_order(id)?
            .ok_or_else(|| OrderError::NotFound(format!("order '{}'", id)))
    }

    /// Staff board listing, newest first
    pub fn list_orders(
        &self,
        restaurant_id: &str,
        status: Option<OrderStatus>,
    ) -> OrderResult<Vec<Order>> {
        let mut orders = self.store.get_orders_for_restaurant(restaurant_id)?;
        if let Some(status) = status {
            orders.retain(|o| o.status == status);
        }
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        Ok(orders)
    }

    /// Apply one status transition
    ///
    /// An overdue pending order is auto-cancelled first; the requested
    /// transition then fails against `Cancelled` like any other illegal move.
    pub fn transition(
        &self,
        order_id: &str,
        target: OrderStatus,
        actor: TransitionActor,
    ) -> OrderResult<Order> {
        let now = now_millis();

        // Lazy timer: beat the staff to an overdue pending order
        self.cancel_if_overdue(order_id, now)?;

        let txn = self.store.begin_write()?;
        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| OrderError::NotFound(format!("order '{}'", order_id)))?;

        if !order.status.can_transition_to(target) {
            return Err(OrderError::InvalidTransition(format!(
                "{} -> {}",
                order.status, target
            )));
        }

        let previous = order.status;
        order.status = target;
        order.updated_at = now;
        self.store.put_order(&txn, &order)?;
        if previous == OrderStatus::Pending {
            self.store.clear_pending_deadline(&txn, order_id)?;
        }
        self.store.commit(txn)?;

        tracing::info!(
            order_id = %order.id,
            from = %previous,
            to = %target,
            "Order transitioned"
        );
        self.emit(&order, Some(previous), actor, now);

        Ok(order)
    }

    /// Timer sweep: cancel every pending order past its deadline
    ///
    /// Returns the number of orders cancelled. Safe to call repeatedly.
    pub fn cancel_overdue(&self) -> OrderResult<usize> {
        let now = now_millis();
        let overdue = self.store.get_overdue_pending_ids(now)?;

        let mut cancelled = 0;
        for order_id in overdue {
            if self.cancel_if_overdue(&order_id, now)? {
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            tracing::info!(count = cancelled, "Auto-cancelled overdue pending orders");
        }
        Ok(cancelled)
    }

    /// Cancel one order if it is still pending and past its deadline
    fn cancel_if_overdue(&self, order_id: &str, now: i64) -> OrderResult<bool> {
        let txn = self.store.begin_write()?;
        let Some(mut order) = self.store.get_order_txn(&txn, order_id)? else {
            return Ok(false);
        };
        if order.status != OrderStatus::Pending {
            return Ok(false);
        }
        let Some(deadline) = self.store.get_pending_deadline_txn(&txn, order_id)? else {
            return Ok(false);
        };
        if now < deadline {
            return Ok(false);
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        self.store.put_order(&txn, &order)?;
        self.store.clear_pending_deadline(&txn, order_id)?;
        self.store.commit(txn)?;

        tracing::info!(order_id = %order.id, "Pending order auto-cancelled");
        self.emit(&order, Some(OrderStatus::Pending), TransitionActor::Timer, now);
        Ok(true)
    }

    fn emit(
        &self,
        order: &Order,
        previous: Option<OrderStatus>,
        actor: TransitionActor,
        occurred_at: i64,
    ) {
        // No receivers is fine; delivery is best-effort
        let _ = self.events.send(OrderTransitionEvent {
            order_id: order.id.clone(),
            restaurant_id: order.restaurant_id.clone(),
            previous_status: previous,
            new_status: order.status,
            actor,
            occurred_at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::CartItem;

    fn staff() -> TransitionActor {
        TransitionActor::Staff {
            staff_id: "staff-1".into(),
        }
    }

    fn seed_order(store: &Store, id: &str, deadline: Option<i64>) -> Order {
        let now = now_millis();
        let order = Order {
            id: id.to_string(),
            restaurant_id: "r1".to_string(),
            table_id: "t1".to_string(),
            table_label: "A5".to_string(),
            session_id: "s1".to_string(),
            items: vec![CartItem {
                menu_item_id: "m1".to_string(),
                name: "Ramen".to_string(),
                price_cents: 1250,
                quantity: 2,
                customizations: vec![],
            }],
            total_cents: 2500,
            status: OrderStatus::Pending,
            contact: None,
            created_at: now,
            updated_at: now,
        };
        let txn = store.begin_write().unwrap();
        store.put_order(&txn, &order).unwrap();
        if let Some(deadline) = deadline {
            store.set_pending_deadline(&txn, id, deadline).unwrap();
        }
        txn.commit().unwrap();
        order
    }

    fn manager() -> (OrderManager, Store, broadcast::Receiver<OrderTransitionEvent>) {
        let store = Store::open_in_memory().unwrap();
        let (events, rx) = broadcast::channel(64);
        (OrderManager::new(store.clone(), events), store, rx)
    }

    #[test]
    fn test_happy_path_to_completed() {
        let (manager, store, _rx) = manager();
        seed_order(&store, "o1", Some(now_millis() + 60_000));

        for target in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Completed,
        ] {
            let order = manager.transition("o1", target, staff()).unwrap();
            assert_eq!(order.status, target);
        }

        // Terminal: nothing further is allowed
        assert!(matches!(
            manager.transition("o1", OrderStatus::Cancelled, staff()),
            Err(OrderError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_illegal_transitions_leave_state_unchanged() {
        let (manager, store, _rx) = manager();
        seed_order(&store, "o1", Some(now_millis() + 60_000));

        // Skipping a step
        assert!(matches!(
            manager.transition("o1", OrderStatus::Preparing, staff()),
            Err(OrderError::InvalidTransition(_))
        ));
        // Self-transition
        assert!(matches!(
            manager.transition("o1", OrderStatus::Pending, staff()),
            Err(OrderError::InvalidTransition(_))
        ));

        assert_eq!(
            manager.get_order("o1").unwrap().status,
            OrderStatus::Pending
        );
    }

    #[test]
    fn test_ready_cannot_be_cancelled() {
        let (manager, store, _rx) = manager();
        seed_order(&store, "o1", Some(now_millis() + 60_000));
        manager
            .transition("o1", OrderStatus::Confirmed, staff())
            .unwrap();
        manager
            .transition("o1", OrderStatus::Preparing, staff())
            .unwrap();
        manager.transition("o1", OrderStatus::Ready, staff()).unwrap();

        assert!(matches!(
            manager.transition("o1", OrderStatus::Cancelled, staff()),
            Err(OrderError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_overdue_pending_confirm_loses_to_auto_cancel() {
        let (manager, store, _rx) = manager();
        seed_order(&store, "o1", Some(now_millis() - 60_000));

        // The deadline is already past, so the lazy timer check wins
        assert!(matches!(
            manager.transition("o1", OrderStatus::Confirmed, staff()),
            Err(OrderError::InvalidTransition(_))
        ));
        assert_eq!(
            manager.get_order("o1").unwrap().status,
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn test_confirmed_order_is_not_auto_cancelled() {
        let (manager, store, _rx) = manager();
        seed_order(&store, "o1", Some(now_millis() + 60_000));
        manager
            .transition("o1", OrderStatus::Confirmed, staff())
            .unwrap();

        // Index entry is gone, the sweep finds nothing
        assert_eq!(manager.cancel_overdue().unwrap(), 0);
        assert_eq!(
            manager.get_order("o1").unwrap().status,
            OrderStatus::Confirmed
        );
    }

    #[test]
    fn test_cancel_overdue_sweep_is_idempotent() {
        let (manager, store, mut rx) = manager();
        seed_order(&store, "o1", Some(now_millis() - 1));
        seed_order(&store, "o2", Some(now_millis() + 60_000));

        assert_eq!(manager.cancel_overdue().unwrap(), 1);
        assert_eq!(manager.cancel_overdue().unwrap(), 0);

        assert_eq!(
            manager.get_order("o1").unwrap().status,
            OrderStatus::Cancelled
        );
        assert_eq!(
            manager.get_order("o2").unwrap().status,
            OrderStatus::Pending
        );

        // Exactly one cancellation event, attributed to the timer
        let event = rx.try_recv().unwrap();
        assert_eq!(event.order_id, "o1");
        assert_eq!(event.previous_status, Some(OrderStatus::Pending));
        assert_eq!(event.new_status, OrderStatus::Cancelled);
        assert_eq!(event.actor, TransitionActor::Timer);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_transition_emits_event_after_commit() {
        let (manager, store, mut rx) = manager();
        seed_order(&store, "o1", Some(now_millis() + 60_000));

        manager
            .transition("o1", OrderStatus::Confirmed, staff())
            .unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.previous_status, Some(OrderStatus::Pending));
        assert_eq!(event.new_status, OrderStatus::Confirmed);
        assert!(matches!(event.actor, TransitionActor::Staff { .. }));

        // The committed state matches the event
        assert_eq!(
            manager.get_order("o1").unwrap().status,
            OrderStatus::Confirmed
        );
    }

    #[test]
    fn test_failed_transition_emits_nothing() {
        let (manager, store, mut rx) = manager();
        seed_order(&store, "o1", Some(now_millis() + 60_000));

        let _ = manager.transition("o1", OrderStatus::Ready, staff());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_list_orders_filter_and_order() {
        let (manager, store, _rx) = manager();
        seed_order(&store, "o1", None);
        seed_order(&store, "o2", None);
        manager
            .transition("o2", OrderStatus::Confirmed, staff())
            .unwrap();

        let all = manager.list_orders("r1", None).unwrap();
        assert_eq!(all.len(), 2);

        let pending = manager
            .list_orders("r1", Some(OrderStatus::Pending))
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "o1");

        assert!(manager.list_orders("r2", None).unwrap().is_empty());
    }

    #[test]
    fn test_get_order_not_found() {
        let (manager, _store, _rx) = manager();
        assert!(matches!(
            manager.get_order("missing"),
            Err(OrderError::NotFound(_))
        ));
    }
}
