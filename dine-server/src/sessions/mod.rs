//! Session manager
//!
//! Owns the cart-session lifecycle: creation against a resolved QR target,
//! cart mutation, lazy expiry, and the session-to-order conversion.
//!
//! # Expiry
//!
//! Expiry is absolute (creation + TTL) and enforced lazily: the first access
//! past the deadline flips the stored status to `Expired` inside a write
//! transaction and the operation fails with [`SessionError::Expired`]. A
//! periodic sweep ([`SessionManager::expire_stale`]) performs the same flip
//! for sessions nobody touches again; correctness never depends on it.
//!
//! # Conversion
//!
//! `convert_to_order` runs as one redb write transaction covering the status
//! check, the order insert, and the session flip to `Converted`. redb
//! serializes write transactions, so concurrent conversions of the same
//! session linearize: the first commits, the rest observe `Converted` and
//! fail with [`SessionError::AlreadyConverted`]. Exactly one order per
//! session, without any external locking.

use std::sync::Arc;

use shared::util::{now_millis, opaque_id};
use shared::{
    CartItem, CartOp, ContactInfo, Order, OrderStatus, OrderTransitionEvent, Session,
    SessionStatus, TransitionActor,
};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::catalog::{CatalogError, CatalogService};
use crate::store::{Store, StoreError};

/// Session manager errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// 扫码目标存在但已停用
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Session expired")]
    Expired,

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Cart is empty")]
    EmptyCart,

    /// Value is the id of the order the session already produced
    #[error("Session already converted to order {0}")]
    AlreadyConverted(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;

impl From<CatalogError> for SessionError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(msg) => SessionError::NotFound(msg),
            CatalogError::Inactive(msg) => SessionError::InvalidTarget(msg),
            CatalogError::Conflict(msg) => SessionError::InvalidTarget(msg),
            CatalogError::Store(e) => SessionError::Store(e),
        }
    }
}

/// Upper bound for a single cart line's quantity
///
/// Also bounds the `price_cents * quantity` line total well inside i64.
const MAX_LINE_QUANTITY: u32 = 99;

/// Cart session manager
pub struct SessionManager {
    store: Store,
    catalog: Arc<CatalogService>,
    /// Session TTL in milliseconds
    ttl_millis: i64,
    /// Pending order auto-cancel timeout in milliseconds
    pending_timeout_millis: i64,
    /// Order transition events (creation included)
    events: broadcast::Sender<OrderTransitionEvent>,
}

impl SessionManager {
    pub fn new(
        store: Store,
        catalog: Arc<CatalogService>,
        ttl_millis: i64,
        pending_timeout_millis: i64,
        events: broadcast::Sender<OrderTransitionEvent>,
    ) -> Self {
        Self {
            store,
            catalog,
            ttl_millis,
            pending_timeout_millis,
            events,
        }
    }

    /// Create a session for a scanned `(slug, table_label)` target
    pub fn create_session(&self, slug: &str, table_label: &str) -> SessionResult<Session> {
        let target = self.catalog.resolve(slug, table_label)?;

        let now = now_millis();
        let session = Session {
            id: opaque_id(),
            restaurant_id: target.restaurant.id,
            table_id: target.table.id,
            table_label: target.table.label,
            cart: Vec::new(),
            status: SessionStatus::Active,
            created_at: now,
            expires_at: now + self.ttl_millis,
            order_id: None,
        };

        let txn = self.store.begin_write()?;
        self.store.put_session(&txn, &session)?;
        self.store.commit(txn)?;

        tracing::info!(
            session_id = %session.id,
            restaurant_id = %session.restaurant_id,
            table = %session.table_label,
            "Session created"
        );
        Ok(session)
    }

    /// Read a session, enforcing lazy expiry
    ///
    /// `Converted` sessions remain readable so the guest can follow the
    /// `order_id` link; `Expired` ones (including freshly detected) fail.
    pub fn get_session(&self, id: &str) -> SessionResult<Session> {
        let session = self
            .store
            .get_session(id)?
            .ok_or_else(|| SessionError::NotFound(format!("session '{}'", id)))?;

        match session.status {
            SessionStatus::Expired => Err(SessionError::Expired),
            SessionStatus::Converted => Ok(session),
            SessionStatus::Active => {
                if session.is_expired() {
                    self.mark_expired(id)?;
                    Err(SessionError::Expired)
                } else {
                    Ok(session)
                }
            }
        }
    }

    /// Apply one cart mutation
    pub fn mutate_cart(&self, id: &str, op: CartOp) -> SessionResult<Session> {
        let txn = self.store.begin_write()?;
        let mut session = self
            .store
            .get_session_txn(&txn, id)?
            .ok_or_else(|| SessionError::NotFound(format!("session '{}'", id)))?;

        match session.status {
            SessionStatus::Expired => return Err(SessionError::Expired),
            SessionStatus::Converted => {
                let order_id = session.order_id.clone().unwrap_or_default();
                return Err(SessionError::AlreadyConverted(order_id));
            }
            SessionStatus::Active => {}
        }
        if session.is_expired() {
            session.status = SessionStatus::Expired;
            self.store.put_session(&txn, &session)?;
            self.store.commit(txn)?;
            return Err(SessionError::Expired);
        }

        self.apply_cart_op(&mut session, op)?;

        self.store.put_session(&txn, &session)?;
        self.store.commit(txn)?;
        Ok(session)
    }

    fn apply_cart_op(&self, session: &mut Session, op: CartOp) -> SessionResult<()> {
        match op {
            CartOp::Add {
                menu_item_id,
                quantity,
                customizations,
            } => {
                if quantity == 0 || quantity > MAX_LINE_QUANTITY {
                    return Err(SessionError::InvalidItem(format!(
                        "quantity must be between 1 and {}",
                        MAX_LINE_QUANTITY
                    )));
                }
                let item = self.lookup_item(&menu_item_id, &session.restaurant_id)?;

                // Merge into an identical line if one exists
                if let Some(line) = session.cart.iter_mut().find(|l| {
                    l.menu_item_id == menu_item_id && l.customizations == customizations
                }) {
                    let merged = line.quantity.saturating_add(quantity);
                    if merged > MAX_LINE_QUANTITY {
                        return Err(SessionError::InvalidItem(format!(
                            "line quantity cannot exceed {}",
                            MAX_LINE_QUANTITY
                        )));
                    }
                    line.quantity = merged;
                } else {
                    session.cart.push(CartItem {
                        menu_item_id,
                        name: item.name,
                        price_cents: item.price_cents,
                        quantity,
                        customizations,
                    });
                }
            }
            CartOp::SetQuantity {
                menu_item_id,
                quantity,
            } => {
                if quantity > MAX_LINE_QUANTITY {
                    return Err(SessionError::InvalidItem(format!(
                        "quantity cannot exceed {}",
                        MAX_LINE_QUANTITY
                    )));
                }
                let idx = session
                    .cart
                    .iter()
                    .position(|l| l.menu_item_id == menu_item_id)
                    .ok_or_else(|| {
                        SessionError::InvalidItem(format!("'{}' not in cart", menu_item_id))
                    })?;
                if quantity == 0 {
                    session.cart.remove(idx);
                } else {
                    session.cart[idx].quantity = quantity;
                }
            }
            CartOp::Remove { menu_item_id } => {
                let idx = session
                    .cart
                    .iter()
                    .position(|l| l.menu_item_id == menu_item_id)
                    .ok_or_else(|| {
                        SessionError::InvalidItem(format!("'{}' not in cart", menu_item_id))
                    })?;
                session.cart.remove(idx);
            }
        }
        Ok(())
    }

    fn lookup_item(
        &self,
        menu_item_id: &str,
        restaurant_id: &str,
    ) -> SessionResult<shared::MenuItem> {
        let item = self.catalog.menu_item(menu_item_id).ok_or_else(|| {
            SessionError::InvalidItem(format!("menu item '{}' not found", menu_item_id))
        })?;
        if item.restaurant_id != restaurant_id {
            return Err(SessionError::InvalidItem(format!(
                "menu item '{}' belongs to another restaurant",
                menu_item_id
            )));
        }
        if !item.is_available {
            return Err(SessionError::InvalidItem(format!(
                "menu item '{}' is unavailable",
                menu_item_id
            )));
        }
        Ok(item)
    }

    /// Convert the session's cart into a `Pending` order, exactly once
    ///
    /// Item names and prices are re-read from the catalog here; the order
    /// carries that conversion-time snapshot and later catalog edits never
    /// touch it.
    pub fn convert_to_order(
        &self,
        id: &str,
        contact: Option<ContactInfo>,
    ) -> SessionResult<Order> {
        let txn = self.store.begin_write()?;
        let mut session = self
            .store
            .get_session_txn(&txn, id)?
            .ok_or_else(|| SessionError::NotFound(format!("session '{}'", id)))?;

        match session.status {
            SessionStatus::Expired => return Err(SessionError::Expired),
            SessionStatus::Converted => {
                let order_id = session.order_id.clone().unwrap_or_default();
                return Err(SessionError::AlreadyConverted(order_id));
            }
            SessionStatus::Active => {}
        }
        if session.is_expired() {
            session.status = SessionStatus::Expired;
            self.store.put_session(&txn, &session)?;
            self.store.commit(txn)?;
            return Err(SessionError::Expired);
        }
        if session.cart.is_empty() {
            return Err(SessionError::EmptyCart);
        }

        // Conversion-time snapshot from the catalog
        let mut items = Vec::with_capacity(session.cart.len());
        for line in &session.cart {
            let item = self.lookup_item(&line.menu_item_id, &session.restaurant_id)?;
            items.push(CartItem {
                menu_item_id: line.menu_item_id.clone(),
                name: item.name,
                price_cents: item.price_cents,
                quantity: line.quantity,
                customizations: line.customizations.clone(),
            });
        }
        let total_cents = items.iter().map(CartItem::line_total_cents).sum();

        let now = now_millis();
        let order = Order {
            id: opaque_id(),
            restaurant_id: session.restaurant_id.clone(),
            table_id: session.table_id.clone(),
            table_label: session.table_label.clone(),
            session_id: session.id.clone(),
            items,
            total_cents,
            status: OrderStatus::Pending,
            contact,
            created_at: now,
            updated_at: now,
        };

        self.store.put_order(&txn, &order)?;
        self.store
            .set_pending_deadline(&txn, &order.id, now + self.pending_timeout_millis)?;

        session.status = SessionStatus::Converted;
        session.order_id = Some(order.id.clone());
        self.store.put_session(&txn, &session)?;

        self.store.commit(txn)?;

        tracing::info!(
            session_id = %session.id,
            order_id = %order.id,
            total_cents = order.total_cents,
            "Session converted to order"
        );

        // Creation event, after the commit
        let _ = self.events.send(OrderTransitionEvent {
            order_id: order.id.clone(),
            restaurant_id: order.restaurant_id.clone(),
            previous_status: None,
            new_status: OrderStatus::Pending,
            actor: TransitionActor::Guest,
            occurred_at: now,
        });

        Ok(order)
    }

    /// Hygiene sweep: flip overdue `Active` sessions to `Expired`
    ///
    /// Returns the number of sessions expired.
    pub fn expire_stale(&self) -> SessionResult<usize> {
        let now = now_millis();
        let overdue = self.store.get_overdue_session_ids(now)?;

        let mut expired = 0;
        for id in overdue {
            if self.mark_expired(&id)? {
                expired += 1;
            }
        }
        if expired > 0 {
            tracing::debug!(count = expired, "Expired stale sessions");
        }
        Ok(expired)
    }

    /// Flip a session to `Expired` if it is still an overdue `Active`
    fn mark_expired(&self, id: &str) -> SessionResult<bool> {
        let txn = self.store.begin_write()?;
        let Some(mut session) = self.store.get_session_txn(&txn, id)? else {
            return Ok(false);
        };
        if session.status != SessionStatus::Active || !session.is_expired() {
            return Ok(false);
        }
        session.status = SessionStatus::Expired;
        self.store.put_session(&txn, &session)?;
        self.store.commit(txn)?;
        Ok(true)
    }
}
