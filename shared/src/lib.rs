//! Shared domain types for the QR dine-in ordering core.
//!
//! Pure data crate: entities, session/cart types, the order state machine
//! vocabulary, and time helpers. No I/O, no framework dependencies.

pub mod models;
pub mod order;
pub mod session;
pub mod util;

pub use models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, MenuItem, MenuItemCreate, MenuItemUpdate,
    Restaurant, RestaurantCreate, RestaurantUpdate,
};
pub use order::{ContactInfo, Order, OrderItem, OrderStatus, OrderTransitionEvent, TransitionActor};
pub use session::{CartItem, CartOp, Session, SessionStatus};
