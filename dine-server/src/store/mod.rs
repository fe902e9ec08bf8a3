//! redb-based storage layer
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `restaurants` | `restaurant_id` | `Restaurant` | Catalog |
//! | `restaurant_slugs` | `slug` | `restaurant_id` | QR slug lookup |
//! | `tables` | `table_id` | `DiningTable` | Catalog |
//! | `table_lookup` | `(restaurant_id, label)` | `table_id` | QR table lookup |
//! | `menu_items` | `item_id` | `MenuItem` | Catalog |
//! | `sessions` | `session_id` | `Session` | Cart sessions |
//! | `active_sessions` | `session_id` | `expires_at` | Expiry sweep index |
//! | `orders` | `order_id` | `Order` | Orders |
//! | `pending_orders` | `order_id` | `deadline` | Auto-cancel index |
//!
//! # Durability
//!
//! redb commits are durable as soon as `commit()` returns. More importantly
//! for correctness here: write transactions are serialized, so every
//! multi-step mutation (cart update, conversion, status transition) observes
//! a consistent state and becomes visible atomically. The exactly-once
//! guarantee for session conversion rests on this.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::{DiningTable, MenuItem, Order, Restaurant, Session};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Catalog: key = restaurant_id, value = JSON-serialized Restaurant
const RESTAURANTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("restaurants");

/// Slug lookup: key = slug, value = restaurant_id
const RESTAURANT_SLUGS_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("restaurant_slugs");

/// Catalog: key = table_id, value = JSON-serialized DiningTable
const TABLES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tables");

/// Table lookup: key = (restaurant_id, label), value = table_id
const TABLE_LOOKUP_TABLE: TableDefinition<(&str, &str), &str> =
    TableDefinition::new("table_lookup");

/// Catalog: key = item_id, value = JSON-serialized MenuItem
const MENU_ITEMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("menu_items");

/// Sessions: key = session_id, value = JSON-serialized Session
const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Active session index: key = session_id, value = expires_at (millis)
const ACTIVE_SESSIONS_TABLE: TableDefinition<&str, i64> =
    TableDefinition::new("active_sessions");

/// Orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Pending auto-cancel index: key = order_id, value = deadline (millis)
const PENDING_ORDERS_TABLE: TableDefinition<&str, i64> = TableDefinition::new("pending_orders");

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Embedded store backed by redb
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Create all tables so later read transactions never hit a missing table
    fn init_tables(&self) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(RESTAURANTS_TABLE)?;
            let _ = write_txn.open_table(RESTAURANT_SLUGS_TABLE)?;
            let _ = write_txn.open_table(TABLES_TABLE)?;
            let _ = write_txn.open_table(TABLE_LOOKUP_TABLE)?;
            let _ = write_txn.open_table(MENU_ITEMS_TABLE)?;
            let _ = write_txn.open_table(SESSIONS_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_SESSIONS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(PENDING_ORDERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    ///
    /// Write transactions serialize; every multi-step mutation in the
    /// session and order managers runs inside exactly one of these.
    pub fn begin_write(&self) -> StoreResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Commit a write transaction
    ///
    /// Callers outside this module go through here so commit failures stay
    /// a [`StoreError`] like every other storage fault.
    pub fn commit(&self, txn: WriteTransaction) -> StoreResult<()> {
        Ok(txn.commit()?)
    }

    // ========== Restaurants ==========

    /// Store a restaurant and its slug mapping (within transaction)
    pub fn put_restaurant(
        &self,
        txn: &WriteTransaction,
        restaurant: &Restaurant,
    ) -> StoreResult<()> {
        {
            let mut table = txn.open_table(RESTAURANTS_TABLE)?;
            let value = serde_json::to_vec(restaurant)?;
            table.insert(restaurant.id.as_str(), value.as_slice())?;
        }
        let mut slugs = txn.open_table(RESTAURANT_SLUGS_TABLE)?;
        slugs.insert(restaurant.slug.as_str(), restaurant.id.as_str())?;
        Ok(())
    }

    /// Get a restaurant by id
    pub fn get_restaurant(&self, id: &str) -> StoreResult<Option<Restaurant>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESTAURANTS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Resolve a slug to a restaurant id
    pub fn get_restaurant_id_by_slug(&self, slug: &str) -> StoreResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESTAURANT_SLUGS_TABLE)?;
        Ok(table.get(slug)?.map(|v| v.value().to_string()))
    }

    /// Get all restaurants
    pub fn get_all_restaurants(&self) -> StoreResult<Vec<Restaurant>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESTAURANTS_TABLE)?;

        let mut restaurants = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            restaurants.push(serde_json::from_slice(value.value())?);
        }
        Ok(restaurants)
    }

    // ========== Dining Tables ==========

    /// Store a dining table and its (restaurant, label) mapping (within transaction)
    pub fn put_table(&self, txn: &WriteTransaction, dining_table: &DiningTable) -> StoreResult<()> {
        {
            let mut table = txn.open_table(TABLES_TABLE)?;
            let value = serde_json::to_vec(dining_table)?;
            table.insert(dining_table.id.as_str(), value.as_slice())?;
        }
        let mut lookup = txn.open_table(TABLE_LOOKUP_TABLE)?;
        lookup.insert(
            (dining_table.restaurant_id.as_str(), dining_table.label.as_str()),
            dining_table.id.as_str(),
        )?;
        Ok(())
    }

    /// Remove a stale (restaurant, label) mapping after a label change (within transaction)
    pub fn remove_table_lookup(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
        label: &str,
    ) -> StoreResult<()> {
        let mut lookup = txn.open_table(TABLE_LOOKUP_TABLE)?;
        lookup.remove((restaurant_id, label))?;
        Ok(())
    }

    /// Get a dining table by id
    pub fn get_table(&self, id: &str) -> StoreResult<Option<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLES_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Find a dining table by (restaurant_id, label)
    pub fn find_table(
        &self,
        restaurant_id: &str,
        label: &str,
    ) -> StoreResult<Option<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let lookup = read_txn.open_table(TABLE_LOOKUP_TABLE)?;
        let Some(table_id) = lookup.get((restaurant_id, label))? else {
            return Ok(None);
        };
        let table = read_txn.open_table(TABLES_TABLE)?;
        match table.get(table_id.value())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all tables for a restaurant
    pub fn get_tables_for_restaurant(&self, restaurant_id: &str) -> StoreResult<Vec<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let lookup = read_txn.open_table(TABLE_LOOKUP_TABLE)?;
        let tables = read_txn.open_table(TABLES_TABLE)?;

        let range_start = (restaurant_id, "");
        let range_end = (restaurant_id, "\u{10ffff}");

        let mut out = Vec::new();
        for result in lookup.range(range_start..=range_end)? {
            let (_key, table_id) = result?;
            if let Some(value) = tables.get(table_id.value())? {
                out.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(out)
    }

    // ========== Menu Items ==========

    /// Store a menu item (within transaction)
    pub fn put_menu_item(&self, txn: &WriteTransaction, item: &MenuItem) -> StoreResult<()> {
        let mut table = txn.open_table(MENU_ITEMS_TABLE)?;
        let value = serde_json::to_vec(item)?;
        table.insert(item.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a menu item by id
    pub fn get_menu_item(&self, id: &str) -> StoreResult<Option<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_ITEMS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all menu items for a restaurant
    pub fn get_menu_for_restaurant(&self, restaurant_id: &str) -> StoreResult<Vec<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_ITEMS_TABLE)?;

        let mut items: Vec<MenuItem> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let item: MenuItem = serde_json::from_slice(value.value())?;
            if item.restaurant_id == restaurant_id {
                items.push(item);
            }
        }
        Ok(items)
    }

    // ========== Sessions ==========

    /// Store a session (within transaction)
    ///
    /// Keeps the active-session index consistent: an `Active` session is
    /// indexed under its expiry, any other status is removed from the index.
    pub fn put_session(&self, txn: &WriteTransaction, session: &Session) -> StoreResult<()> {
        {
            let mut table = txn.open_table(SESSIONS_TABLE)?;
            let value = serde_json::to_vec(session)?;
            table.insert(session.id.as_str(), value.as_slice())?;
        }
        let mut index = txn.open_table(ACTIVE_SESSIONS_TABLE)?;
        if session.status == shared::SessionStatus::Active {
            index.insert(session.id.as_str(), session.expires_at)?;
        } else {
            index.remove(session.id.as_str())?;
        }
        Ok(())
    }

    /// Get a session by id
    pub fn get_session(&self, id: &str) -> StoreResult<Option<Session>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a session by id (within transaction)
    pub fn get_session_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StoreResult<Option<Session>> {
        let table = txn.open_table(SESSIONS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Session ids whose expiry has passed (index scan, for the sweep)
    pub fn get_overdue_session_ids(&self, now: i64) -> StoreResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACTIVE_SESSIONS_TABLE)?;

        let mut ids = Vec::new();
        for result in table.iter()? {
            let (key, expires_at) = result?;
            if expires_at.value() <= now {
                ids.push(key.value().to_string());
            }
        }
        Ok(ids)
    }

    // ========== Orders ==========

    /// Store an order (within transaction)
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StoreResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an order by id
    pub fn get_order(&self, id: &str) -> StoreResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by id (within transaction)
    pub fn get_order_txn(&self, txn: &WriteTransaction, id: &str) -> StoreResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all orders for a restaurant
    pub fn get_orders_for_restaurant(&self, restaurant_id: &str) -> StoreResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders: Vec<Order> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.restaurant_id == restaurant_id {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    /// Record the auto-cancel deadline for a pending order (within transaction)
    pub fn set_pending_deadline(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        deadline: i64,
    ) -> StoreResult<()> {
        let mut table = txn.open_table(PENDING_ORDERS_TABLE)?;
        table.insert(order_id, deadline)?;
        Ok(())
    }

    /// Drop an order from the auto-cancel index (within transaction)
    ///
    /// Called whenever an order leaves `Pending`. Removing a missing key is
    /// a no-op, which keeps repeated auto-cancel firings idempotent.
    pub fn clear_pending_deadline(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StoreResult<()> {
        let mut table = txn.open_table(PENDING_ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    /// Auto-cancel deadline of a pending order, if indexed (within transaction)
    pub fn get_pending_deadline_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StoreResult<Option<i64>> {
        let table = txn.open_table(PENDING_ORDERS_TABLE)?;
        Ok(table.get(order_id)?.map(|v| v.value()))
    }

    /// Order ids whose pending deadline has passed (index scan, for the timer)
    pub fn get_overdue_pending_ids(&self, now: i64) -> StoreResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_ORDERS_TABLE)?;

        let mut ids = Vec::new();
        for result in table.iter()? {
            let (key, deadline) = result?;
            if deadline.value() <= now {
                ids.push(key.value().to_string());
            }
        }
        Ok(ids)
    }
}
