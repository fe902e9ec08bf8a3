//! Catalog service: QR resolution, menu lookups, staff CRUD
//!
//! The catalog is the reference data the ordering core reads on every
//! request: restaurants, dining tables, menu items. Records persist in redb;
//! all reads go through an in-memory cache behind a `parking_lot::RwLock`,
//! rebuilt entry-wise on every staff mutation. Cart mutation and conversion
//! take their price/availability snapshots from here.

use parking_lot::RwLock;
use shared::util::{now_millis, opaque_id};
use shared::{
    DiningTable, DiningTableCreate, DiningTableUpdate, MenuItem, MenuItemCreate, MenuItemUpdate,
    Restaurant, RestaurantCreate, RestaurantUpdate,
};
use std::collections::HashMap;
use thiserror::Error;

use crate::store::{Store, StoreError};

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// 目标不存在
    #[error("Not found: {0}")]
    NotFound(String),

    /// 目标存在但已停用
    #[error("Target inactive: {0}")]
    Inactive(String),

    /// 唯一性冲突 (slug / 桌台标签)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// A successfully resolved QR target
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub restaurant: Restaurant,
    pub table: DiningTable,
}

#[derive(Default)]
struct CatalogCache {
    restaurants: HashMap<String, Restaurant>,
    /// slug -> restaurant_id
    slugs: HashMap<String, String>,
    /// (restaurant_id, label) -> table
    tables: HashMap<(String, String), DiningTable>,
    menu_items: HashMap<String, MenuItem>,
}

/// Catalog over redb with a warm read cache
pub struct CatalogService {
    store: Store,
    cache: RwLock<CatalogCache>,
}

impl CatalogService {
    /// Build the service and warm the cache from the store
    pub fn new(store: Store) -> CatalogResult<Self> {
        let mut cache = CatalogCache::default();

        for restaurant in store.get_all_restaurants()? {
            cache
                .slugs
                .insert(restaurant.slug.clone(), restaurant.id.clone());
            for table in store.get_tables_for_restaurant(&restaurant.id)? {
                cache.tables.insert(
                    (table.restaurant_id.clone(), table.label.clone()),
                    table,
                );
            }
            for item in store.get_menu_for_restaurant(&restaurant.id)? {
                cache.menu_items.insert(item.id.clone(), item);
            }
            cache.restaurants.insert(restaurant.id.clone(), restaurant);
        }

        tracing::info!(
            restaurants = cache.restaurants.len(),
            tables = cache.tables.len(),
            menu_items = cache.menu_items.len(),
            "Catalog cache warmed"
        );

        Ok(Self {
            store,
            cache: RwLock::new(cache),
        })
    }

    // ========== QR Resolution ==========

    /// Resolve a scanned `(slug, table_label)` pair
    ///
    /// Pure lookup, no side effects. Unknown slug or label yields
    /// [`CatalogError::NotFound`]; a target that exists but has been
    /// deactivated yields [`CatalogError::Inactive`], and callers decide
    /// whether to surface that distinction.
    pub fn resolve(&self, slug: &str, table_label: &str) -> CatalogResult<ResolvedTarget> {
        let cache = self.cache.read();

        let restaurant_id = cache
            .slugs
            .get(slug)
            .ok_or_else(|| CatalogError::NotFound(format!("restaurant '{}'", slug)))?;
        let restaurant = cache
            .restaurants
            .get(restaurant_id)
            .ok_or_else(|| CatalogError::NotFound(format!("restaurant '{}'", slug)))?;
        if !restaurant.is_active {
            return Err(CatalogError::Inactive(format!("restaurant '{}'", slug)));
        }

        let table = cache
            .tables
            .get(&(restaurant.id.clone(), table_label.to_string()))
            .ok_or_else(|| {
                CatalogError::NotFound(format!("table '{}' at '{}'", table_label, slug))
            })?;
        if !table.is_active {
            return Err(CatalogError::Inactive(format!(
                "table '{}' at '{}'",
                table_label, slug
            )));
        }

        Ok(ResolvedTarget {
            restaurant: restaurant.clone(),
            table: table.clone(),
        })
    }

    // ========== Menu Lookups ==========

    /// Single menu item by id (cart mutation / conversion snapshot source)
    pub fn menu_item(&self, id: &str) -> Option<MenuItem> {
        self.cache.read().menu_items.get(id).cloned()
    }

    /// All available menu items of a restaurant, sorted by name
    pub fn menu_for_restaurant(&self, restaurant_id: &str) -> Vec<MenuItem> {
        let cache = self.cache.read();
        let mut items: Vec<MenuItem> = cache
            .menu_items
            .values()
            .filter(|i| i.restaurant_id == restaurant_id && i.is_available)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    pub fn get_restaurant(&self, id: &str) -> Option<Restaurant> {
        self.cache.read().restaurants.get(id).cloned()
    }

    // ========== Staff CRUD: Restaurants ==========

    pub fn create_restaurant(&self, payload: RestaurantCreate) -> CatalogResult<Restaurant> {
        if self.cache.read().slugs.contains_key(&payload.slug) {
            return Err(CatalogError::Conflict(format!(
                "slug '{}' already in use",
                payload.slug
            )));
        }

        let restaurant = Restaurant {
            id: opaque_id(),
            slug: payload.slug,
            name: payload.name,
            is_active: true,
            created_at: now_millis(),
        };

        let txn = self.store.begin_write()?;
        self.store.put_restaurant(&txn, &restaurant)?;
        self.store.commit(txn)?;

        let mut cache = self.cache.write();
        cache
            .slugs
            .insert(restaurant.slug.clone(), restaurant.id.clone());
        cache
            .restaurants
            .insert(restaurant.id.clone(), restaurant.clone());

        Ok(restaurant)
    }

    pub fn update_restaurant(
        &self,
        id: &str,
        payload: RestaurantUpdate,
    ) -> CatalogResult<Restaurant> {
        let mut restaurant = self
            .get_restaurant(id)
            .ok_or_else(|| CatalogError::NotFound(format!("restaurant '{}'", id)))?;

        if let Some(name) = payload.name {
            restaurant.name = name;
        }
        if let Some(is_active) = payload.is_active {
            restaurant.is_active = is_active;
        }

        let txn = self.store.begin_write()?;
        self.store.put_restaurant(&txn, &restaurant)?;
        self.store.commit(txn)?;

        self.cache
            .write()
            .restaurants
            .insert(restaurant.id.clone(), restaurant.clone());

        Ok(restaurant)
    }

    /// Soft deactivation; restaurants are never hard-deleted
    pub fn deactivate_restaurant(&self, id: &str) -> CatalogResult<Restaurant> {
        self.update_restaurant(
            id,
            RestaurantUpdate {
                name: None,
                is_active: Some(false),
            },
        )
    }

    pub fn list_restaurants(&self) -> Vec<Restaurant> {
        let mut restaurants: Vec<Restaurant> =
            self.cache.read().restaurants.values().cloned().collect();
        restaurants.sort_by(|a, b| a.name.cmp(&b.name));
        restaurants
    }

    // ========== Staff CRUD: Dining Tables ==========

    pub fn create_table(&self, payload: DiningTableCreate) -> CatalogResult<DiningTable> {
        if self.get_restaurant(&payload.restaurant_id).is_none() {
            return Err(CatalogError::NotFound(format!(
                "restaurant '{}'",
                payload.restaurant_id
            )));
        }
        let key = (payload.restaurant_id.clone(), payload.label.clone());
        if self.cache.read().tables.contains_key(&key) {
            return Err(CatalogError::Conflict(format!(
                "table label '{}' already in use",
                payload.label
            )));
        }

        let table = DiningTable {
            id: opaque_id(),
            restaurant_id: payload.restaurant_id,
            label: payload.label,
            is_active: true,
        };

        let txn = self.store.begin_write()?;
        self.store.put_table(&txn, &table)?;
        self.store.commit(txn)?;

        self.cache.write().tables.insert(key, table.clone());
        Ok(table)
    }

    pub fn update_table(&self, id: &str, payload: DiningTableUpdate) -> CatalogResult<DiningTable> {
        let mut table = self
            .store
            .get_table(id)?
            .ok_or_else(|| CatalogError::NotFound(format!("table '{}'", id)))?;
        let old_label = table.label.clone();

        if let Some(label) = payload.label {
            let key = (table.restaurant_id.clone(), label.clone());
            if label != old_label && self.cache.read().tables.contains_key(&key) {
                return Err(CatalogError::Conflict(format!(
                    "table label '{}' already in use",
                    label
                )));
            }
            table.label = label;
        }
        if let Some(is_active) = payload.is_active {
            table.is_active = is_active;
        }

        let txn = self.store.begin_write()?;
        if table.label != old_label {
            self.store
                .remove_table_lookup(&txn, &table.restaurant_id, &old_label)?;
        }
        self.store.put_table(&txn, &table)?;
        self.store.commit(txn)?;

        let mut cache = self.cache.write();
        if table.label != old_label {
            cache
                .tables
                .remove(&(table.restaurant_id.clone(), old_label));
        }
        cache.tables.insert(
            (table.restaurant_id.clone(), table.label.clone()),
            table.clone(),
        );

        Ok(table)
    }

    pub fn deactivate_table(&self, id: &str) -> CatalogResult<DiningTable> {
        self.update_table(
            id,
            DiningTableUpdate {
                label: None,
                is_active: Some(false),
            },
        )
    }

    pub fn list_tables(&self, restaurant_id: &str) -> Vec<DiningTable> {
        let cache = self.cache.read();
        let mut tables: Vec<DiningTable> = cache
            .tables
            .values()
            .filter(|t| t.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        tables.sort_by(|a, b| a.label.cmp(&b.label));
        tables
    }

    // ========== Staff CRUD: Menu Items ==========

    pub fn create_menu_item(&self, payload: MenuItemCreate) -> CatalogResult<MenuItem> {
        if self.get_restaurant(&payload.restaurant_id).is_none() {
            return Err(CatalogError::NotFound(format!(
                "restaurant '{}'",
                payload.restaurant_id
            )));
        }

        let item = MenuItem {
            id: opaque_id(),
            restaurant_id: payload.restaurant_id,
            name: payload.name,
            price_cents: payload.price_cents,
            is_available: true,
        };

        let txn = self.store.begin_write()?;
        self.store.put_menu_item(&txn, &item)?;
        self.store.commit(txn)?;

        self.cache
            .write()
            .menu_items
            .insert(item.id.clone(), item.clone());
        Ok(item)
    }

    pub fn update_menu_item(&self, id: &str, payload: MenuItemUpdate) -> CatalogResult<MenuItem> {
        let mut item = self
            .menu_item(id)
            .ok_or_else(|| CatalogError::NotFound(format!("menu item '{}'", id)))?;

        if let Some(name) = payload.name {
            item.name = name;
        }
        if let Some(price_cents) = payload.price_cents {
            item.price_cents = price_cents;
        }
        if let Some(is_available) = payload.is_available {
            item.is_available = is_available;
        }

        let txn = self.store.begin_write()?;
        self.store.put_menu_item(&txn, &item)?;
        self.store.commit(txn)?;

        self.cache
            .write()
            .menu_items
            .insert(item.id.clone(), item.clone());
        Ok(item)
    }

    pub fn deactivate_menu_item(&self, id: &str) -> CatalogResult<MenuItem> {
        self.update_menu_item(
            id,
            MenuItemUpdate {
                name: None,
                price_cents: None,
                is_available: Some(false),
            },
        )
    }

    pub fn list_menu_items(&self, restaurant_id: &str) -> Vec<MenuItem> {
        let cache = self.cache.read();
        let mut items: Vec<MenuItem> = cache
            .menu_items
            .values()
            .filter(|i| i.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }
}
