//! Catalog entities: restaurants, dining tables, menu items.

mod dining_table;
mod menu_item;
mod restaurant;

pub use dining_table::{DiningTable, DiningTableCreate, DiningTableUpdate};
pub use menu_item::{MenuItem, MenuItemCreate, MenuItemUpdate};
pub use restaurant::{Restaurant, RestaurantCreate, RestaurantUpdate};
