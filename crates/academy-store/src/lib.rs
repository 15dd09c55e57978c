//! # academy-store
//!
//! Local persistence for the Academy portals.
//!
//! The store models a browser origin's key-value storage area: a single
//! SQLite database shared by every open context ("tab") of the origin. Each
//! [`Tab`] reads and writes JSON values under string keys and receives change
//! notifications for writes made by *other* tabs. Typed [`Repository`]
//! handles sit on top of the raw accessor and own schema versioning and
//! validation for each record collection.

pub mod config;
pub mod database;
pub mod kv;
pub mod live;
pub mod migrations;
pub mod models;
pub mod notifier;
pub mod records;
pub mod repository;
pub mod schema;
pub mod seed;
pub mod session;
pub mod snapshot;
pub mod store;

mod error;

pub use config::StoreConfig;
pub use database::Database;
pub use error::{Result, StoreError};
pub use live::LiveView;
pub use models::*;
pub use notifier::{ChangeBus, ChangeEvent, NotifyError, Subscription};
pub use repository::Repository;
pub use schema::Record;
pub use session::SessionStorage;
pub use store::{LocalStore, Tab, Txn};
