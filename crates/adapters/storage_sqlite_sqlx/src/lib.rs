//! # parentctl-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `ConfigStore` port defined in `parentctl-app::ports`
//! - Keep staged changes per namespace and apply them in one transaction
//!   on commit
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//!
//! ## Dependency rule
//! Depends on `parentctl-app` (for port traits) and `parentctl-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod config_store;
mod error;
mod pool;

pub use config_store::SqliteConfigStore;
pub use error::StorageError;
pub use pool::{Config, Database};
