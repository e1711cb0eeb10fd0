//! Persistent store (C1).
//!
//! A single SQLite file holding server records, power-state history, and
//! workflow history. Migrations run at open time via `sqlx::migrate!` and
//! are tracked in sqlx's own `_sqlx_migrations` table, which already
//! records version/checksum/applied-at — so this crate does not maintain
//! a second, hand-rolled migrations table.

pub mod errors;
pub mod pool;
pub mod store;

pub use errors::*;
pub use pool::open;
pub use store::Store;
