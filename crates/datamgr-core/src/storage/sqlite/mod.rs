//! Durable cache index (SQLite via sqlx).
//!
//! [`CacheDb`] is the async database handle; [`SqliteStorage`] wraps it in a
//! private runtime so it can serve the synchronous [`Storage`](super::Storage)
//! trait.

mod blocking;
mod db;
mod entries;

pub use blocking::SqliteStorage;
pub use db::{default_db_path, CacheDb};
pub use entries::CacheRecord;
