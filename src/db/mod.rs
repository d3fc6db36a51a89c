//! Database layer
//!
//! A trait-based abstraction (`DatabasePool`) lets the engine run against
//! either SQLite (default, single-file deployment) or MySQL without the
//! repositories knowing which backend is active. The driver is selected
//! by configuration.

pub mod pool;
pub mod repositories;
pub mod schema;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
