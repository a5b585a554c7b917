//! Database layer - connection pool, migrations and repositories
//!
//! # Design Principles
//!
//! - Bounded connection pool shared through `AppState`
//! - Related rows loaded in one extra query - no N+1
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Transactions for multi-step operations

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use error::DbError;
pub use pool::{create_pool, create_pool_with_settings, ping, PoolSettings};
pub use repos::*;
