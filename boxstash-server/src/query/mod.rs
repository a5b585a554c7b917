//! Document-style query layer over Postgres
//!
//! Handlers describe lookups with JSON filter documents (`$or`, `$regex`,
//! `$gt`, `$in`, ...). They are validated against a per-collection
//! [`Schema`], translated into parameterised SQL and run through a fluent
//! [`Find`] builder.

pub mod filter;
pub mod find;
pub mod schema;

pub use filter::{like_pattern, Filter, Op, Scalar};
pub use find::{Collection, Find, Order};
pub use schema::{ColumnType, Field, Schema};
