//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - List and search queries go through the filter translator
//! - Uniqueness comes from constraints, conflicts are mapped on error
//! - Multi-row writes run in one transaction with rows locked up front

pub mod boxes;
pub mod dashboard;
pub mod items;
pub mod nfc;

pub use boxes::{BoxChanges, BoxQuery, BoxRecord, BoxRepo, NewBox, BOX_SCHEMA};
pub use dashboard::{Activity, ActivityKind, DashboardRepo, DashboardStats};
pub use items::{
    BoxSummary, CategoryStat, ItemChanges, ItemQuery, ItemRecord, ItemRepo, NewItem, ITEM_SCHEMA,
};
pub use nfc::{NfcBinding, NfcRepo, TagAvailability};
