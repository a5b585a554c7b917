//! Route handlers organized by resource

pub mod boxes;
pub mod dashboard;
pub mod files;
pub mod health;
pub mod items;
pub mod nfc;

use axum::http::StatusCode;

use super::response::Envelope;

/// Fallback for unknown `/api` paths
pub async fn not_found() -> Envelope<()> {
    Envelope::failure(StatusCode::NOT_FOUND, "not_found", "API route not found")
}
