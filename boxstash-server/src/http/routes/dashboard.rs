//! Dashboard endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};

use crate::db::repos::{DashboardRepo, DashboardStats};
use crate::http::error::ApiError;
use crate::http::response::Envelope;
use crate::http::server::AppState;

/// GET /dashboard/stats
async fn stats(State(state): State<Arc<AppState>>) -> Result<Envelope<DashboardStats>, ApiError> {
    let stats = DashboardRepo::new(&state.pool).stats().await?;
    Ok(Envelope::ok(stats))
}

/// Dashboard routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard/stats", get(stats))
}
