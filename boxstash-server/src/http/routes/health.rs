//! Health check endpoint

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db;
use crate::http::server::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since startup
    pub uptime: u64,
    pub version: &'static str,
    pub database: &'static str,
}

impl HealthResponse {
    fn new(database_ok: bool, uptime: Duration) -> Self {
        Self {
            success: database_ok,
            status: if database_ok { "ok" } else { "degraded" },
            timestamp: Utc::now(),
            uptime: uptime.as_secs(),
            version: env!("CARGO_PKG_VERSION"),
            database: if database_ok {
                "connected"
            } else {
                "disconnected"
            },
        }
    }

    fn status_code(&self) -> StatusCode {
        if self.success {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database_ok = match db::ping(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unreachable");
            false
        }
    };
    let body = HealthResponse::new(database_ok, state.started_at.elapsed());
    (body.status_code(), Json(body))
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_is_200() {
        let body = HealthResponse::new(true, Duration::from_secs(90));
        assert_eq!(body.status_code(), StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.uptime, 90);
        assert_eq!(body.database, "connected");
    }

    #[test]
    fn database_down_is_503() {
        let body = HealthResponse::new(false, Duration::ZERO);
        assert_eq!(body.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.database, "disconnected");
        assert!(!body.success);
    }
}
