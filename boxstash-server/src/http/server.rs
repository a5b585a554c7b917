//! Axum server setup
//!
//! Server skeleton with:
//! - `/api` routes, `/uploads` static files, optional frontend with index fallback
//! - CORS restricted to the configured frontend origins
//! - Tracing and request timeout middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::sync::Arc;
use std::time::Instant;

use axum::http::HeaderValue;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::config::ServerConfig;
use crate::uploads::{UploadError, UploadStore, PUBLIC_PREFIX};

/// Shared application state
pub struct AppState {
    pub pool: PgPool,
    pub config: ServerConfig,
    pub uploads: UploadStore,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(pool: PgPool, config: ServerConfig) -> Self {
        let uploads = UploadStore::new(config.upload_dir.clone(), config.max_file_size);
        Self {
            pool,
            config,
            uploads,
            started_at: Instant::now(),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "CORS: ignoring invalid origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let config = &state.config;

    let api = Router::new()
        .merge(routes::health::router())
        .merge(routes::boxes::router())
        .merge(routes::items::router())
        .merge(routes::nfc::router())
        .merge(routes::files::router(config.max_file_size))
        .merge(routes::dashboard::router())
        .fallback(routes::not_found);

    let mut app = Router::new()
        .nest("/api", api)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&config.upload_dir));

    if let Some(dir) = &config.frontend_dir {
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).fallback(index));
    }

    app.layer(TimeoutLayer::new(config.request_timeout))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let config = ServerConfig::from_env()?;
/// let pool = create_pool_with_settings(&config.database_url, config.pool).await?;
/// run_server(pool, config).await?;
/// ```
pub async fn run_server(pool: PgPool, config: ServerConfig) -> Result<(), ServerError> {
    let state = AppState::new(pool, config);
    state.uploads.ensure_dirs().await?;
    tracing::info!(
        upload_dir = %state.config.upload_dir.display(),
        frontend = ?state.config.frontend_dir,
        origins = ?state.config.cors_origins,
        "configuration loaded"
    );

    let bind_addr = state.config.bind_addr;
    let app = build_router(Arc::new(state));

    // Bind listener
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload storage: {0}")]
    Storage(#[from] UploadError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Router over a pool that never connects; enough for routes that fail before the database.
    fn offline_app(frontend: Option<&TempDir>, uploads: &TempDir) -> Router {
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(50))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .expect("lazy pool");
        let config = ServerConfig {
            upload_dir: uploads.path().to_path_buf(),
            frontend_dir: frontend.map(|d| d.path().to_path_buf()),
            ..ServerConfig::default()
        };
        build_router(Arc::new(AppState::new(pool, config)))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn unknown_api_route_is_404_envelope() {
        let uploads = TempDir::new().unwrap();
        let (status, body) = get(offline_app(None, &uploads), "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "API route not found");
    }

    #[tokio::test]
    async fn invalid_uuid_is_400() {
        let uploads = TempDir::new().unwrap();
        let (status, body) = get(offline_app(None, &uploads), "/api/boxes/not-a-uuid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("invalid UUID format"), "{body}");
    }

    #[tokio::test]
    async fn invalid_nfc_tag_is_400() {
        let uploads = TempDir::new().unwrap();
        let (status, _) = get(offline_app(None, &uploads), "/api/nfc/scan/zz-top").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_item_status_is_400() {
        let uploads = TempDir::new().unwrap();
        let (status, body) = get(offline_app(None, &uploads), "/api/items?status=plenty").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("plenty"), "{body}");
    }

    #[tokio::test]
    async fn health_reports_database_down() {
        let uploads = TempDir::new().unwrap();
        let (status, body) = get(offline_app(None, &uploads), "/api/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("disconnected"), "{body}");
    }

    #[tokio::test]
    async fn serves_uploaded_files() {
        let uploads = TempDir::new().unwrap();
        std::fs::create_dir_all(uploads.path().join("photos")).unwrap();
        std::fs::write(uploads.path().join("photos/p.txt"), "pixels").unwrap();

        let (status, body) = get(offline_app(None, &uploads), "/uploads/photos/p.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "pixels");
    }

    #[tokio::test]
    async fn frontend_falls_back_to_index() {
        let uploads = TempDir::new().unwrap();
        let frontend = TempDir::new().unwrap();
        std::fs::write(frontend.path().join("index.html"), "<h1>boxstash</h1>").unwrap();

        let (status, body) = get(offline_app(Some(&frontend), &uploads), "/boxes/123").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("boxstash"));
    }

    #[tokio::test]
    async fn without_frontend_unknown_paths_are_404() {
        let uploads = TempDir::new().unwrap();
        let (status, _) = get(offline_app(None, &uploads), "/index.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
