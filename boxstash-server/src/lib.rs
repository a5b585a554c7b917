//! boxstash-server: home inventory HTTP API
//!
//! Boxes, the items inside them, NFC tags stuck on the boxes, and photo /
//! document attachments, stored in PostgreSQL and served over axum.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod query;
pub mod uploads;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use http::{build_router, run_server, AppState};

/// Connect, optionally migrate, and serve until shutdown.
pub async fn serve(config: ServerConfig, migrate: bool) -> Result<()> {
    let pool = db::create_pool_with_settings(&config.database_url, config.pool).await?;
    if migrate {
        db::migrations::run(&pool).await?;
    } else {
        tracing::info!("skipping migrations");
    }
    run_server(pool, config).await?;
    Ok(())
}
