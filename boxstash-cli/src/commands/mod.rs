//! Command implementations for the boxstash CLI

pub mod check;
pub mod migrate;
pub mod serve;

pub use check::run_check;
pub use migrate::run_migrate;
pub use serve::run_serve;

use anyhow::{Context, Result};
use boxstash_server::ServerConfig;

/// Environment config with an optional `--database-url` applied on top.
pub(crate) fn load_config(database_url: Option<String>) -> Result<ServerConfig> {
    let mut config = ServerConfig::from_env().context("invalid configuration in environment")?;
    if let Some(url) = database_url {
        config.database_url = url;
    }
    Ok(config)
}

/// Connect with the configured pool settings.
pub(crate) async fn connect(config: &ServerConfig) -> Result<sqlx::PgPool> {
    boxstash_server::db::create_pool_with_settings(&config.database_url, config.pool)
        .await
        .context("Failed to create database pool")
}
