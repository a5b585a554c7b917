//! HTTP server command
//!
//! Starts from `ServerConfig::from_env()` and applies whatever flags were given.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use boxstash_server::ServerConfig;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Interface to bind to
    #[arg(long, env = "HOST")]
    pub host: Option<IpAddr>,

    /// Port to listen on
    #[arg(long, short = 'p', env = "PORT")]
    pub port: Option<u16>,

    /// Database URL (overrides DB_HOST/DB_PORT/... composition)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Root directory for uploaded photos and documents
    #[arg(long, env = "UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Built frontend to serve at `/`, with index.html fallback
    #[arg(long, env = "FRONTEND_DIR")]
    pub frontend_dir: Option<PathBuf>,

    /// Skip applying the schema on startup
    #[arg(long)]
    pub no_migrate: bool,
}

impl ServeArgs {
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        let host = self.host.unwrap_or(config.bind_addr.ip());
        let port = self.port.unwrap_or(config.bind_addr.port());
        config.bind_addr = SocketAddr::new(host, port);
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        if let Some(dir) = self.upload_dir {
            config.upload_dir = dir;
        }
        if let Some(dir) = self.frontend_dir {
            config.frontend_dir = Some(dir);
        }
        config
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let migrate = !args.no_migrate;
    let config = args.apply(super::load_config(None)?);

    tracing::info!("Starting boxstash server on {}", config.bind_addr);

    // Blocks until shutdown
    boxstash_server::serve(config, migrate)
        .await
        .context("Server error")?;

    Ok(())
}
