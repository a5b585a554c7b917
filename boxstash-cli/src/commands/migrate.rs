//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use boxstash_server::db::migrations;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides DB_HOST/DB_PORT/... composition)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let config = super::load_config(args.database_url)?;
    let pool = super::connect(&config).await?;

    migrations::run(&pool)
        .await
        .context("Failed to apply database schema")?;

    pool.close().await;
    println!("Schema is up to date");
    Ok(())
}
