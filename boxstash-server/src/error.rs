//! Top-level error type for starting the service

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DbError;
use crate::http::ServerError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] DbError),

    #[error("server error: {0}")]
    Server(#[from] ServerError),
}
