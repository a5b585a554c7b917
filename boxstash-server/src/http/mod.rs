//! HTTP server layer
//!
//! Axum server with:
//! - CORS restricted to the configured frontend origins
//! - Request tracing and timeouts
//! - Graceful shutdown
//! - JSON envelopes for every response, errors included

pub mod error;
pub mod extractors;
pub mod response;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use response::Envelope;
pub use server::{build_router, run_server, AppState, ServerError};
