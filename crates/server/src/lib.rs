//! Log Ingestion Server - HTTP front door for the log pipeline
//!
//! This crate provides the HTTP server that accepts log entries, runs them
//! through validation and enrichment, and publishes them to the message
//! broker. It supports:
//!
//! - **Log Ingestion**: `POST /api/v1/logs`, answered with 202 and a receipt
//! - **Startup Ordering**: broker topology is declared before the listener is bound
//! - **Health & Metrics**: Liveness/readiness probes and Prometheus metrics
//!
//! # Features
//!
//! - **Middleware**: CORS, request ID tracking, structured logging, timeouts
//! - **Configuration**: `.env`, optional `logingest` config file, `LOGINGEST__*` env vars
//! - **Error Handling**: Uniform JSON error bodies with `timestamp`, `status`, `error`
//! - **Graceful Shutdown**: Proper signal handling for production deployments
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (503 until the topology is declared)
//! - `GET /metrics` - Prometheus metrics
//! - `POST /api/v1/logs` - Ingest one log entry
//! - `GET /api/v1/logs/health` - Service health

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, init_tracing, start_server};
pub use state::ServerState;
