//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Startup ordering: broker connection and topology before the listener
//! - Middleware stack (logging, request ids, timeouts, CORS)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::metrics::{install_recorder, PrometheusPipelineMetrics};
use crate::middleware::{log_requests, request_id};
use crate::routes::{api_info, health, logs, not_found};
use crate::state::ServerState;
use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use broker::{TopologyBootstrapper, TopologyStatus};
use logingest::{set_pipeline_metrics, LogIngestionService};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Build the Axum router with all routes and middleware
///
/// Middleware stack (applied in reverse order):
/// 1. Request ID tracking
/// 2. Request logging
/// 3. CORS
/// 4. Timeout handling (408)
/// 5. Body size limit (log routes only)
pub fn build_router(state: Arc<ServerState>) -> Router {
    // CORS layer
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics));

    let log_routes = Router::new()
        .route("/api/v1/logs", post(logs::ingest_log))
        .route("/api/v1/logs/health", get(health::logs_health))
        .layer(DefaultBodyLimit::max(state.config.max_body_size()));

    Router::new()
        .merge(public_routes)
        .merge(log_routes)
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(cors)
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize structured JSON logging. `RUST_LOG` wins over `log_level`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .try_init();
}

/// Start the log ingestion HTTP server
///
/// This function performs the following initialization steps:
/// 1. Sets up structured JSON logging with the configured log level
/// 2. Installs the Prometheus recorder (if metrics are enabled)
/// 3. Connects to the broker and declares the topology
/// 4. Builds the Axum router with all routes and middleware
/// 5. Binds to the configured TCP address and serves until shutdown
///
/// A broker or topology failure in step 3 returns an error before anything
/// is bound, so the process exits without ever accepting a request.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
///
/// # Shutdown
///
/// The server handles graceful shutdown on:
/// - SIGTERM (Unix/Linux)
/// - Ctrl+C (all platforms)
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&config.log_level);
    config.validate()?;

    let metrics = if config.metrics_enabled {
        let handle = install_recorder().context("failed to install metrics recorder")?;
        set_pipeline_metrics(Some(Arc::new(PrometheusPipelineMetrics)));
        Some(handle)
    } else {
        None
    };

    let client = config
        .broker
        .connect()
        .await
        .context("failed to connect to message broker")?;

    let topology = TopologyStatus::new();
    TopologyBootstrapper::with_status(client.clone(), config.topology.clone(), topology.clone())
        .bootstrap()
        .await
        .context("failed to initialize broker topology")?;

    let service = LogIngestionService::with_client(config.ingest.clone(), client, &config.topology);
    let state = Arc::new(ServerState::new(config.clone(), service, topology, metrics));
    let app = build_router(state);

    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        %addr,
        backend = ?config.broker.backend,
        exchange = %config.topology.exchange,
        routing_key = %config.topology.routing_key,
        "server_starting"
    );
    tracing::info!(
        timeout_secs = config.timeout_secs,
        max_body_size_kb = config.max_body_size_kb,
        cors = config.enable_cors,
        metrics = config.metrics_enabled,
        "server_settings"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server_shutdown_complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
