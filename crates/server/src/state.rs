use crate::config::ServerConfig;
use broker::TopologyStatus;
use logingest::LogIngestionService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Validate → enrich → publish pipeline (shared across requests)
    pub service: LogIngestionService,

    /// Topology bootstrap state, read by the readiness probe
    pub topology: TopologyStatus,

    /// Prometheus render handle; `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create new server state
    pub fn new(
        config: ServerConfig,
        service: LogIngestionService,
        topology: TopologyStatus,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            service,
            topology,
            metrics,
        }
    }
}
