//! Workspace umbrella crate for the log ingestion pipeline.
//!
//! This crate stitches together validation, enrichment and publishing so
//! callers can hand over a raw [`LogEntryRequest`] with a single API entry
//! point and get back an [`IngestionReceipt`] once the broker has the record.

pub use broker::{
    BackendKind, BrokerClient, BrokerConfig, BrokerError, InMemoryBroker, PublishAddress,
    PublishError, Publisher, TopologyBootstrapper, TopologyConfig, TopologyError, TopologyState,
    TopologyStatus,
};
pub use ingest::{
    EnrichedRecord, FieldViolations, IngestConfig, IngestionReceipt, LogEntryRequest, LogLevel,
    enrich, validate,
};

use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

/// Errors that can occur while taking a log record through the pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// The request broke one or more field rules. Nothing was published.
    Validation(FieldViolations),
    /// The record was valid but the broker did not take it.
    Publish(PublishError),
    /// The publish task ended without reporting an outcome.
    Internal(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Validation(err) => write!(f, "validation failure: {err}"),
            PipelineError::Publish(err) => write!(f, "ingestion failure: {err}"),
            PipelineError::Internal(detail) => write!(f, "internal failure: {detail}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Validation(err) => Some(err),
            PipelineError::Publish(err) => Some(err),
            PipelineError::Internal(_) => None,
        }
    }
}

impl From<FieldViolations> for PipelineError {
    fn from(value: FieldViolations) -> Self {
        PipelineError::Validation(value)
    }
}

impl From<PublishError> for PipelineError {
    fn from(value: PublishError) -> Self {
        PipelineError::Publish(value)
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_validation(&self, latency: Duration, result: Result<(), &FieldViolations>);
    fn record_publish(&self, latency: Duration, result: Result<(), &PublishError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_validation(self, result: Result<(), &FieldViolations>) {
        self.recorder.record_validation(self.start.elapsed(), result);
    }

    fn record_publish(self, result: Result<(), &PublishError>) {
        self.recorder.record_publish(self.start.elapsed(), result);
    }
}

/// Validates, enriches and publishes log records.
///
/// Holds no per-request state; one instance is shared by every request
/// handler. Cloning is cheap.
#[derive(Clone)]
pub struct LogIngestionService {
    cfg: Arc<IngestConfig>,
    publisher: Publisher,
}

impl LogIngestionService {
    pub fn new(cfg: IngestConfig, publisher: Publisher) -> Self {
        Self {
            cfg: Arc::new(cfg),
            publisher,
        }
    }

    /// Wires a service to `client` using the publish address from `topology`.
    pub fn with_client(
        cfg: IngestConfig,
        client: Arc<dyn BrokerClient>,
        topology: &TopologyConfig,
    ) -> Self {
        Self::new(cfg, Publisher::new(client, topology.publish_address()))
    }

    /// Takes one request through validate → enrich → publish.
    ///
    /// The receipt is only returned after the broker accepted the record, and
    /// its `id` equals the published record's `metadata.logId`. The publish
    /// runs on a spawned task, so dropping the returned future does not abort
    /// a publish already in flight.
    #[instrument(name = "ingest.pipeline", skip_all)]
    pub async fn ingest(
        &self,
        request: LogEntryRequest,
    ) -> Result<IngestionReceipt, PipelineError> {
        let mut validation_metrics = MetricsSpan::start();
        let record = match validate(request, &self.cfg).into_result() {
            Ok(record) => {
                if let Some(span) = validation_metrics.take() {
                    span.record_validation(Ok(()));
                }
                record
            }
            Err(violations) => {
                if let Some(span) = validation_metrics.take() {
                    span.record_validation(Err(&violations));
                }
                warn!(violations = %violations, "log_rejected");
                return Err(PipelineError::Validation(violations));
            }
        };

        let enriched = enrich(record, &self.cfg);
        let log_id = enriched.log_id();
        let service = enriched.service.clone();
        let level = enriched.level;

        let publisher = self.publisher.clone();
        let mut publish_metrics = MetricsSpan::start();
        let outcome = tokio::spawn(async move { publisher.publish(&enriched).await }).await;

        match outcome {
            Ok(Ok(())) => {
                if let Some(span) = publish_metrics.take() {
                    span.record_publish(Ok(()));
                }
                info!(%log_id, %service, %level, "log_accepted");
                Ok(IngestionReceipt::accepted(log_id))
            }
            Ok(Err(err)) => {
                if let Some(span) = publish_metrics.take() {
                    span.record_publish(Err(&err));
                }
                error!(
                    %log_id,
                    %service,
                    error = %err,
                    cause = ?err.source(),
                    "log_publish_failed"
                );
                Err(PipelineError::Publish(err))
            }
            Err(join_err) => {
                error!(%log_id, error = %join_err, "log_publish_task_failed");
                Err(PipelineError::Internal(join_err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, RwLock};

    fn scenario_a() -> LogEntryRequest {
        LogEntryRequest {
            level: Some("INFO".into()),
            message: Some("Service started".into()),
            service: Some("test-service".into()),
            ..Default::default()
        }
    }

    async fn ready_service() -> (LogIngestionService, Arc<InMemoryBroker>) {
        let broker = Arc::new(InMemoryBroker::new());
        let topology = TopologyConfig::default();
        TopologyBootstrapper::new(broker.clone(), topology.clone())
            .bootstrap()
            .await
            .expect("bootstrap");
        let service =
            LogIngestionService::with_client(IngestConfig::default(), broker.clone(), &topology);
        (service, broker)
    }

    #[tokio::test]
    async fn ingest_publishes_and_returns_matching_receipt() {
        let (service, broker) = ready_service().await;

        let receipt = service.ingest(scenario_a()).await.expect("accepted");
        assert_eq!(receipt.status, "accepted");
        assert_eq!(receipt.message, "Log entry accepted for processing");

        let published = broker.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].message.message_id, receipt.id);
    }

    #[tokio::test]
    async fn invalid_request_is_not_published() {
        let (service, broker) = ready_service().await;

        let err = service
            .ingest(LogEntryRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(broker.published().is_empty());
    }

    #[tokio::test]
    async fn publish_failure_is_surfaced() {
        let (service, broker) = ready_service().await;
        broker.fail_publishes(true);

        let err = service.ingest(scenario_a()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Publish(_)));
        assert!(err.source().is_some());
    }

    #[derive(Default)]
    struct CountingMetrics {
        events: Arc<RwLock<Vec<&'static str>>>,
    }

    impl CountingMetrics {
        fn snapshot(&self) -> Vec<&'static str> {
            self.events.read().unwrap().clone()
        }
    }

    impl PipelineMetrics for CountingMetrics {
        fn record_validation(&self, _latency: Duration, result: Result<(), &FieldViolations>) {
            let label = if result.is_ok() {
                "validation_ok"
            } else {
                "validation_err"
            };
            self.events.write().unwrap().push(label);
        }

        fn record_publish(&self, _latency: Duration, result: Result<(), &PublishError>) {
            let label = if result.is_ok() {
                "publish_ok"
            } else {
                "publish_err"
            };
            self.events.write().unwrap().push(label);
        }
    }

    #[tokio::test]
    async fn metrics_recorder_tracks_pipeline_outcome() {
        let metrics = Arc::new(CountingMetrics::default());
        set_pipeline_metrics(Some(metrics.clone()));

        let (service, _broker) = ready_service().await;
        service.ingest(scenario_a()).await.expect("accepted");
        let _ = service.ingest(LogEntryRequest::default()).await;

        set_pipeline_metrics(None);

        let events = metrics.snapshot();
        assert!(events.contains(&"validation_ok"));
        assert!(events.contains(&"publish_ok"));
        assert!(events.contains(&"validation_err"));
    }
}
