//! Prometheus wiring for pipeline metrics.
//!
//! The pipeline reports through [`logingest::PipelineMetrics`]; this module
//! forwards those callbacks to the `metrics` facade, and the installed
//! Prometheus recorder renders them on `GET /metrics`.

use broker::PublishError;
use ingest::FieldViolations;
use logingest::PipelineMetrics;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const RECORDS_ACCEPTED: &str = "logingest_records_accepted_total";
pub const RECORDS_REJECTED: &str = "logingest_records_rejected_total";
pub const PUBLISH_FAILURES: &str = "logingest_publish_failures_total";
pub const PUBLISH_SECONDS: &str = "logingest_publish_seconds";

/// Install the process-wide Prometheus recorder and describe our metrics.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_counter!(RECORDS_ACCEPTED, "Log records published to the broker");
    describe_counter!(RECORDS_REJECTED, "Log records that failed validation");
    describe_counter!(PUBLISH_FAILURES, "Valid log records the broker did not take");
    describe_histogram!(
        PUBLISH_SECONDS,
        Unit::Seconds,
        "Time spent handing a record to the broker"
    );
    Ok(handle)
}

/// [`PipelineMetrics`] implementation backed by the `metrics` facade.
#[derive(Debug, Default)]
pub struct PrometheusPipelineMetrics;

impl PipelineMetrics for PrometheusPipelineMetrics {
    fn record_validation(&self, _latency: Duration, result: Result<(), &FieldViolations>) {
        if result.is_err() {
            counter!(RECORDS_REJECTED).increment(1);
        }
    }

    fn record_publish(&self, latency: Duration, result: Result<(), &PublishError>) {
        histogram!(PUBLISH_SECONDS).record(latency.as_secs_f64());
        match result {
            Ok(()) => counter!(RECORDS_ACCEPTED).increment(1),
            Err(_) => counter!(PUBLISH_FAILURES).increment(1),
        }
    }
}
