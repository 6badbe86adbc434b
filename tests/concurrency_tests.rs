//! Concurrency tests for the ingestion pipeline

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use broker::{BindingSpec, ExchangeSpec, OutboundMessage, QueueSpec};
use logingest::{
    BrokerClient, BrokerError, IngestConfig, InMemoryBroker, LogEntryRequest,
    LogIngestionService, TopologyBootstrapper, TopologyConfig, TopologyError, TopologyStatus,
};
use serde_json::Value;

fn request(i: usize) -> LogEntryRequest {
    LogEntryRequest {
        level: Some("INFO".into()),
        message: Some(format!("concurrent message {i}")),
        service: Some(format!("service-{}", i % 4)),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ingest_publishes_every_record_once() {
    let broker = Arc::new(InMemoryBroker::new());
    let topology = TopologyConfig::default();
    TopologyBootstrapper::new(broker.clone(), topology.clone())
        .bootstrap()
        .await
        .unwrap();
    let service =
        LogIngestionService::with_client(IngestConfig::default(), broker.clone(), &topology);

    let handles: Vec<_> = (0..64)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.ingest(request(i)).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        let receipt = handle.await.unwrap().expect("ingest should succeed");
        assert!(ids.insert(receipt.id));
    }

    let queued = broker.queued("logs.raw");
    assert_eq!(queued.len(), 64);

    // Every message is a complete record whose log id came back in a receipt.
    let published: HashSet<String> = queued
        .iter()
        .map(|m| {
            let record: Value = serde_json::from_slice(&m.payload).expect("complete JSON");
            record["metadata"]["logId"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(published, ids);
}

/// Broker that takes a while to answer and counts calls
#[derive(Default)]
struct SlowBroker {
    inner: InMemoryBroker,
    declarations: AtomicUsize,
}

#[async_trait]
impl BrokerClient for SlowBroker {
    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), BrokerError> {
        self.declarations.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.inner.declare_exchange(spec).await
    }

    async fn declare_queue(&self, spec: &QueueSpec) -> Result<(), BrokerError> {
        self.inner.declare_queue(spec).await
    }

    async fn bind_queue(&self, spec: &BindingSpec) -> Result<(), BrokerError> {
        self.inner.bind_queue(spec).await
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: OutboundMessage,
    ) -> Result<(), BrokerError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.inner.publish(exchange, routing_key, message).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_bootstrap_runs_declarations_once() {
    let broker = Arc::new(SlowBroker::default());
    let status = TopologyStatus::new();
    let bootstrapper = Arc::new(TopologyBootstrapper::with_status(
        broker.clone(),
        TopologyConfig::default(),
        status.clone(),
    ));

    let first = {
        let bootstrapper = bootstrapper.clone();
        tokio::spawn(async move { bootstrapper.bootstrap().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = bootstrapper.bootstrap().await;

    assert_eq!(second, Err(TopologyError::InProgress));
    assert_eq!(first.await.unwrap(), Ok(()));
    assert!(status.is_ready());
    assert_eq!(broker.declarations.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropped_request_does_not_abort_publish() {
    let broker = Arc::new(SlowBroker::default());
    let topology = TopologyConfig::default();
    TopologyBootstrapper::new(broker.clone(), topology.clone())
        .bootstrap()
        .await
        .unwrap();
    let service =
        LogIngestionService::with_client(IngestConfig::default(), broker.clone(), &topology);

    // Give up on the request well before the broker answers.
    let timed_out = tokio::time::timeout(Duration::from_millis(5), service.ingest(request(0))).await;
    assert!(timed_out.is_err());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(broker.inner.queued("logs.raw").len(), 1);
}
