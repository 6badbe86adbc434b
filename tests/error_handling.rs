use std::error::Error;
use std::sync::Arc;

use logingest::{
    BrokerError, IngestConfig, InMemoryBroker, LogEntryRequest, LogIngestionService,
    PipelineError, PublishError, TopologyBootstrapper, TopologyConfig, TopologyError,
    TopologyState,
};

fn valid_request() -> LogEntryRequest {
    LogEntryRequest {
        level: Some("ERROR".into()),
        message: Some("Database connection failed".into()),
        service: Some("user-service".into()),
        ..Default::default()
    }
}

async fn bootstrapped() -> Arc<InMemoryBroker> {
    let broker = Arc::new(InMemoryBroker::new());
    TopologyBootstrapper::new(broker.clone(), TopologyConfig::default())
        .bootstrap()
        .await
        .expect("bootstrap should succeed");
    broker
}

#[tokio::test]
async fn transport_error_becomes_ingestion_failure() {
    let broker = bootstrapped().await;
    broker.fail_publishes(true);
    let service = LogIngestionService::with_client(
        IngestConfig::default(),
        broker.clone(),
        &TopologyConfig::default(),
    );

    let result = service.ingest(valid_request()).await;

    let Err(PipelineError::Publish(err)) = result else {
        panic!("expected publish failure");
    };
    assert!(matches!(
        err,
        PublishError::Transport(BrokerError::Connection(_))
    ));
    assert!(broker.published().is_empty());
}

#[tokio::test]
async fn publish_failure_keeps_cause_chain() {
    let broker = bootstrapped().await;
    broker.nack_publishes(true);
    let service = LogIngestionService::with_client(
        IngestConfig::default(),
        broker,
        &TopologyConfig::default(),
    );

    let err = service.ingest(valid_request()).await.unwrap_err();

    let publish = err.source().expect("pipeline error has a source");
    assert_eq!(
        publish.to_string(),
        "failed to publish log to message queue"
    );
    let transport = publish.source().expect("publish error has a source");
    assert_eq!(transport.to_string(), "message rejected by broker");
}

#[tokio::test]
async fn publishing_to_undeclared_exchange_fails() {
    let broker = Arc::new(InMemoryBroker::new());
    let service = LogIngestionService::with_client(
        IngestConfig::default(),
        broker,
        &TopologyConfig::default(),
    );

    let err = service.ingest(valid_request()).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Publish(PublishError::Transport(BrokerError::NotFound(_)))
    ));
}

#[tokio::test]
async fn validation_failure_is_not_an_ingestion_failure() {
    let broker = bootstrapped().await;
    broker.fail_publishes(true);
    let service = LogIngestionService::with_client(
        IngestConfig::default(),
        broker,
        &TopologyConfig::default(),
    );

    let err = service
        .ingest(LogEntryRequest {
            level: Some("CRITICAL".into()),
            ..valid_request()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Validation(_)));
    assert!(err.to_string().starts_with("validation failure"));
}

#[tokio::test]
async fn unreachable_broker_fails_bootstrap() {
    let broker = Arc::new(InMemoryBroker::new());
    broker.fail_declarations(true);
    let bootstrapper = TopologyBootstrapper::new(broker, TopologyConfig::default());

    let err = bootstrapper.bootstrap().await.unwrap_err();

    assert!(matches!(err, TopologyError::Declaration { .. }));
    assert_eq!(bootstrapper.state(), TopologyState::Failed);
    assert_eq!(bootstrapper.bootstrap().await, Err(TopologyError::Failed));
}

#[tokio::test]
async fn conflicting_topology_fails_bootstrap() {
    let broker = bootstrapped().await;
    let conflicting = TopologyConfig {
        dead_letter_routing_key: "logs.other-dlq".into(),
        ..Default::default()
    };

    let err = TopologyBootstrapper::new(broker.clone(), conflicting)
        .bootstrap()
        .await
        .unwrap_err();

    let TopologyError::Declaration { entity, source } = err else {
        panic!("expected declaration failure");
    };
    assert_eq!(entity, "queue 'logs.raw'");
    assert!(matches!(source, BrokerError::PreconditionFailed(_)));
}

#[tokio::test]
async fn second_bootstrap_against_same_broker_is_idempotent() {
    let broker = bootstrapped().await;

    TopologyBootstrapper::new(broker.clone(), TopologyConfig::default())
        .bootstrap()
        .await
        .expect("re-declaring identical topology should succeed");

    assert_eq!(broker.bindings().len(), 1);
    assert!(broker.queue("logs.dlq").is_some());
}
