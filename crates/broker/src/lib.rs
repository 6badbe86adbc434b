//! Broker Layer
//!
//! Gets enriched log records onto the message broker and makes sure the
//! broker has somewhere to put them.
//!
//! ## What we do here
//!
//! - **Bootstrap topology** - [`TopologyBootstrapper`] declares the topic
//!   exchange, the dead-letter queue, the primary queue and its binding, once,
//!   at startup.
//! - **Publish** - [`Publisher`] serializes an [`ingest::EnrichedRecord`] to
//!   JSON and sends it to the configured exchange and routing key.
//! - **Abstract the transport** - [`BrokerClient`] is implemented by the AMQP
//!   backend (feature `amqp`, on by default) and by [`InMemoryBroker`].
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use broker::{InMemoryBroker, Publisher, TopologyBootstrapper, TopologyConfig};
//! use ingest::{ingest, IngestConfig, LogEntryRequest};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let broker = Arc::new(InMemoryBroker::new());
//! let topology = TopologyConfig::default();
//!
//! TopologyBootstrapper::new(broker.clone(), topology.clone())
//!     .bootstrap()
//!     .await
//!     .unwrap();
//!
//! let record = ingest(
//!     LogEntryRequest {
//!         level: Some("INFO".into()),
//!         message: Some("Service started".into()),
//!         service: Some("test-service".into()),
//!         ..Default::default()
//!     },
//!     &IngestConfig::default(),
//! )
//! .unwrap();
//!
//! let publisher = Publisher::new(broker.clone(), topology.publish_address());
//! publisher.publish(&record).await.unwrap();
//!
//! assert_eq!(broker.queued("logs.raw").len(), 1);
//! # }
//! ```
mod client;
mod config;
mod error;
mod memory;
mod publisher;
mod topology;

#[cfg(feature = "amqp")]
mod amqp;

pub use crate::client::{
    BindingSpec, BrokerClient, ExchangeKind, ExchangeSpec, OutboundMessage, QueueSpec,
};
pub use crate::config::{
    BackendKind, BrokerConfig, PublishAddress, TopologyConfig, LOGS_DLQ, LOGS_EXCHANGE,
    LOGS_RAW_QUEUE, LOGS_RAW_ROUTING_KEY,
};
pub use crate::error::{BrokerError, ConfigError, PublishError, TopologyError};
pub use crate::memory::{InMemoryBroker, PublishedMessage};
pub use crate::publisher::{Publisher, CONTENT_TYPE_JSON};
pub use crate::topology::{
    declarations, Declaration, TopologyBootstrapper, TopologyState, TopologyStatus,
    DEAD_LETTER_EXCHANGE_ARG, DEAD_LETTER_ROUTING_KEY_ARG,
};

#[cfg(feature = "amqp")]
pub use crate::amqp::AmqpBroker;
