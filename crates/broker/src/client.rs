use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::BrokerError;

/// Exchange routing semantics. Only topic exchanges are used today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
    Topic,
}

impl ExchangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeKind::Topic => "topic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSpec {
    pub name: String,
    pub kind: ExchangeKind,
    pub durable: bool,
    pub auto_delete: bool,
}

impl ExchangeSpec {
    /// A durable, non-auto-delete topic exchange.
    pub fn durable_topic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ExchangeKind::Topic,
            durable: true,
            auto_delete: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec {
    pub name: String,
    pub durable: bool,
    /// String-valued queue arguments such as `x-dead-letter-exchange`.
    pub arguments: BTreeMap<String, String>,
}

impl QueueSpec {
    pub fn durable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: true,
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSpec {
    pub queue: String,
    pub exchange: String,
    pub routing_key: String,
}

/// A message ready to hand to the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub payload: Vec<u8>,
    pub content_type: String,
    pub message_id: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    /// Ask the broker to store the message on disk (delivery mode 2).
    pub persistent: bool,
}

/// Trait for a message broker backend.
///
/// This allows for different transports (AMQP, in-memory). Declarations are
/// idempotent: re-declaring an entity with identical parameters succeeds, and
/// re-declaring it with different parameters fails with
/// [`BrokerError::PreconditionFailed`].
///
/// Implementations are shared across request handlers and must be safe to
/// call concurrently.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), BrokerError>;

    async fn declare_queue(&self, spec: &QueueSpec) -> Result<(), BrokerError>;

    async fn bind_queue(&self, spec: &BindingSpec) -> Result<(), BrokerError>;

    /// Publishes one message. Returns once the broker has accepted it, or
    /// once the bytes are on the wire when confirms are off.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: OutboundMessage,
    ) -> Result<(), BrokerError>;
}
