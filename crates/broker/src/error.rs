//! Error types for the broker crate.
//!
//! [`BrokerError`] is what a [`BrokerClient`](crate::BrokerClient) reports;
//! client libraries' own error types are converted into it at the backend
//! boundary and never leak further. [`PublishError`] and [`TopologyError`]
//! wrap it for the two operations the rest of the system performs.
use thiserror::Error;

/// Transport-level failure reported by a broker backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BrokerError {
    /// The broker could not be reached or the connection dropped.
    #[error("connection error: {0}")]
    Connection(String),

    /// The channel was closed or an operation on it failed.
    #[error("channel error: {0}")]
    Channel(String),

    /// An entity already exists with different parameters.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The target exchange does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The broker negatively acknowledged a published message.
    #[error("message rejected by broker")]
    Nacked,
}

impl BrokerError {
    pub fn connection<E: std::fmt::Display>(err: E) -> Self {
        Self::Connection(err.to_string())
    }

    pub fn channel<E: std::fmt::Display>(err: E) -> Self {
        Self::Channel(err.to_string())
    }
}

/// A record could not be handed to the broker.
///
/// Display text carries no cause detail. The cause is available through
/// [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize log record")]
    Serialization(#[source] serde_json::Error),

    #[error("failed to publish log to message queue")]
    Transport(#[source] BrokerError),
}

/// Topology declaration failed at startup. Always fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("failed to declare {entity}")]
    Declaration {
        entity: String,
        #[source]
        source: BrokerError,
    },

    /// A previous bootstrap failed; the process has to be restarted.
    #[error("topology initialization previously failed")]
    Failed,

    /// Another bootstrap is running.
    #[error("topology initialization already in progress")]
    InProgress,
}

/// Invalid broker or topology configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("topology.{field} must not be empty")]
    EmptyName { field: &'static str },

    #[error("broker.uri must start with amqp:// or amqps://, got {0:?}")]
    InvalidUri(String),

    #[error("amqp backend disabled at compile time")]
    BackendDisabled,
}
