//! Startup declaration of the exchange, queues and binding.
//!
//! ```text
//!  Uninitialized ──bootstrap()──▶ Initializing ──ok──▶ Ready
//!                                      │
//!                                      └──err──▶ Failed (terminal)
//! ```
//!
//! Ready and Failed are both final for the life of the process. The state is
//! held in a [`TopologyStatus`] handle so the readiness probe can observe it
//! without touching the bootstrapper.
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use crate::client::{BindingSpec, BrokerClient, ExchangeSpec, QueueSpec};
use crate::config::TopologyConfig;
use crate::error::TopologyError;

pub const DEAD_LETTER_EXCHANGE_ARG: &str = "x-dead-letter-exchange";
pub const DEAD_LETTER_ROUTING_KEY_ARG: &str = "x-dead-letter-routing-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TopologyState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Failed = 3,
}

impl TopologyState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => TopologyState::Initializing,
            2 => TopologyState::Ready,
            3 => TopologyState::Failed,
            _ => TopologyState::Uninitialized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyState::Uninitialized => "uninitialized",
            TopologyState::Initializing => "initializing",
            TopologyState::Ready => "ready",
            TopologyState::Failed => "failed",
        }
    }
}

impl fmt::Display for TopologyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, cloneable view of the bootstrap state.
#[derive(Debug, Clone, Default)]
pub struct TopologyStatus {
    state: Arc<AtomicU8>,
}

impl TopologyStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TopologyState {
        TopologyState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == TopologyState::Ready
    }

    fn begin(&self) -> Result<(), TopologyState> {
        self.state
            .compare_exchange(
                TopologyState::Uninitialized as u8,
                TopologyState::Initializing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(TopologyState::from_u8)
    }

    fn finish(&self, state: TopologyState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// One entity to declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Exchange(ExchangeSpec),
    Queue(QueueSpec),
    Binding(BindingSpec),
}

impl Declaration {
    /// Human-readable name used in errors and logs.
    pub fn entity(&self) -> String {
        match self {
            Declaration::Exchange(spec) => format!("exchange '{}'", spec.name),
            Declaration::Queue(spec) => format!("queue '{}'", spec.name),
            Declaration::Binding(spec) => format!(
                "binding '{}' -> '{}' ({})",
                spec.exchange, spec.queue, spec.routing_key
            ),
        }
    }
}

/// The declarations for `config`, in the order they must be applied.
///
/// The dead-letter queue comes before the primary queue that points at it,
/// and the binding comes last.
pub fn declarations(config: &TopologyConfig) -> Vec<Declaration> {
    vec![
        Declaration::Exchange(ExchangeSpec::durable_topic(&config.exchange)),
        Declaration::Queue(QueueSpec::durable(&config.dead_letter_queue)),
        Declaration::Queue(
            QueueSpec::durable(&config.queue)
                .with_argument(DEAD_LETTER_EXCHANGE_ARG, &config.dead_letter_exchange)
                .with_argument(DEAD_LETTER_ROUTING_KEY_ARG, &config.dead_letter_routing_key),
        ),
        Declaration::Binding(BindingSpec {
            queue: config.queue.clone(),
            exchange: config.exchange.clone(),
            routing_key: config.routing_key.clone(),
        }),
    ]
}

pub struct TopologyBootstrapper {
    client: Arc<dyn BrokerClient>,
    config: TopologyConfig,
    status: TopologyStatus,
}

impl TopologyBootstrapper {
    pub fn new(client: Arc<dyn BrokerClient>, config: TopologyConfig) -> Self {
        Self::with_status(client, config, TopologyStatus::new())
    }

    /// Uses an existing status handle, e.g. one already held by the server.
    pub fn with_status(
        client: Arc<dyn BrokerClient>,
        config: TopologyConfig,
        status: TopologyStatus,
    ) -> Self {
        Self {
            client,
            config,
            status,
        }
    }

    pub fn state(&self) -> TopologyState {
        self.status.state()
    }

    pub fn status(&self) -> TopologyStatus {
        self.status.clone()
    }

    /// Declares the topology.
    ///
    /// A no-op once Ready. Fails with [`TopologyError::Failed`] once Failed and
    /// with [`TopologyError::InProgress`] while another call is running.
    pub async fn bootstrap(&self) -> Result<(), TopologyError> {
        match self.status.begin() {
            Ok(()) => {}
            Err(TopologyState::Ready) => return Ok(()),
            Err(TopologyState::Failed) => return Err(TopologyError::Failed),
            Err(_) => return Err(TopologyError::InProgress),
        }

        for declaration in declarations(&self.config) {
            let outcome = match &declaration {
                Declaration::Exchange(spec) => self.client.declare_exchange(spec).await,
                Declaration::Queue(spec) => self.client.declare_queue(spec).await,
                Declaration::Binding(spec) => self.client.bind_queue(spec).await,
            };
            if let Err(source) = outcome {
                let entity = declaration.entity();
                error!(%entity, error = %source, "topology_declaration_failed");
                self.status.finish(TopologyState::Failed);
                return Err(TopologyError::Declaration { entity, source });
            }
        }

        self.status.finish(TopologyState::Ready);
        info!(
            exchange = %self.config.exchange,
            queue = %self.config.queue,
            dead_letter_queue = %self.config.dead_letter_queue,
            "topology_ready"
        );
        Ok(())
    }
}
