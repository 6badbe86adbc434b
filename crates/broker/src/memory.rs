//! Process-local broker.
//!
//! Behaves like a single-node broker for the operations the pipeline uses:
//! declarations are idempotent and checked for parameter conflicts, bindings
//! route by topic pattern, and messages land in per-queue buffers that tests
//! can inspect. Failure switches let tests drive the error paths.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::client::{BindingSpec, BrokerClient, ExchangeSpec, OutboundMessage, QueueSpec};
use crate::error::BrokerError;

/// A message as recorded by [`InMemoryBroker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub message: OutboundMessage,
}

#[derive(Default)]
struct State {
    exchanges: HashMap<String, ExchangeSpec>,
    queues: HashMap<String, QueueSpec>,
    bindings: Vec<BindingSpec>,
    published: Vec<PublishedMessage>,
    delivered: HashMap<String, Vec<OutboundMessage>>,
}

/// An in-memory broker using a `RwLock` around its topology and buffers.
#[derive(Default)]
pub struct InMemoryBroker {
    state: RwLock<State>,
    fail_declarations: AtomicBool,
    fail_publishes: AtomicBool,
    nack_publishes: AtomicBool,
    declarations: AtomicUsize,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent declaration fail with a connection error.
    pub fn fail_declarations(&self, fail: bool) {
        self.fail_declarations.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent publish fail with a connection error.
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent publish come back as a broker nack.
    pub fn nack_publishes(&self, nack: bool) {
        self.nack_publishes.store(nack, Ordering::SeqCst);
    }

    /// Number of declare/bind calls received, successful or not.
    pub fn declaration_calls(&self) -> usize {
        self.declarations.load(Ordering::SeqCst)
    }

    pub fn exchange(&self, name: &str) -> Option<ExchangeSpec> {
        self.read().ok()?.exchanges.get(name).cloned()
    }

    pub fn queue(&self, name: &str) -> Option<QueueSpec> {
        self.read().ok()?.queues.get(name).cloned()
    }

    pub fn bindings(&self) -> Vec<BindingSpec> {
        self.read().map(|s| s.bindings.clone()).unwrap_or_default()
    }

    /// Every accepted publish, in arrival order.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.read().map(|s| s.published.clone()).unwrap_or_default()
    }

    /// Messages routed into `queue`, in arrival order.
    pub fn queued(&self, queue: &str) -> Vec<OutboundMessage> {
        self.read()
            .ok()
            .and_then(|s| s.delivered.get(queue).cloned())
            .unwrap_or_default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, BrokerError> {
        self.state
            .read()
            .map_err(|_| BrokerError::Channel("poisoned lock".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, BrokerError> {
        self.state
            .write()
            .map_err(|_| BrokerError::Channel("poisoned lock".into()))
    }

    fn begin_declaration(&self) -> Result<(), BrokerError> {
        self.declarations.fetch_add(1, Ordering::SeqCst);
        if self.fail_declarations.load(Ordering::SeqCst) {
            return Err(BrokerError::Connection("broker unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerClient for InMemoryBroker {
    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), BrokerError> {
        self.begin_declaration()?;
        let mut state = self.write()?;
        match state.exchanges.get(&spec.name) {
            Some(existing) if existing != spec => Err(BrokerError::PreconditionFailed(format!(
                "exchange '{}' exists with different parameters",
                spec.name
            ))),
            Some(_) => Ok(()),
            None => {
                state.exchanges.insert(spec.name.clone(), spec.clone());
                Ok(())
            }
        }
    }

    async fn declare_queue(&self, spec: &QueueSpec) -> Result<(), BrokerError> {
        self.begin_declaration()?;
        let mut state = self.write()?;
        match state.queues.get(&spec.name) {
            Some(existing) if existing != spec => Err(BrokerError::PreconditionFailed(format!(
                "queue '{}' exists with different parameters",
                spec.name
            ))),
            Some(_) => Ok(()),
            None => {
                state.queues.insert(spec.name.clone(), spec.clone());
                Ok(())
            }
        }
    }

    async fn bind_queue(&self, spec: &BindingSpec) -> Result<(), BrokerError> {
        self.begin_declaration()?;
        let mut state = self.write()?;
        if !state.queues.contains_key(&spec.queue) {
            return Err(BrokerError::NotFound(format!("queue '{}'", spec.queue)));
        }
        if !state.exchanges.contains_key(&spec.exchange) {
            return Err(BrokerError::NotFound(format!("exchange '{}'", spec.exchange)));
        }
        if !state.bindings.contains(spec) {
            state.bindings.push(spec.clone());
        }
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: OutboundMessage,
    ) -> Result<(), BrokerError> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(BrokerError::Connection("broker unreachable".into()));
        }
        if self.nack_publishes.load(Ordering::SeqCst) {
            return Err(BrokerError::Nacked);
        }

        let mut state = self.write()?;
        let targets: Vec<String> = if exchange.is_empty() {
            // Default exchange: deliver straight to the queue named by the key.
            state
                .queues
                .contains_key(routing_key)
                .then(|| routing_key.to_string())
                .into_iter()
                .collect()
        } else {
            if !state.exchanges.contains_key(exchange) {
                return Err(BrokerError::NotFound(format!("exchange '{exchange}'")));
            }
            state
                .bindings
                .iter()
                .filter(|b| b.exchange == exchange && topic_matches(&b.routing_key, routing_key))
                .map(|b| b.queue.clone())
                .collect()
        };

        for queue in targets {
            state
                .delivered
                .entry(queue)
                .or_default()
                .push(message.clone());
        }
        state.published.push(PublishedMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            message,
        });
        Ok(())
    }
}

/// AMQP topic matching: `*` matches one word, `#` matches zero or more.
fn topic_matches(pattern: &str, key: &str) -> bool {
    fn matches(pattern: &[&str], key: &[&str]) -> bool {
        match (pattern.first(), key.first()) {
            (None, None) => true,
            (Some(&"#"), _) => {
                matches(&pattern[1..], key) || (!key.is_empty() && matches(pattern, &key[1..]))
            }
            (Some(&"*"), Some(_)) => matches(&pattern[1..], &key[1..]),
            (Some(p), Some(k)) if p == k => matches(&pattern[1..], &key[1..]),
            _ => false,
        }
    }
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = key.split('.').collect();
    matches(&pattern, &key)
}
