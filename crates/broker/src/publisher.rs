use std::sync::Arc;
use std::time::Instant;

use ingest::EnrichedRecord;
use tracing::{debug, warn};

use crate::client::{BrokerClient, OutboundMessage};
use crate::config::PublishAddress;
use crate::error::PublishError;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Sends enriched records to the configured exchange.
///
/// Cheap to clone; clones share the underlying client. There is no retry:
/// a failed publish is reported once and the caller decides what to do.
#[derive(Clone)]
pub struct Publisher {
    client: Arc<dyn BrokerClient>,
    address: PublishAddress,
}

impl Publisher {
    pub fn new(client: Arc<dyn BrokerClient>, address: PublishAddress) -> Self {
        Self { client, address }
    }

    pub async fn publish(&self, record: &EnrichedRecord) -> Result<(), PublishError> {
        let start = Instant::now();
        let log_id = record.log_id();

        let payload = serde_json::to_vec(record).map_err(PublishError::Serialization)?;
        let message = OutboundMessage {
            payload,
            content_type: CONTENT_TYPE_JSON.into(),
            message_id: log_id.to_string(),
            timestamp: u64::try_from(record.timestamp.timestamp()).unwrap_or(0),
            persistent: true,
        };

        match self
            .client
            .publish(&self.address.exchange, &self.address.routing_key, message)
            .await
        {
            Ok(()) => {
                debug!(
                    %log_id,
                    exchange = %self.address.exchange,
                    routing_key = %self.address.routing_key,
                    elapsed_micros = start.elapsed().as_micros(),
                    "publish_success"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    %log_id,
                    exchange = %self.address.exchange,
                    error = %err,
                    "publish_failure"
                );
                Err(PublishError::Transport(err))
            }
        }
    }
}
