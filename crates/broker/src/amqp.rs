//! AMQP 0-9-1 backend built on `lapin`.
use std::sync::RwLock;

use async_trait::async_trait;
use lapin::options::{
    BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::protocol::{AMQPErrorKind, AMQPSoftError};
use lapin::publisher_confirm::Confirmation;
use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::{debug, info, warn};

use crate::client::{BindingSpec, BrokerClient, ExchangeKind, ExchangeSpec, OutboundMessage, QueueSpec};
use crate::config::BrokerConfig;
use crate::error::BrokerError;

/// A broker reached over a single AMQP connection.
///
/// One channel is shared by all callers. If the broker closes it (after a
/// channel-level error, for example) a fresh one is opened on next use.
pub struct AmqpBroker {
    connection: Connection,
    channel: RwLock<Channel>,
    publisher_confirms: bool,
}

impl AmqpBroker {
    pub async fn connect(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let properties = ConnectionProperties::default()
            .with_connection_name(LongString::from(config.connection_name.clone()));
        let connection = Connection::connect(&config.uri, properties)
            .await
            .map_err(BrokerError::connection)?;
        let channel = open_channel(&connection, config.publisher_confirms).await?;

        info!(
            connection_name = %config.connection_name,
            publisher_confirms = config.publisher_confirms,
            "amqp_connected"
        );

        Ok(Self {
            connection,
            channel: RwLock::new(channel),
            publisher_confirms: config.publisher_confirms,
        })
    }

    async fn channel(&self) -> Result<Channel, BrokerError> {
        let current = self
            .channel
            .read()
            .map_err(|_| BrokerError::Channel("poisoned lock".into()))?
            .clone();
        if current.status().connected() {
            return Ok(current);
        }

        warn!(channel_id = current.id(), "amqp_channel_reopen");
        let fresh = open_channel(&self.connection, self.publisher_confirms).await?;
        *self
            .channel
            .write()
            .map_err(|_| BrokerError::Channel("poisoned lock".into()))? = fresh.clone();
        Ok(fresh)
    }
}

async fn open_channel(connection: &Connection, confirms: bool) -> Result<Channel, BrokerError> {
    let channel = connection
        .create_channel()
        .await
        .map_err(BrokerError::connection)?;
    if confirms {
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(BrokerError::channel)?;
    }
    Ok(channel)
}

fn classify(err: lapin::Error) -> BrokerError {
    match &err {
        lapin::Error::ProtocolError(amqp) => match amqp.kind() {
            AMQPErrorKind::Soft(AMQPSoftError::PRECONDITIONFAILED) => {
                BrokerError::PreconditionFailed(amqp.to_string())
            }
            AMQPErrorKind::Soft(AMQPSoftError::NOTFOUND) => {
                BrokerError::NotFound(amqp.to_string())
            }
            _ => BrokerError::channel(err),
        },
        lapin::Error::IOError(_) | lapin::Error::InvalidConnectionState(_) => {
            BrokerError::connection(err)
        }
        _ => BrokerError::channel(err),
    }
}

fn exchange_kind(kind: ExchangeKind) -> lapin::ExchangeKind {
    match kind {
        ExchangeKind::Topic => lapin::ExchangeKind::Topic,
    }
}

fn field_table(arguments: &std::collections::BTreeMap<String, String>) -> FieldTable {
    let mut table = FieldTable::default();
    for (key, value) in arguments {
        table.insert(
            ShortString::from(key.clone()),
            AMQPValue::LongString(LongString::from(value.clone())),
        );
    }
    table
}

#[async_trait]
impl BrokerClient for AmqpBroker {
    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), BrokerError> {
        let options = ExchangeDeclareOptions {
            durable: spec.durable,
            auto_delete: spec.auto_delete,
            ..Default::default()
        };
        self.channel()
            .await?
            .exchange_declare(
                &spec.name,
                exchange_kind(spec.kind),
                options,
                FieldTable::default(),
            )
            .await
            .map_err(classify)?;
        debug!(exchange = %spec.name, kind = spec.kind.as_str(), "exchange_declared");
        Ok(())
    }

    async fn declare_queue(&self, spec: &QueueSpec) -> Result<(), BrokerError> {
        let options = QueueDeclareOptions {
            durable: spec.durable,
            ..Default::default()
        };
        self.channel()
            .await?
            .queue_declare(&spec.name, options, field_table(&spec.arguments))
            .await
            .map_err(classify)?;
        debug!(queue = %spec.name, "queue_declared");
        Ok(())
    }

    async fn bind_queue(&self, spec: &BindingSpec) -> Result<(), BrokerError> {
        self.channel()
            .await?
            .queue_bind(
                &spec.queue,
                &spec.exchange,
                &spec.routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(classify)?;
        debug!(
            queue = %spec.queue,
            exchange = %spec.exchange,
            routing_key = %spec.routing_key,
            "queue_bound"
        );
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: OutboundMessage,
    ) -> Result<(), BrokerError> {
        let mut properties = BasicProperties::default()
            .with_content_type(ShortString::from(message.content_type))
            .with_message_id(ShortString::from(message.message_id))
            .with_timestamp(message.timestamp);
        if message.persistent {
            properties = properties.with_delivery_mode(2);
        }

        let confirm = self
            .channel()
            .await?
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                &message.payload,
                properties,
            )
            .await
            .map_err(classify)?;

        match confirm.await.map_err(classify)? {
            Confirmation::Nack(_) => Err(BrokerError::Nacked),
            Confirmation::Ack(_) | Confirmation::NotRequested => Ok(()),
        }
    }
}
