//! AMQP broker client over lapin.
//!
//! One durable direct exchange, durable priority queues bound by routing
//! key, publishes with per-message priority and persistent delivery, and a
//! manual-ack consumer loop (prefetch 1). Connection establishment retries
//! with exponential backoff and then fails fatally; the supervisor
//! restarts the process.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};

use omr_domain::constants::queues::{
    EXCHANGE_NAME, HEARTBEAT_SECS, MAX_QUEUE_PRIORITY, RECONNECT_BACKOFF_FACTOR,
    RECONNECT_INITIAL_DELAY_SECS, RECONNECT_MAX_ATTEMPTS,
};
use omr_domain::error::{Error, Result};
use omr_domain::ports::{BrokerProvider, MessageHandler};

/// One queue and the routing key binding it to the exchange.
#[derive(Debug, Clone)]
pub struct QueueBinding {
    pub queue: String,
    pub routing_key: String,
}

/// Lapin-backed [`BrokerProvider`].
pub struct LapinBroker {
    connection: Connection,
    publish_channel: Channel,
}

fn with_heartbeat(url: &str) -> String {
    if url.contains('?') {
        url.to_owned()
    } else {
        format!("{url}?heartbeat={HEARTBEAT_SECS}")
    }
}

impl LapinBroker {
    /// Connect with exponential backoff, declare the exchange and every
    /// queue binding, and set per-channel prefetch 1.
    pub async fn connect(url: &str, bindings: &[QueueBinding]) -> Result<Self> {
        let url = with_heartbeat(url);
        let mut delay = Duration::from_secs(RECONNECT_INITIAL_DELAY_SECS);
        let mut last_error: Option<lapin::Error> = None;

        for attempt in 1..=RECONNECT_MAX_ATTEMPTS {
            omr_domain::info!(
                "broker",
                "Connecting to broker",
                &format!("attempt {attempt}/{RECONNECT_MAX_ATTEMPTS}")
            );
            match Connection::connect(&url, ConnectionProperties::default()).await {
                Ok(connection) => {
                    let broker = Self::setup(connection, bindings).await?;
                    omr_domain::info!("broker", "Connected to broker");
                    return Ok(broker);
                }
                Err(e) => {
                    omr_domain::warn!(
                        "broker",
                        "Broker connection failed",
                        &format!("attempt {attempt}: {e}")
                    );
                    last_error = Some(e);
                    if attempt < RECONNECT_MAX_ATTEMPTS {
                        tokio::time::sleep(delay).await;
                        delay *= RECONNECT_BACKOFF_FACTOR;
                    }
                }
            }
        }

        match last_error {
            Some(e) => Err(Error::broker_with_source(
                format!("broker unreachable after {RECONNECT_MAX_ATTEMPTS} attempts"),
                e,
            )),
            None => Err(Error::broker("broker unreachable")),
        }
    }

    async fn setup(connection: Connection, bindings: &[QueueBinding]) -> Result<Self> {
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| Error::broker_with_source("could not open channel", e))?;
        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .map_err(|e| Error::broker_with_source("could not set prefetch", e))?;
        channel
            .exchange_declare(
                EXCHANGE_NAME,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| Error::broker_with_source("could not declare exchange", e))?;

        let mut arguments = FieldTable::default();
        arguments.insert(
            ShortString::from("x-max-priority"),
            AMQPValue::ShortShortUInt(MAX_QUEUE_PRIORITY),
        );
        for binding in bindings {
            channel
                .queue_declare(
                    &binding.queue,
                    QueueDeclareOptions {
                        durable: true,
                        ..Default::default()
                    },
                    arguments.clone(),
                )
                .await
                .map_err(|e| {
                    Error::broker_with_source(
                        format!("could not declare queue {}", binding.queue),
                        e,
                    )
                })?;
            channel
                .queue_bind(
                    &binding.queue,
                    EXCHANGE_NAME,
                    &binding.routing_key,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await
                .map_err(|e| {
                    Error::broker_with_source(format!("could not bind queue {}", binding.queue), e)
                })?;
            omr_domain::debug!("broker", "Queue declared", &binding.queue);
        }

        Ok(Self {
            connection,
            publish_channel: channel,
        })
    }
}

#[async_trait]
impl BrokerProvider for LapinBroker {
    async fn publish(&self, routing_key: &str, body: Vec<u8>, priority: u8) -> Result<()> {
        let properties = BasicProperties::default()
            .with_content_type(ShortString::from("application/json"))
            .with_delivery_mode(2)
            .with_priority(priority);
        // Fire-and-forget: the publisher confirm is not awaited.
        self.publish_channel
            .basic_publish(
                EXCHANGE_NAME,
                routing_key,
                BasicPublishOptions::default(),
                &body,
                properties,
            )
            .await
            .map_err(|e| {
                Error::broker_with_source(format!("publish to {routing_key} failed"), e)
            })?;
        Ok(())
    }

    async fn consume(&self, queue: &str, handler: Arc<dyn MessageHandler>) -> Result<()> {
        // A dedicated channel per consumer keeps prefetch 1 per queue.
        let channel = self
            .connection
            .create_channel()
            .await
            .map_err(|e| Error::broker_with_source("could not open consumer channel", e))?;
        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .map_err(|e| Error::broker_with_source("could not set prefetch", e))?;

        let mut consumer = channel
            .basic_consume(
                queue,
                &format!("omr-{queue}"),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| Error::broker_with_source(format!("could not consume {queue}"), e))?;

        omr_domain::info!("broker", "Consuming", &queue);

        while let Some(delivery) = consumer.next().await {
            let delivery = delivery
                .map_err(|e| Error::broker_with_source("delivery stream failed", e))?;
            match handler.handle(&delivery.data).await {
                Ok(()) => {
                    delivery
                        .ack(BasicAckOptions::default())
                        .await
                        .map_err(|e| Error::broker_with_source("ack failed", e))?;
                }
                Err(e) => {
                    omr_domain::error!(
                        "broker",
                        "Handler failed, dropping message",
                        &format!("{queue}: {e}")
                    );
                    // Poison-pill pattern: the failed result envelope is
                    // the durable record, so never requeue.
                    delivery
                        .nack(BasicNackOptions {
                            requeue: false,
                            ..Default::default()
                        })
                        .await
                        .map_err(|e| Error::broker_with_source("nack failed", e))?;
                }
            }
        }

        Err(Error::broker(format!("consumer stream for {queue} closed")))
    }
}
