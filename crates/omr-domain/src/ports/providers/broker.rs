//! Broker client port.
//!
//! Thin contract over an AMQP-style broker: one durable direct exchange,
//! declared queues bound by routing key, priority publish, and a consumer
//! loop with manual acknowledgement.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Processes one delivered message body.
///
/// Handlers must be reentrant: delivery is at-least-once and messages may
/// be redelivered after a crash. Returning `Ok` acks the message;
/// returning `Err` nacks it without requeue (the `failed` result envelope
/// is the durable record).
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, body: &[u8]) -> Result<()>;
}

/// Publish/consume contract over the broker.
#[async_trait]
pub trait BrokerProvider: Send + Sync {
    /// Publish a UTF-8 JSON body to the exchange under `routing_key` with
    /// the given message priority (0..=9). Fire-and-forget: no publisher
    /// confirm is awaited.
    async fn publish(&self, routing_key: &str, body: Vec<u8>, priority: u8) -> Result<()>;

    /// Run a consumer loop on `queue`, invoking `handler` for each
    /// delivery (prefetch 1, serial per queue). Returns when the
    /// underlying channel closes.
    async fn consume(&self, queue: &str, handler: Arc<dyn MessageHandler>) -> Result<()>;
}
