//! Broker client providers.

mod amqp;

pub use amqp::{LapinBroker, QueueBinding};
