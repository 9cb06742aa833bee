//! Event bus port.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;
use crate::events::DomainEvent;

/// Stream of domain events handed to subscribers.
pub type DomainEventStream = Pin<Box<dyn Stream<Item = DomainEvent> + Send>>;

/// In-process publish/subscribe for [`DomainEvent`]s.
#[async_trait]
pub trait EventBusProvider: Send + Sync {
    /// Publish an event. Never fails the caller's operation: losing an
    /// observability event must not fail a job.
    async fn publish_event(&self, event: DomainEvent) -> Result<()>;

    /// Subscribe to all events from this point on.
    async fn subscribe_events(&self) -> Result<DomainEventStream>;

    /// Returns `true` if anyone is currently subscribed.
    fn has_subscribers(&self) -> bool;
}
