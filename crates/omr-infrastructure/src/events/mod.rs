//! In-process domain event bus.

mod broadcast;

pub use broadcast::BroadcastEventBus;
