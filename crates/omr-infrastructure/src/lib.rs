//! Infrastructure layer of the OMR marking pipeline.
//!
//! Configuration loading, the tracing-backed logger behind the domain log
//! facade, the in-process event bus, and the composition root that wires
//! providers into the application services.

pub mod bootstrap;
pub mod config;
pub mod events;
pub mod logging;
