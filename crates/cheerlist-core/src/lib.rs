//! Core types: upcoming events, tracing setup

pub mod event;
pub mod tracing;

pub use event::{DEFAULT_TITLE, EventStart, UpcomingEvent};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
