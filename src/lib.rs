//! Sluice instrumentation: Prometheus counters for asynchronous message sinks.
//!
//! Wraps any [`AsyncMessageSink`] so every acknowledged message and every failed
//! publish session is counted per topic, without touching the messages and without
//! counting caller-initiated shutdowns as failures.
//!
//! # Architecture
//!
//! - **Transparent**: [`InstrumentedSink`] implements the same trait it wraps
//! - **Observed acks**: acknowledgements pass through a relay that counts them in order
//! - **Precise classification**: only errors that are not the caller context's own
//!   cancellation cause are counted as failures
//!
//! # Modules
//!
//! - [`config`]: Topic and counter configuration (CLI, environment, files)
//! - [`context`]: Cancellable, deadline-bearing execution context
//! - [`error`]: Sink error types
//! - [`message`]: Opaque message payload
//! - [`observability`]: Counter families and tracing setup
//! - [`sink`]: The sink trait and its instrumented decorator

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // sink::InstrumentedSink is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod observability;
pub mod sink;

pub use config::{CounterConfig, SinkConfig};
pub use context::{CancelHandle, Context, ContextError};
pub use error::{Result, SinkError};
pub use message::Message;
pub use sink::{AsyncMessageSink, InstrumentedSink, Status};
