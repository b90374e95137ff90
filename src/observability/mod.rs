//! Observability infrastructure.
//!
//! Provides:
//! - Prometheus counter families for sink outcomes
//! - Structured tracing setup

pub mod metrics;
pub mod tracing;
