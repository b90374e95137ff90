//! Error types for sinks and their instrumentation.

use std::sync::Arc;
use thiserror::Error;

use crate::context::{Context, ContextError};

/// Result type alias for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Shared, type-erased backend failure.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by sinks.
///
/// Backend failures are kept behind an `Arc` so the exact value a backend produced
/// can be handed back to the caller and compared by identity.
#[derive(Error, Debug, Clone)]
pub enum SinkError {
    /// The session's context ended
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The backend failed
    #[error(transparent)]
    Backend(BoxError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Metrics error
    #[error("metrics error: {0}")]
    Metrics(String),
}

impl SinkError {
    /// Wrap a backend failure.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SinkError::Backend(Arc::new(err))
    }

    /// The context cause carried by this error, if it is a context error.
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            SinkError::Context(cause) => Some(*cause),
            _ => None,
        }
    }

    /// Whether this error is a cancellation or deadline error.
    pub fn is_context(&self) -> bool {
        self.context_error().is_some()
    }

    /// Whether this error is exactly the cause `ctx` ended with.
    ///
    /// A context error from some other context (for example a backend's own
    /// shutdown context) does not match while `ctx` is still live.
    pub fn is_caused_by(&self, ctx: &Context) -> bool {
        match self.context_error() {
            Some(cause) => ctx.err() == Some(cause),
            None => false,
        }
    }
}

impl PartialEq for SinkError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SinkError::Context(a), SinkError::Context(b)) => a == b,
            (SinkError::Backend(a), SinkError::Backend(b)) => Arc::ptr_eq(a, b),
            (SinkError::Config(a), SinkError::Config(b)) => a == b,
            (SinkError::Metrics(a), SinkError::Metrics(b)) => a == b,
            _ => false,
        }
    }
}

impl From<prometheus::Error> for SinkError {
    fn from(err: prometheus::Error) -> Self {
        SinkError::Metrics(err.to_string())
    }
}
