//! Execution context carried through a publish session.
//!
//! A [`Context`] is done once it is cancelled through its [`CancelHandle`], once its
//! deadline passes, or once its parent is done. The first cause is recorded and
//! never changes afterwards, so callers can compare an error against it.

use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context ended.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextError {
    /// The context was cancelled explicitly.
    #[error("context canceled")]
    Cancelled,

    /// The context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellable, optionally deadline-bearing execution context.
///
/// Cloning is cheap; clones observe the same state.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<ContextState>,
}

#[derive(Debug)]
struct ContextState {
    token: CancellationToken,
    cause: OnceLock<ContextError>,
    /// Earliest of this context's own deadline and its parent's.
    deadline: Option<Instant>,
    parent: Option<Context>,
}

impl Context {
    /// A root context that is never done.
    #[must_use]
    pub fn background() -> Self {
        Self {
            inner: Arc::new(ContextState {
                token: CancellationToken::new(),
                cause: OnceLock::new(),
                deadline: None,
                parent: None,
            }),
        }
    }

    /// Derive a child context that ends when `handle.cancel()` is called or when
    /// this context ends.
    #[must_use]
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        self.child(self.inner.deadline)
    }

    /// Derive a child context that also ends after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> (Context, CancelHandle) {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context that also ends at `deadline`.
    ///
    /// A parent deadline that is earlier still applies.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> (Context, CancelHandle) {
        let deadline = match self.inner.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        self.child(Some(deadline))
    }

    fn child(&self, deadline: Option<Instant>) -> (Context, CancelHandle) {
        let ctx = Context {
            inner: Arc::new(ContextState {
                token: self.inner.token.child_token(),
                cause: OnceLock::new(),
                deadline,
                parent: Some(self.clone()),
            }),
        };
        let handle = CancelHandle { ctx: ctx.clone() };
        (ctx, handle)
    }

    /// The instant at which this context ends on its own, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// `None` while the context is live, otherwise the cause it ended with.
    pub fn err(&self) -> Option<ContextError> {
        if let Some(cause) = self.inner.cause.get() {
            return Some(*cause);
        }
        if let Some(cause) = self.inner.parent.as_ref().and_then(Context::err) {
            return Some(self.finish(cause));
        }
        if self
            .inner
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Some(self.finish(ContextError::DeadlineExceeded));
        }
        None
    }

    /// Whether the context has ended.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Wait until the context ends.
    pub async fn done(&self) {
        match self.inner.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.inner.token.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.inner.token.cancelled().await,
        }
        // Records the cause and cancels the token for any other waiters.
        let _ = self.err();
    }

    /// Record `cause` unless one is already set, then wake every waiter.
    fn finish(&self, cause: ContextError) -> ContextError {
        let cause = *self.inner.cause.get_or_init(|| cause);
        self.inner.token.cancel();
        cause
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

/// Ends the context it was created with.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    ctx: Context,
}

impl CancelHandle {
    /// Cancel the context. Calling this again, or after the deadline, is a no-op.
    pub fn cancel(&self) {
        self.ctx.finish(ContextError::Cancelled);
    }
}
