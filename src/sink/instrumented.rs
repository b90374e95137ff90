//! Prometheus instrumentation for any [`AsyncMessageSink`].
//!
//! [`InstrumentedSink`] hands the wrapped sink a private acknowledgement channel and
//! relays every acknowledgement to the caller, counting it on the way. When the
//! wrapped sink returns, the outcome is classified:
//!
//! - `Ok(())`: clean stop, nothing recorded
//! - the caller context's own cause: caller-driven shutdown, nothing recorded
//! - anything else: one `error` sample for the topic
//!
//! The outcome is always returned unchanged. The relay runs inside the call: when
//! `publish_messages` returns, the counters for the session are final and the
//! caller's ack sender has been dropped.

use async_trait::async_trait;
use prometheus::{IntCounter, IntCounterVec};
use tokio::sync::mpsc;

use super::{AsyncMessageSink, Status};
use crate::config::SinkConfig;
use crate::context::Context;
use crate::error::Result;
use crate::message::Message;
use crate::observability::metrics::{sink_counter, STATUS_ERROR, STATUS_SUCCESS};

/// A sink that records per-topic outcomes of the sink it wraps.
pub struct InstrumentedSink<S> {
    inner: S,
    counter: IntCounterVec,
    topic: String,
    successes: IntCounter,
    errors: IntCounter,
}

impl<S: AsyncMessageSink> InstrumentedSink<S> {
    /// Wrap `inner`, using the process-wide counter family named by `config`.
    pub fn new(inner: S, config: &SinkConfig) -> Result<Self> {
        config.validate()?;
        let counter = sink_counter(&config.counter)?;
        Ok(Self::with_counter(inner, counter, config.topic.clone()))
    }

    /// Wrap `inner`, recording into a caller-owned counter family.
    ///
    /// The family must use [`SINK_LABELS`](crate::observability::metrics::SINK_LABELS).
    pub fn with_counter(inner: S, counter: IntCounterVec, topic: impl Into<String>) -> Self {
        let topic = topic.into();
        let successes = counter.with_label_values(&[STATUS_SUCCESS, &topic]);
        let errors = counter.with_label_values(&[STATUS_ERROR, &topic]);
        Self {
            inner,
            counter,
            topic,
            successes,
            errors,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn counter(&self) -> &IntCounterVec {
        &self.counter
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn record_outcome(&self, ctx: &Context, result: &Result<()>) {
        match result {
            Ok(()) => {
                tracing::debug!(topic = %self.topic, "Publish session stopped");
            }
            Err(err) if err.is_caused_by(ctx) => {
                tracing::debug!(topic = %self.topic, cause = %err, "Publish session stopped by caller");
            }
            Err(err) => {
                self.errors.inc();
                tracing::warn!(topic = %self.topic, error = %err, "Publish session failed");
            }
        }
    }
}

#[async_trait]
impl<S: AsyncMessageSink> AsyncMessageSink for InstrumentedSink<S> {
    async fn publish_messages(
        &self,
        ctx: Context,
        acks: mpsc::Sender<Message>,
        messages: mpsc::Receiver<Message>,
    ) -> Result<()> {
        let (successes_tx, successes_rx) = mpsc::channel(acks.max_capacity());
        let mut relay = AckRelay {
            ctx: ctx.clone(),
            successes: successes_rx,
            acks,
            counter: self.successes.clone(),
            pending: None,
            relayed: 0,
        };

        let backend = self
            .inner
            .publish_messages(ctx.clone(), successes_tx, messages);
        tokio::pin!(backend);

        let mut relaying = true;
        let result = loop {
            tokio::select! {
                biased;
                result = &mut backend => break result,
                open = relay.step(), if relaying => relaying = open,
            }
        };

        relay.finish(&self.topic);
        self.record_outcome(&ctx, &result);
        result
    }

    async fn status(&self) -> Result<Status> {
        self.inner.status().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

/// Moves acknowledgements from the wrapped sink to the caller, counting each one.
///
/// Driven inside `publish_messages`, concurrently with the wrapped sink. Every
/// await in [`AckRelay::step`] is cancel-safe and state only changes after it
/// completes, so the step can be dropped whenever the wrapped sink returns.
struct AckRelay {
    ctx: Context,
    successes: mpsc::Receiver<Message>,
    acks: mpsc::Sender<Message>,
    counter: IntCounter,
    /// Taken from the wrapped sink, not yet handed to the caller.
    pending: Option<Message>,
    relayed: u64,
}

impl AckRelay {
    /// Move one message a stage forward. Returns `false` once relaying has stopped.
    async fn step(&mut self) -> bool {
        if self.pending.is_none() {
            tokio::select! {
                biased;
                () = self.ctx.done() => return false,
                message = self.successes.recv() => match message {
                    Some(message) => self.pending = Some(message),
                    None => return false,
                },
            }
            return true;
        }

        let permit = tokio::select! {
            biased;
            () = self.ctx.done() => return false,
            permit = self.acks.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    // Caller stopped listening; make the wrapped sink's sends fail.
                    self.successes.close();
                    return false;
                }
            },
        };

        if let Some(message) = self.pending.take() {
            // Counted before the caller can observe the ack.
            self.counter.inc();
            permit.send(message);
            self.relayed += 1;
        }
        true
    }

    /// Hand over what the wrapped sink left behind without waiting, then drop
    /// the caller's ack sender. Whatever does not fit is dropped uncounted.
    fn finish(mut self, topic: &str) {
        self.successes.close();

        let mut dropped: u64 = 0;
        let live = !self.ctx.is_done();
        loop {
            let message = match self.pending.take() {
                Some(message) => message,
                None => match self.successes.try_recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };
            match self.acks.try_reserve() {
                Ok(permit) if live => {
                    self.counter.inc();
                    permit.send(message);
                    self.relayed += 1;
                }
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::debug!(topic, dropped, "Dropped acks left after publish session");
        }
        tracing::trace!(topic, relayed = self.relayed, "Ack relay stopped");
    }
}
