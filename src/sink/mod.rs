//! Asynchronous message sinks.
//!
//! A sink runs a publish session: it reads messages from a channel, publishes
//! them, and writes each message it has published to an acknowledgement channel.

pub mod instrumented;

pub use instrumented::InstrumentedSink;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::context::Context;
use crate::error::Result;
use crate::message::Message;

/// Health of a sink.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    /// Whether the sink can currently publish.
    pub working: bool,
    /// Human-readable descriptions of current problems.
    pub problems: Vec<String>,
}

/// A backend that publishes messages asynchronously.
#[async_trait]
pub trait AsyncMessageSink: Send + Sync {
    /// Publish messages from `messages` until `ctx` ends or publishing fails.
    ///
    /// Every message the sink has published must be sent to `acks`. The sink must
    /// return once `ctx` is done, either with `Ok(())` or with the context's
    /// cause as [`SinkError::Context`](crate::SinkError::Context).
    async fn publish_messages(
        &self,
        ctx: Context,
        acks: mpsc::Sender<Message>,
        messages: mpsc::Receiver<Message>,
    ) -> Result<()>;

    /// Report the sink's health.
    async fn status(&self) -> Result<Status>;

    /// Release the sink's resources.
    async fn close(&self) -> Result<()>;
}

#[async_trait]
impl<S: AsyncMessageSink + ?Sized> AsyncMessageSink for Box<S> {
    async fn publish_messages(
        &self,
        ctx: Context,
        acks: mpsc::Sender<Message>,
        messages: mpsc::Receiver<Message>,
    ) -> Result<()> {
        (**self).publish_messages(ctx, acks, messages).await
    }

    async fn status(&self) -> Result<Status> {
        (**self).status().await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

#[async_trait]
impl<S: AsyncMessageSink + ?Sized> AsyncMessageSink for Arc<S> {
    async fn publish_messages(
        &self,
        ctx: Context,
        acks: mpsc::Sender<Message>,
        messages: mpsc::Receiver<Message>,
    ) -> Result<()> {
        (**self).publish_messages(ctx, acks, messages).await
    }

    async fn status(&self) -> Result<Status> {
        (**self).status().await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}
