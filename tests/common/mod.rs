//! Test utilities for instrumented sink tests.
//!
//! Provides:
//! - A closure-backed mock sink
//! - A session harness that runs `publish_messages` in the background
//! - Counter readers

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use sluice_instrumented::observability::metrics::{new_sink_counter, STATUS_ERROR, STATUS_SUCCESS};
use sluice_instrumented::observability::tracing::init_test_tracing;
use sluice_instrumented::{
    AsyncMessageSink, Context, CounterConfig, InstrumentedSink, Message, Result, Status,
};

/// Topic used by every test sink.
pub const TOPIC: &str = "testTopic";

/// Upper bound for any single wait in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

type PublishFn = dyn Fn(Context, mpsc::Sender<Message>, mpsc::Receiver<Message>) -> BoxFuture<'static, Result<()>>
    + Send
    + Sync;

/// A sink whose publish loop is supplied by the test.
pub struct MockSink {
    publish: Box<PublishFn>,
}

impl MockSink {
    pub fn new<F, Fut>(publish: F) -> Self
    where
        F: Fn(Context, mpsc::Sender<Message>, mpsc::Receiver<Message>) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            publish: Box::new(move |ctx, acks, messages| publish(ctx, acks, messages).boxed()),
        }
    }
}

#[async_trait]
impl AsyncMessageSink for MockSink {
    async fn publish_messages(
        &self,
        ctx: Context,
        acks: mpsc::Sender<Message>,
        messages: mpsc::Receiver<Message>,
    ) -> Result<()> {
        (self.publish)(ctx, acks, messages).await
    }

    async fn status(&self) -> Result<Status> {
        Ok(Status {
            working: true,
            problems: Vec::new(),
        })
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Wrap `mock` with a fresh, unregistered counter family.
pub fn instrument(mock: MockSink) -> Arc<InstrumentedSink<MockSink>> {
    init_test_tracing();
    let counter = new_sink_counter(&CounterConfig::default()).expect("valid counter config");
    Arc::new(InstrumentedSink::with_counter(mock, counter, TOPIC))
}

pub fn success_count(sink: &InstrumentedSink<MockSink>) -> u64 {
    sink.counter()
        .with_label_values(&[STATUS_SUCCESS, sink.topic()])
        .get()
}

pub fn error_count(sink: &InstrumentedSink<MockSink>) -> u64 {
    sink.counter()
        .with_label_values(&[STATUS_ERROR, sink.topic()])
        .get()
}

/// A publish session running in the background.
pub struct Session {
    /// Acknowledgements relayed by the instrumented sink.
    pub acks: mpsc::Receiver<Message>,
    /// Messages handed to the sink.
    pub messages: mpsc::Sender<Message>,
    /// Outcome of `publish_messages`.
    pub result: JoinHandle<Result<()>>,
}

/// Start `publish_messages` on a background task with channels of `capacity`.
pub fn start_session<S>(sink: &Arc<InstrumentedSink<S>>, ctx: Context, capacity: usize) -> Session
where
    S: AsyncMessageSink + 'static,
{
    let (acks_tx, acks_rx) = mpsc::channel(capacity);
    let (messages_tx, messages_rx) = mpsc::channel(capacity);

    let sink = Arc::clone(sink);
    let result = tokio::spawn(async move { sink.publish_messages(ctx, acks_tx, messages_rx).await });

    Session {
        acks: acks_rx,
        messages: messages_tx,
        result,
    }
}

impl Session {
    /// Wait for the next relayed ack.
    pub async fn next_ack(&mut self) -> Option<Message> {
        tokio::time::timeout(TEST_TIMEOUT, self.acks.recv())
            .await
            .expect("timed out waiting for ack")
    }

    /// Wait for `publish_messages` to return.
    pub async fn finish(self) -> (Result<()>, mpsc::Receiver<Message>) {
        let result = tokio::time::timeout(TEST_TIMEOUT, self.result)
            .await
            .expect("timed out waiting for publish_messages")
            .expect("publish task panicked");
        (result, self.acks)
    }
}
