//! Configuration for instrumented sinks.
//!
//! Supports:
//! - CLI arguments via clap (flatten [`SinkConfig`] into a host's parser)
//! - Environment variable overrides
//! - Deserialization from configuration files via serde

use clap::Args;
use serde::Deserialize;

use crate::error::{Result, SinkError};

/// Default name of the sink counter family.
pub const DEFAULT_COUNTER_NAME: &str = "sink_messages_total";

/// Default help text of the sink counter family.
pub const DEFAULT_COUNTER_HELP: &str = "Acknowledged messages and failed publish sessions per topic";

/// Maximum topic length in characters.
const MAX_TOPIC_LEN: usize = 255;

/// Instrumentation settings for one sink.
#[derive(Args, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Topic the sink publishes to, recorded as the `topic` label
    #[arg(long = "sink-topic", env = "SLUICE_SINK_TOPIC")]
    pub topic: String,

    #[command(flatten)]
    #[serde(default)]
    pub counter: CounterConfig,
}

impl SinkConfig {
    /// Configuration for `topic` with the default counter family.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            counter: CounterConfig::default(),
        }
    }

    /// Check the topic is usable as a label value.
    pub fn validate(&self) -> Result<()> {
        if self.topic.is_empty() {
            return Err(SinkError::Config("topic cannot be empty".into()));
        }

        if self.topic.chars().count() > MAX_TOPIC_LEN {
            return Err(SinkError::Config(format!(
                "topic name too long (max {MAX_TOPIC_LEN} characters)"
            )));
        }

        // Alphanumeric, dash, underscore, dot
        if !self
            .topic
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(SinkError::Config(
                "topic name must contain only alphanumeric characters, dashes, underscores, or dots"
                    .into(),
            ));
        }

        if self.counter.name.is_empty() {
            return Err(SinkError::Config("counter name cannot be empty".into()));
        }

        Ok(())
    }
}

/// Settings for the counter family shared by all sinks.
#[derive(Args, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CounterConfig {
    /// Name of the sink counter family
    #[arg(
        long = "sink-counter-name",
        env = "SLUICE_SINK_COUNTER_NAME",
        default_value = DEFAULT_COUNTER_NAME
    )]
    pub name: String,

    /// Help text of the sink counter family
    #[arg(
        id = "sink_counter_help",
        long = "sink-counter-help",
        env = "SLUICE_SINK_COUNTER_HELP",
        default_value = DEFAULT_COUNTER_HELP
    )]
    pub help: String,

    /// Metric namespace prefix
    #[arg(long = "sink-counter-namespace", env = "SLUICE_SINK_COUNTER_NAMESPACE")]
    pub namespace: Option<String>,

    /// Metric subsystem prefix
    #[arg(long = "sink-counter-subsystem", env = "SLUICE_SINK_COUNTER_SUBSYSTEM")]
    pub subsystem: Option<String>,
}

impl CounterConfig {
    /// Prometheus options for the counter family.
    pub fn opts(&self) -> prometheus::Opts {
        let mut opts = prometheus::Opts::new(self.name.clone(), self.help.clone());
        if let Some(namespace) = &self.namespace {
            opts = opts.namespace(namespace.clone());
        }
        if let Some(subsystem) = &self.subsystem {
            opts = opts.subsystem(subsystem.clone());
        }
        opts
    }

    /// Fully qualified family name, including namespace and subsystem.
    pub fn fq_name(&self) -> String {
        self.opts().fq_name()
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COUNTER_NAME.into(),
            help: DEFAULT_COUNTER_HELP.into(),
            namespace: None,
            subsystem: None,
        }
    }
}
