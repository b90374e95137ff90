//! Prometheus counter families for sink outcomes.
//!
//! One family per configured name, labelled by:
//! - `status`: `success` for each acknowledged message, `error` for each failed session
//! - `topic`: the topic the sink publishes to

use prometheus::IntCounterVec;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::config::CounterConfig;
use crate::error::{Result, SinkError};

/// Label names of every sink counter family.
pub const SINK_LABELS: [&str; 2] = ["status", "topic"];

/// `status` label value for acknowledged messages.
pub const STATUS_SUCCESS: &str = "success";

/// `status` label value for failed publish sessions.
pub const STATUS_ERROR: &str = "error";

/// Families registered by this process, keyed by fully qualified name.
static SINK_COUNTERS: OnceLock<Mutex<HashMap<String, IntCounterVec>>> = OnceLock::new();

/// Create an unregistered sink counter family.
pub fn new_sink_counter(config: &CounterConfig) -> Result<IntCounterVec> {
    Ok(IntCounterVec::new(config.opts(), &SINK_LABELS)?)
}

/// Get the sink counter family for `config`, registering it in the default
/// registry on first use.
///
/// Later calls with the same fully qualified name return the same family, so any
/// number of sinks can share it.
pub fn sink_counter(config: &CounterConfig) -> Result<IntCounterVec> {
    let counters = SINK_COUNTERS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut counters = counters
        .lock()
        .map_err(|_| SinkError::Metrics("sink counter cache poisoned".into()))?;

    let fq_name = config.fq_name();
    if let Some(counter) = counters.get(&fq_name) {
        return Ok(counter.clone());
    }

    let counter = new_sink_counter(config)?;
    prometheus::register(Box::new(counter.clone()))?;
    tracing::debug!(name = %fq_name, "Registered sink counter family");

    counters.insert(fq_name, counter.clone());
    Ok(counter)
}
