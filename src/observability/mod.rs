// src/observability/mod.rs
//! Logging and metrics
//!
//! The library only emits through the `tracing` and `metrics` facades.
//! Installing a subscriber or recorder is left to the host application;
//! `init_tracing` is a convenience for hosts (and the bundled binary) that
//! have none.

use crate::utils::errors::{Result, TokebiError};
use tracing_subscriber::{fmt, EnvFilter};

/// Events accepted into the queue
pub const EVENTS_QUEUED: &str = "tokebi_events_queued_total";
/// Events discarded by the overflow policy
pub const EVENTS_EVICTED: &str = "tokebi_events_evicted_total";
/// Batches acknowledged by the collector
pub const BATCHES_SENT: &str = "tokebi_batches_sent_total";
/// Batches whose delivery failed
pub const BATCHES_FAILED: &str = "tokebi_batches_failed_total";
/// Events dropped with a failed batch
pub const EVENTS_LOST: &str = "tokebi_events_lost_total";

const DEFAULT_FILTER: &str = "tokebi=info";

/// Install a global `fmt` subscriber filtered by `RUST_LOG`
pub fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = if json {
        fmt().with_env_filter(filter).json().with_target(true).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).try_init()
    };

    result.map_err(|e| TokebiError::ConfigError(format!("Failed to install tracing subscriber: {}", e)))
}
