//! Logging setup and in-process counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Upload counters, shared by the orchestrator, service and API
#[derive(Debug, Default)]
pub struct Metrics {
    uploads_succeeded: AtomicU64,
    uploads_failed: AtomicU64,
    host_attempts: AtomicU64,
    host_failures: AtomicU64,
    remote_fetches: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload_succeeded(&self) {
        self.uploads_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "uploads_succeeded", "Metric incremented");
    }

    pub fn upload_failed(&self) {
        self.uploads_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "uploads_failed", "Metric incremented");
    }

    pub fn host_attempted(&self) {
        self.host_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn host_failed(&self) {
        self.host_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "host_failures", "Metric incremented");
    }

    pub fn remote_fetched(&self) {
        self.remote_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uploads_succeeded: self.uploads_succeeded.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
            host_attempts: self.host_attempts.load(Ordering::Relaxed),
            host_failures: self.host_failures.load(Ordering::Relaxed),
            remote_fetches: self.remote_fetches.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub uploads_succeeded: u64,
    pub uploads_failed: u64,
    pub host_attempts: u64,
    pub host_failures: u64,
    pub remote_fetches: u64,
}
