//! Pipeline metrics accumulation
//!
//! Process-lifetime aggregates: run count, failure count, cache hits, and
//! average duration. Monotonic accumulation only, no reset. The accumulator
//! is an explicitly owned instance handed to the orchestrator at
//! construction, so tests can inject a fresh one per run.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct MetricsInner {
    runs: u64,
    failures: u64,
    cache_hits: u64,
    total_duration: Duration,
}

/// Thread-safe metrics accumulator
#[derive(Debug, Clone, Default)]
pub struct MetricsAccumulator {
    inner: Arc<Mutex<MetricsInner>>,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed run
    pub fn record_run(&self, duration: Duration, success: bool, cache_hit: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.runs += 1;
        if !success {
            inner.failures += 1;
        }
        if cache_hit {
            inner.cache_hits += 1;
        }
        inner.total_duration += duration;
    }

    /// Snapshot the current aggregates
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().unwrap();
        let success_rate = if inner.runs > 0 {
            (inner.runs - inner.failures) as f64 / inner.runs as f64
        } else {
            0.0
        };
        let average_duration_ms = if inner.runs > 0 {
            inner.total_duration.as_millis() as f64 / inner.runs as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            runs: inner.runs,
            failures: inner.failures,
            cache_hits: inner.cache_hits,
            success_rate,
            average_duration_ms,
        }
    }
}

/// Point-in-time view of the accumulated metrics
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsSnapshot {
    pub runs: u64,
    pub failures: u64,
    pub cache_hits: u64,
    pub success_rate: f64,
    pub average_duration_ms: f64,
}
