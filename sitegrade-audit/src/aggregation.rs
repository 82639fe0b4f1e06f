//! Aggregation Stage
//!
//! Groups raw signal bundles into domain sub-signals consumable by the
//! scoring engine. Aggregation is a total function: it cannot fail, and it
//! accepts any subset of successful bundles including the empty set.
//!
//! Policy: a failed bundle contributes no data to its category but is
//! recorded as a [`Gap`] so the scoring engine treats the corresponding leaf
//! as null rather than zero. Infrastructure failure is not low quality.

use crate::types::{SignalBundle, SignalPayload};
use serde::Serialize;
use std::collections::BTreeMap;

/// One leaf category for which no detector successfully supplied data
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Gap {
    pub detector_id: String,
    pub category: String,
    pub reason: String,
}

/// Signals grouped by scoring leaf category
///
/// `BTreeMap` keying keeps iteration order stable regardless of detector
/// completion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregatedSignals {
    /// Successful signals keyed by category
    pub domains: BTreeMap<String, Vec<SignalPayload>>,
    /// Detectors that failed, with the category left unserved
    pub gaps: Vec<Gap>,
    /// Total detectors that ran (success + failure)
    pub detector_count: usize,
}

impl AggregatedSignals {
    /// Mean leaf score for a category, or `None` when no signal arrived
    pub fn leaf_score(&self, category: &str) -> Option<f64> {
        let signals = self.domains.get(category)?;
        if signals.is_empty() {
            return None;
        }
        let sum: f64 = signals.iter().map(|s| s.leaf_score).sum();
        Some(sum / signals.len() as f64)
    }

    /// All issue strings reported for a category
    pub fn issues(&self, category: &str) -> Vec<String> {
        self.domains
            .get(category)
            .map(|signals| signals.iter().flat_map(|s| s.issues.clone()).collect())
            .unwrap_or_default()
    }

    /// Look up a structured detail value for a category
    ///
    /// Returns the first signal carrying the key; compliance rules use this
    /// to check specific facts (e.g. `title.present`).
    pub fn detail(&self, category: &str, key: &str) -> Option<&serde_json::Value> {
        self.domains
            .get(category)?
            .iter()
            .find_map(|s| s.details.get(key))
    }

    /// True when the category has at least one successful signal
    pub fn has_signal(&self, category: &str) -> bool {
        self.domains
            .get(category)
            .is_some_and(|signals| !signals.is_empty())
    }

    /// Detector ids recorded as gaps
    pub fn gap_detector_ids(&self) -> Vec<&str> {
        self.gaps.iter().map(|g| g.detector_id.as_str()).collect()
    }
}

/// Aggregate signal bundles into domain-grouped signals
///
/// Total over any input: failed bundles become gaps, successful bundles are
/// grouped by their declared category.
pub fn aggregate(bundles: &[SignalBundle]) -> AggregatedSignals {
    let mut aggregated = AggregatedSignals {
        detector_count: bundles.len(),
        ..Default::default()
    };

    for bundle in bundles {
        match bundle.payload() {
            Some(payload) => {
                aggregated
                    .domains
                    .entry(bundle.category.to_string())
                    .or_default()
                    .push(payload.clone());
            }
            None => {
                aggregated.gaps.push(Gap {
                    detector_id: bundle.detector_id.to_string(),
                    category: bundle.category.to_string(),
                    reason: bundle.error().unwrap_or("unknown failure").to_string(),
                });
            }
        }
    }

    tracing::debug!(
        detectors = aggregated.detector_count,
        domains = aggregated.domains.len(),
        gaps = aggregated.gaps.len(),
        "Aggregation complete"
    );

    aggregated
}
