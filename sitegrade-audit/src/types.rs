//! Core Types and Trait Definitions for the Audit Pipeline
//!
//! Defines the contracts between the pipeline stages:
//! - **Detection:** `Detector` capability + `SignalBundle` output
//! - **Aggregation:** consumes bundles, produces domain-grouped signals
//! - **Scoring:** consumes aggregated signals
//!
//! The analysis context is shared read-only across all detectors; detectors
//! receive `&AnalysisContext` and cannot mutate it.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Analysis Context
// ============================================================================

/// Analysis context for one audit run
///
/// Contains the page identity and a pre-extracted snapshot of the rendered
/// document. Rendering and DOM acquisition happen upstream; detectors only
/// ever see this structure.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    /// Normalized page URL (scheme + host + path, no fragment)
    pub url: String,
    /// Snapshot of the rendered document
    pub snapshot: PageSnapshot,
}

/// Pre-extracted snapshot of a rendered page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Document title
    pub title: Option<String>,
    /// Meta description content
    pub meta_description: Option<String>,
    /// Canonical URL from `<link rel="canonical">`
    pub canonical_url: Option<String>,
    /// Declared document language (`<html lang>`)
    pub language: Option<String>,
    /// Heading outline in document order
    pub headings: Vec<Heading>,
    /// All images in document order
    pub images: Vec<ImageRecord>,
    /// All anchor links in document order
    pub links: Vec<LinkRecord>,
    /// Visible-text word count
    pub word_count: u32,
    /// Structural digest of the DOM shape (computed upstream, opaque here;
    /// feeds the cache fingerprint)
    pub structural_digest: String,
    /// Load timing measurements (absent when the renderer did not report them)
    pub timing: Option<LoadTiming>,
}

/// One heading element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level (1-6)
    pub level: u8,
    /// Heading text content
    pub text: String,
}

/// One image element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub src: String,
    /// Alt text; `None` when the attribute is missing entirely
    pub alt: Option<String>,
}

/// One anchor link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRecord {
    pub href: String,
    /// Anchor text content
    pub text: String,
    /// True when the link targets the same origin as the page
    pub internal: bool,
}

/// Page load timing measurements
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoadTiming {
    /// Time to first byte in milliseconds
    pub time_to_first_byte_ms: u64,
    /// Full load (load event) in milliseconds
    pub full_load_ms: u64,
}

// ============================================================================
// Signal Bundle (Detection Stage output)
// ============================================================================

/// One detector's tagged output for one run
///
/// Created once by the detection stage wrapper around a detector call and
/// immutable thereafter. Exactly one of payload/error is present by
/// construction of [`SignalOutcome`].
#[derive(Debug, Clone, Serialize)]
pub struct SignalBundle {
    /// Unique detector identifier
    pub detector_id: &'static str,
    /// Scoring leaf this detector feeds
    pub category: &'static str,
    /// Success payload or failure message
    pub outcome: SignalOutcome,
    /// Wall-clock duration of the detector invocation
    #[serde(with = "duration_ms")]
    pub timing: Duration,
}

impl SignalBundle {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, SignalOutcome::Ok(_))
    }

    pub fn payload(&self) -> Option<&SignalPayload> {
        match &self.outcome {
            SignalOutcome::Ok(payload) => Some(payload),
            SignalOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SignalOutcome::Ok(_) => None,
            SignalOutcome::Failed { error } => Some(error),
        }
    }
}

/// Success-or-failure tag for a signal bundle
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignalOutcome {
    Ok(SignalPayload),
    Failed { error: String },
}

/// Structured data produced by one successful detector invocation
#[derive(Debug, Clone, Serialize)]
pub struct SignalPayload {
    /// Measured leaf score in [0, 100]
    pub leaf_score: f64,
    /// Human-readable issues found by this detector
    pub issues: Vec<String>,
    /// Detector-specific structured details (consumed by compliance rules)
    pub details: serde_json::Value,
}

impl SignalPayload {
    /// Create a payload with the score clamped to [0, 100]
    pub fn new(leaf_score: f64, issues: Vec<String>, details: serde_json::Value) -> Self {
        Self {
            leaf_score: leaf_score.clamp(0.0, 100.0),
            issues,
            details,
        }
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

// ============================================================================
// Detector Capability
// ============================================================================

/// Detector errors (per-detector error isolation: never fatal to the run)
#[derive(Debug, Error)]
pub enum DetectorError {
    /// Required snapshot field is absent
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Detector exceeded its per-invocation timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Detector-internal failure
    #[error("internal: {0}")]
    Internal(String),

    /// Arbitrary error from an external detector implementation
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Detector capability trait
///
/// All detectors implement this trait for uniform concurrent execution.
/// Detectors must be side-effect-free on the context and complete (or fail)
/// within the stage-enforced timeout.
#[async_trait::async_trait]
pub trait Detector: Send + Sync {
    /// Unique detector identifier for provenance tracking
    fn id(&self) -> &'static str;

    /// Scoring leaf category this detector feeds
    fn category(&self) -> &'static str;

    /// Inspect the analysis context and produce a signal payload
    ///
    /// # Errors
    /// Returns `DetectorError` on failure; the detection stage records the
    /// failure as a gap without affecting sibling detectors.
    async fn detect(&self, ctx: &AnalysisContext) -> Result<SignalPayload, DetectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_score_clamped() {
        let payload = SignalPayload::new(140.0, vec![], serde_json::json!({}));
        assert_eq!(payload.leaf_score, 100.0);

        let payload = SignalPayload::new(-5.0, vec![], serde_json::json!({}));
        assert_eq!(payload.leaf_score, 0.0);
    }

    #[test]
    fn test_bundle_accessors() {
        let ok = SignalBundle {
            detector_id: "title",
            category: "title",
            outcome: SignalOutcome::Ok(SignalPayload::new(80.0, vec![], serde_json::json!({}))),
            timing: Duration::from_millis(3),
        };
        assert!(ok.is_ok());
        assert_eq!(ok.payload().unwrap().leaf_score, 80.0);
        assert!(ok.error().is_none());

        let failed = SignalBundle {
            detector_id: "timing",
            category: "load_timing",
            outcome: SignalOutcome::Failed {
                error: "missing input: timing".to_string(),
            },
            timing: Duration::from_millis(1),
        };
        assert!(!failed.is_ok());
        assert!(failed.payload().is_none());
        assert_eq!(failed.error(), Some("missing input: timing"));
    }
}
