//! Detection Stage
//!
//! Runs all registered detectors concurrently against one shared read-only
//! analysis context. Each invocation is individually wrapped: a detector
//! error or timeout produces a failed bundle without aborting or delaying
//! sibling detectors. The stage resolves once all detectors have settled,
//! and output is sorted by detector id so the result is identical regardless
//! of completion order.

pub mod canonical;
pub mod content;
pub mod headings;
pub mod images;
pub mod links;
pub mod meta_description;
pub mod timing;
pub mod title;

use crate::types::{AnalysisContext, Detector, DetectorError, SignalBundle, SignalOutcome};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Detection stage executor
pub struct DetectionStage {
    detectors: Vec<Arc<dyn Detector>>,
    per_detector_timeout: Duration,
}

impl DetectionStage {
    pub fn new(detectors: Vec<Arc<dyn Detector>>, per_detector_timeout: Duration) -> Self {
        Self {
            detectors,
            per_detector_timeout,
        }
    }

    pub fn count(&self) -> usize {
        self.detectors.len()
    }

    /// Detector ids in registry order
    pub fn detector_ids(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.id()).collect()
    }

    /// Run all detectors concurrently and collect one bundle per detector
    ///
    /// Never fails: detector errors and timeouts become failed bundles.
    pub async fn run(&self, ctx: &AnalysisContext) -> Vec<SignalBundle> {
        let futures = self.detectors.iter().map(|detector| {
            let detector = Arc::clone(detector);
            async move {
                let started = Instant::now();
                let outcome =
                    match tokio::time::timeout(self.per_detector_timeout, detector.detect(ctx))
                        .await
                    {
                        Ok(Ok(payload)) => {
                            debug!(detector = detector.id(), "Detection successful");
                            SignalOutcome::Ok(payload)
                        }
                        Ok(Err(e)) => {
                            warn!(
                                detector = detector.id(),
                                error = %e,
                                "Detection failed (isolated)"
                            );
                            SignalOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                        Err(_) => {
                            let e = DetectorError::Timeout(self.per_detector_timeout);
                            warn!(
                                detector = detector.id(),
                                error = %e,
                                "Detection timed out (isolated)"
                            );
                            SignalOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                    };

                SignalBundle {
                    detector_id: detector.id(),
                    category: detector.category(),
                    outcome,
                    timing: started.elapsed(),
                }
            }
        });

        let mut bundles = join_all(futures).await;

        // Deterministic reduction order: key by detector id, not arrival
        bundles.sort_by_key(|b| b.detector_id);
        bundles
    }

    /// One failed bundle per registered detector, used when the overall
    /// pipeline timeout expires before the stage settles
    pub fn all_failed(&self, reason: &str) -> Vec<SignalBundle> {
        let mut bundles: Vec<SignalBundle> = self
            .detectors
            .iter()
            .map(|detector| SignalBundle {
                detector_id: detector.id(),
                category: detector.category(),
                outcome: SignalOutcome::Failed {
                    error: reason.to_string(),
                },
                timing: Duration::ZERO,
            })
            .collect();
        bundles.sort_by_key(|b| b.detector_id);
        bundles
    }
}

/// The default detector registry: all built-in snapshot detectors
pub fn default_registry() -> Vec<Arc<dyn Detector>> {
    vec![
        Arc::new(title::TitleDetector),
        Arc::new(meta_description::MetaDescriptionDetector),
        Arc::new(content::ContentLengthDetector),
        Arc::new(headings::HeadingOutlineDetector),
        Arc::new(timing::LoadTimingDetector),
        Arc::new(canonical::CanonicalDetector),
        Arc::new(images::ImageAltDetector),
        Arc::new(links::LinkProfileDetector),
    ]
}

// ============================================================================
// Mock Detector for Testing
// ============================================================================

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::types::SignalPayload;

    /// Mock detector for testing the stage in isolation
    pub struct MockDetector {
        pub id: &'static str,
        pub category: &'static str,
        pub score: f64,
        pub should_fail: bool,
        pub delay: Duration,
    }

    impl MockDetector {
        pub fn new(id: &'static str, category: &'static str, score: f64) -> Self {
            Self {
                id,
                category,
                score,
                should_fail: false,
                delay: Duration::ZERO,
            }
        }

        pub fn failing(id: &'static str, category: &'static str) -> Self {
            Self {
                id,
                category,
                score: 0.0,
                should_fail: true,
                delay: Duration::ZERO,
            }
        }

        pub fn slow(id: &'static str, category: &'static str, delay: Duration) -> Self {
            Self {
                id,
                category,
                score: 100.0,
                should_fail: false,
                delay,
            }
        }
    }

    #[async_trait::async_trait]
    impl Detector for MockDetector {
        fn id(&self) -> &'static str {
            self.id
        }

        fn category(&self) -> &'static str {
            self.category
        }

        async fn detect(&self, _ctx: &AnalysisContext) -> Result<SignalPayload, DetectorError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.should_fail {
                Err(DetectorError::Internal("mock failure".to_string()))
            } else {
                Ok(SignalPayload::new(self.score, vec![], serde_json::json!({})))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageSnapshot;

    fn ctx() -> AnalysisContext {
        AnalysisContext {
            url: "https://example.com/".to_string(),
            snapshot: PageSnapshot::default(),
        }
    }

    #[tokio::test]
    async fn test_all_detectors_succeed() {
        let stage = DetectionStage::new(
            vec![
                Arc::new(mock::MockDetector::new("b", "b", 80.0)),
                Arc::new(mock::MockDetector::new("a", "a", 90.0)),
            ],
            Duration::from_secs(1),
        );

        let bundles = stage.run(&ctx()).await;

        assert_eq!(bundles.len(), 2);
        // Sorted by detector id regardless of registration order
        assert_eq!(bundles[0].detector_id, "a");
        assert_eq!(bundles[1].detector_id, "b");
        assert!(bundles.iter().all(SignalBundle::is_ok));
    }

    #[tokio::test]
    async fn test_failure_isolation() {
        let stage = DetectionStage::new(
            vec![
                Arc::new(mock::MockDetector::new("ok1", "a", 80.0)),
                Arc::new(mock::MockDetector::failing("bad", "b")),
                Arc::new(mock::MockDetector::new("ok2", "c", 70.0)),
            ],
            Duration::from_secs(1),
        );

        let bundles = stage.run(&ctx()).await;

        // One bundle per detector, success or failure
        assert_eq!(bundles.len(), 3);
        let failed: Vec<_> = bundles.iter().filter(|b| !b.is_ok()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].detector_id, "bad");
    }

    #[tokio::test]
    async fn test_per_detector_timeout_is_isolated() {
        let stage = DetectionStage::new(
            vec![
                Arc::new(mock::MockDetector::new("fast", "a", 80.0)),
                Arc::new(mock::MockDetector::slow(
                    "stuck",
                    "b",
                    Duration::from_secs(30),
                )),
            ],
            Duration::from_millis(50),
        );

        let bundles = stage.run(&ctx()).await;

        assert_eq!(bundles.len(), 2);
        assert!(bundles[0].is_ok()); // "fast"
        let stuck = &bundles[1];
        assert_eq!(stuck.detector_id, "stuck");
        assert!(stuck.error().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_deterministic_output_despite_completion_order() {
        // The slow detector finishes last but still sorts first by id
        let stage = DetectionStage::new(
            vec![
                Arc::new(mock::MockDetector::new("zz", "a", 80.0)),
                Arc::new(mock::MockDetector::slow(
                    "aa",
                    "b",
                    Duration::from_millis(20),
                )),
            ],
            Duration::from_secs(1),
        );

        let bundles = stage.run(&ctx()).await;
        assert_eq!(bundles[0].detector_id, "aa");
        assert_eq!(bundles[1].detector_id, "zz");
    }

    #[test]
    fn test_all_failed_covers_registry() {
        let stage = DetectionStage::new(
            vec![
                Arc::new(mock::MockDetector::new("a", "a", 80.0)),
                Arc::new(mock::MockDetector::new("b", "b", 80.0)),
            ],
            Duration::from_secs(1),
        );

        let bundles = stage.all_failed("pipeline timeout");
        assert_eq!(bundles.len(), 2);
        assert!(bundles.iter().all(|b| !b.is_ok()));
        assert_eq!(bundles[0].error(), Some("pipeline timeout"));
    }

    #[test]
    fn test_default_registry_ids_unique() {
        let registry = default_registry();
        let mut ids: Vec<_> = registry.iter().map(|d| d.id()).collect();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before);
        assert_eq!(before, 8);
    }
}
