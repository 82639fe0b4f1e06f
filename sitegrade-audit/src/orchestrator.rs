//! Pipeline Orchestrator
//!
//! Sequences the four stages, tracks per-stage timing, updates the injected
//! metrics accumulator, and assembles the final report.
//!
//! # State machine
//! `Idle → Detecting → Aggregating → Scoring → Enhancing → Compiling →
//! Done | Failed`. Detection and aggregation are total by construction; an
//! unexpected panic in any later stage degrades the run to a terminal
//! `Failed` report (score 0, explicit error marker) instead of propagating.
//! `Done` and `Failed` are both terminal. The caller always receives a
//! `PipelineResult`.

use crate::aggregation::aggregate;
use crate::cache::{Fingerprint, ResultCache};
use crate::config::AuditConfig;
use crate::detectors::DetectionStage;
use crate::enhancement::{EnhancementStage, InsightInput, InsightProvider};
use crate::metrics::MetricsAccumulator;
use crate::report::{PipelineResult, RunMetadata};
use crate::scoring::{ScoreOutcome, ScoringEngine};
use crate::types::{AnalysisContext, Detector};
use chrono::Utc;
use futures::FutureExt;
use sitegrade_common::Result;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Orchestrator states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Detecting,
    Aggregating,
    Scoring,
    Enhancing,
    Compiling,
    Done,
    Failed,
}

/// The audit pipeline
///
/// Construction validates the scoring framework; a malformed weight table is
/// rejected here, never at run time.
pub struct AuditPipeline {
    config: AuditConfig,
    detection: DetectionStage,
    engine: ScoringEngine,
    enhancement: Option<EnhancementStage>,
    cache: ResultCache,
    metrics: MetricsAccumulator,
}

impl AuditPipeline {
    /// Create a pipeline with an explicit detector registry and optional
    /// insight provider
    pub fn new(
        config: AuditConfig,
        detectors: Vec<Arc<dyn Detector>>,
        provider: Option<Arc<dyn InsightProvider>>,
        metrics: MetricsAccumulator,
    ) -> Result<Self> {
        let engine = ScoringEngine::standard(config.acceptable_leaf_score)?;
        let detection = DetectionStage::new(detectors, config.detector_timeout());
        let enhancement = provider.map(|p| {
            EnhancementStage::new(p, config.confidence_threshold, config.enhancement_timeout())
        });
        let cache = ResultCache::new(config.cache_capacity);

        Ok(Self {
            config,
            detection,
            engine,
            enhancement,
            cache,
            metrics,
        })
    }

    /// Pipeline over the default detector registry, without enhancement
    pub fn with_defaults(config: AuditConfig, metrics: MetricsAccumulator) -> Result<Self> {
        Self::new(config, crate::detectors::default_registry(), None, metrics)
    }

    pub fn metrics(&self) -> &MetricsAccumulator {
        &self.metrics
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Run the full analysis pipeline for one page
    ///
    /// Never errors: every outcome, including orchestration failure, is
    /// returned as a `PipelineResult`.
    pub async fn run(&self, ctx: &AnalysisContext) -> PipelineResult {
        let run_started = Instant::now();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let mut state = PipelineState::Idle;
        let mut stage_durations: BTreeMap<String, u64> = BTreeMap::new();

        info!(run_id = %run_id, url = %ctx.url, state = ?state, "Audit run started");

        // Cache consult before detection
        let epoch_secs = started_at.timestamp().max(0) as u64;
        let fingerprint = Fingerprint::compute(ctx, epoch_secs, self.config.cache_bucket());
        if let Some(mut hit) = self.cache.get(&fingerprint) {
            info!(run_id = %run_id, url = %ctx.url, "Audit served from cache");
            hit.metadata.cache_hit = true;
            self.metrics.record_run(run_started.elapsed(), true, true);
            return hit;
        }

        // Detection: total, per-detector isolation, bounded by the overall
        // pipeline timeout; detectors still outstanding at expiry are failed
        state = PipelineState::Detecting;
        debug!(run_id = %run_id, state = ?state, "State transition");
        let stage_started = Instant::now();
        let bundles =
            match tokio::time::timeout(self.config.pipeline_timeout(), self.detection.run(ctx))
                .await
            {
                Ok(bundles) => bundles,
                Err(_) => {
                    warn!(
                        run_id = %run_id,
                        timeout_ms = self.config.pipeline_timeout_ms,
                        "Pipeline timeout during detection; all outstanding detectors failed"
                    );
                    self.detection.all_failed("pipeline timeout")
                }
            };
        stage_durations.insert(
            "detection".to_string(),
            stage_started.elapsed().as_millis() as u64,
        );

        // Aggregation: total over whatever subset of bundles succeeded
        state = PipelineState::Aggregating;
        debug!(run_id = %run_id, state = ?state, "State transition");
        let stage_started = Instant::now();
        let aggregated = aggregate(&bundles);
        stage_durations.insert(
            "aggregation".to_string(),
            stage_started.elapsed().as_millis() as u64,
        );

        // Scoring, enhancement, and compilation absorb unexpected panics
        // into a terminal Failed report
        state = PipelineState::Scoring;
        debug!(run_id = %run_id, state = ?state, "State transition");
        let has_enhancement = self.enhancement.is_some();
        let compiled = AssertUnwindSafe(async {
            let stage_started = Instant::now();
            let outcome = self.engine.score(&aggregated);
            let scoring_ms = stage_started.elapsed().as_millis() as u64;

            let stage_started = Instant::now();
            let enhancement = match &self.enhancement {
                Some(stage) => {
                    debug!(run_id = %run_id, state = ?PipelineState::Enhancing, "State transition");
                    let input = build_insight_input(ctx, &outcome);
                    stage.enhance(&input).await
                }
                None => None,
            };
            let enhancement_ms = stage_started.elapsed().as_millis() as u64;

            (outcome, enhancement, scoring_ms, enhancement_ms)
        })
        .catch_unwind()
        .await;

        let (outcome, enhancement, scoring_ms, enhancement_ms) = match compiled {
            Ok(parts) => parts,
            Err(_) => {
                state = PipelineState::Failed;
                error!(run_id = %run_id, state = ?state, "Unexpected panic; returning degraded report");
                self.metrics.record_run(run_started.elapsed(), false, false);
                return PipelineResult::failed(&ctx.url, "internal pipeline failure");
            }
        };

        stage_durations.insert("scoring".to_string(), scoring_ms);
        if has_enhancement {
            stage_durations.insert("enhancement".to_string(), enhancement_ms);
        }

        state = PipelineState::Compiling;
        debug!(run_id = %run_id, state = ?state, "State transition");

        let ScoreOutcome {
            overall_score,
            grade,
            score_tree,
            findings,
            recommendations,
        } = outcome;

        // Merge enhancement-derived recommendations; engine-derived entries
        // win on (category, title) collisions
        let recommendations = match &enhancement {
            Some(result) => crate::scoring::recommendations::merge_deduped(vec![
                recommendations,
                result.to_recommendations(),
            ]),
            None => recommendations,
        };

        let result = PipelineResult {
            overall_score,
            grade,
            score_tree,
            findings,
            recommendations,
            enhancement,
            metadata: RunMetadata {
                run_id,
                url: ctx.url.clone(),
                started_at,
                completed_at: Utc::now(),
                stage_durations_ms: stage_durations,
                cache_hit: false,
                degraded: false,
                error: None,
            },
        };

        // Write-through after compilation; last write wins per fingerprint
        self.cache.put(fingerprint, result.clone());

        state = PipelineState::Done;
        self.metrics.record_run(run_started.elapsed(), true, false);
        info!(
            run_id = %run_id,
            state = ?state,
            overall_score = result.overall_score,
            grade = %result.grade,
            duration_ms = run_started.elapsed().as_millis() as u64,
            "Audit run complete"
        );

        result
    }
}

/// Build the compact provider input from the score outcome
fn build_insight_input(ctx: &AnalysisContext, outcome: &ScoreOutcome) -> InsightInput {
    let mut category_scores = BTreeMap::new();
    outcome.score_tree.for_each_leaf(&mut |leaf| {
        if let Some(score) = leaf.score {
            category_scores.insert(leaf.name.clone(), score);
        }
    });

    let failed_rules = outcome
        .findings
        .iter()
        .filter(|f| !f.passed)
        .map(|f| f.rule_id.clone())
        .collect();

    InsightInput {
        url: ctx.url.clone(),
        overall_score: outcome.overall_score,
        grade: outcome.grade.to_string(),
        category_scores,
        failed_rules,
    }
}
