//! Pipeline result records
//!
//! The top-level immutable record produced once by the orchestrator at the
//! end of a run and persisted in the cache. The caller always receives a
//! `PipelineResult`-shaped value; "no usable result" is a valid degraded
//! result, never an absent return.

use crate::enhancement::EnhancementResult;
use crate::scoring::compliance::ComplianceFinding;
use crate::scoring::framework::CategoryNode;
use crate::scoring::grade::Grade;
use crate::scoring::recommendations::Recommendation;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Run provenance and bookkeeping
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Wall-clock duration per stage, keyed by stage name
    pub stage_durations_ms: BTreeMap<String, u64>,
    /// True when this result was served from the cache
    pub cache_hit: bool,
    /// True only for orchestration-failure (degraded floor) results
    pub degraded: bool,
    /// Error marker, present iff `degraded`
    pub error: Option<String>,
}

/// Complete audit result for one page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PipelineResult {
    /// Overall score in [0, 100]
    pub overall_score: f64,
    pub grade: Grade,
    /// Root of the populated category score tree
    pub score_tree: CategoryNode,
    /// One finding per rule in the static catalog
    pub findings: Vec<ComplianceFinding>,
    /// Deduplicated, priority-sorted recommendations
    pub recommendations: Vec<Recommendation>,
    /// Accepted enrichment output, absent on error/low confidence
    pub enhancement: Option<EnhancementResult>,
    pub metadata: RunMetadata,
}

impl PipelineResult {
    /// Minimal degraded report for an orchestration failure
    ///
    /// Score floor of 0, empty tree and lists, explicit error marker.
    pub fn failed(url: &str, error: &str) -> Self {
        let now = Utc::now();
        Self {
            overall_score: 0.0,
            grade: Grade::F,
            score_tree: CategoryNode {
                name: "page_quality".to_string(),
                weight: 1.0,
                score: None,
                children: Vec::new(),
                issues: Vec::new(),
                recommendations: Vec::new(),
            },
            findings: Vec::new(),
            recommendations: Vec::new(),
            enhancement: None,
            metadata: RunMetadata {
                run_id: Uuid::new_v4(),
                url: url.to_string(),
                started_at: now,
                completed_at: now,
                stage_durations_ms: BTreeMap::new(),
                cache_hit: false,
                degraded: true,
                error: Some(error.to_string()),
            },
        }
    }
}
