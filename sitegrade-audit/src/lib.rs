//! # sitegrade-audit
//!
//! Page quality audit pipeline: runs independent detectors concurrently
//! against a rendered-page snapshot, aggregates their signals into a
//! weighted hierarchical score with a letter grade, validates best-practices
//! compliance, optionally enriches the result through a confidence-gated
//! insight provider, and memoizes complete results in a time-bucketed cache.
//!
//! Entry point: [`AuditPipeline::run`], which always returns a
//! [`PipelineResult`], degraded if necessary, never an error.

pub mod aggregation;
pub mod cache;
pub mod config;
pub mod detectors;
pub mod enhancement;
pub mod metrics;
pub mod orchestrator;
pub mod report;
pub mod scoring;
pub mod types;

pub use config::AuditConfig;
pub use metrics::{MetricsAccumulator, MetricsSnapshot};
pub use orchestrator::{AuditPipeline, PipelineState};
pub use report::{PipelineResult, RunMetadata};
pub use types::{AnalysisContext, Detector, PageSnapshot};
