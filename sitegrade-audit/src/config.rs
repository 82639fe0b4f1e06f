//! Audit engine configuration
//!
//! Built-in defaults overridable from the shared TOML `[audit]` section.
//! Insight provider credentials resolve with ENV → TOML priority.

use sitegrade_common::config::TomlConfig;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding the insight provider endpoint
pub const INSIGHT_ENDPOINT_ENV: &str = "SITEGRADE_INSIGHT_ENDPOINT";
/// Environment variable overriding the insight provider API key
pub const INSIGHT_API_KEY_ENV: &str = "SITEGRADE_INSIGHT_API_KEY";

/// Audit engine configuration
///
/// All durations are stored as milliseconds/seconds for TOML friendliness;
/// use the accessor methods to obtain `Duration` values.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Per-detector timeout in milliseconds
    pub detector_timeout_ms: u64,
    /// Overall detection-stage timeout in milliseconds
    pub pipeline_timeout_ms: u64,
    /// Enhancement collaborator timeout in milliseconds
    pub enhancement_timeout_ms: u64,
    /// Minimum self-reported confidence for accepting enhancement output
    pub confidence_threshold: f64,
    /// Leaf score below which a recommendation is generated
    pub acceptable_leaf_score: f64,
    /// Cache validity bucket width in seconds
    pub cache_bucket_secs: u64,
    /// Cache capacity (None = unbounded)
    pub cache_capacity: Option<usize>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            detector_timeout_ms: 2_000,
            pipeline_timeout_ms: 10_000,
            enhancement_timeout_ms: 5_000,
            confidence_threshold: 0.7,
            acceptable_leaf_score: 70.0,
            cache_bucket_secs: 300, // 5-minute validity window
            cache_capacity: None,
        }
    }
}

impl AuditConfig {
    /// Build configuration from the shared TOML document, applying `[audit]`
    /// overrides onto built-in defaults
    pub fn from_toml(toml_config: &TomlConfig) -> Self {
        let defaults = Self::default();
        let section = &toml_config.audit;

        Self {
            detector_timeout_ms: section
                .detector_timeout_ms
                .unwrap_or(defaults.detector_timeout_ms),
            pipeline_timeout_ms: section
                .pipeline_timeout_ms
                .unwrap_or(defaults.pipeline_timeout_ms),
            enhancement_timeout_ms: section
                .enhancement_timeout_ms
                .unwrap_or(defaults.enhancement_timeout_ms),
            confidence_threshold: section
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold)
                .clamp(0.0, 1.0),
            acceptable_leaf_score: section
                .acceptable_leaf_score
                .unwrap_or(defaults.acceptable_leaf_score)
                .clamp(0.0, 100.0),
            cache_bucket_secs: section
                .cache_bucket_secs
                .unwrap_or(defaults.cache_bucket_secs)
                .max(1),
            cache_capacity: section.cache_capacity.or(defaults.cache_capacity),
        }
    }

    pub fn detector_timeout(&self) -> Duration {
        Duration::from_millis(self.detector_timeout_ms)
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_millis(self.pipeline_timeout_ms)
    }

    pub fn enhancement_timeout(&self) -> Duration {
        Duration::from_millis(self.enhancement_timeout_ms)
    }

    pub fn cache_bucket(&self) -> Duration {
        Duration::from_secs(self.cache_bucket_secs)
    }
}

/// Resolve the insight provider endpoint with ENV → TOML priority
///
/// Returns `None` when unconfigured; the enhancement stage is simply
/// disabled in that case.
pub fn resolve_insight_endpoint(toml_config: &TomlConfig) -> Option<String> {
    if let Ok(endpoint) = std::env::var(INSIGHT_ENDPOINT_ENV) {
        if !endpoint.trim().is_empty() {
            info!("Insight endpoint loaded from environment variable");
            return Some(endpoint);
        }
    }

    if let Some(endpoint) = &toml_config.insight_endpoint {
        if !endpoint.trim().is_empty() {
            info!("Insight endpoint loaded from TOML config");
            return Some(endpoint.clone());
        }
    }

    warn!("Insight endpoint not configured; enhancement stage disabled");
    None
}

/// Resolve the insight provider API key with ENV → TOML priority
pub fn resolve_insight_api_key(toml_config: &TomlConfig) -> Option<String> {
    if let Ok(key) = std::env::var(INSIGHT_API_KEY_ENV) {
        if !key.trim().is_empty() {
            info!("Insight API key loaded from environment variable");
            return Some(key);
        }
    }

    toml_config
        .insight_api_key
        .as_ref()
        .filter(|k| !k.trim().is_empty())
        .cloned()
}
