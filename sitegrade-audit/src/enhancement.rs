//! Enhancement Stage
//!
//! Optional enrichment via an external insight collaborator. The provider's
//! self-reported confidence must clear the configured threshold for its
//! output to be incorporated; any provider error, timeout, or low-confidence
//! response degrades silently to "absent". The rest of the pipeline is
//! already complete by the time this stage runs and is never affected.

use crate::scoring::recommendations::{Priority, Recommendation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Provider errors (always absorbed, never fatal to the pipeline)
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned status {0}")]
    Api(u16),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Compact summary handed to the provider
///
/// A summary rather than raw bundles, so provider payloads stay stable as
/// detectors evolve.
#[derive(Debug, Clone, Serialize)]
pub struct InsightInput {
    pub url: String,
    pub overall_score: f64,
    pub grade: String,
    pub category_scores: BTreeMap<String, f64>,
    pub failed_rules: Vec<String>,
}

/// One enrichment insight from the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insight {
    pub category: String,
    pub title: String,
    pub description: String,
}

/// Raw provider response
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderResponse {
    pub insights: Vec<Insight>,
    /// Self-reported confidence in [0, 1]
    pub confidence: f64,
}

/// Accepted enhancement output, incorporated into the pipeline result
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnhancementResult {
    pub provider: String,
    pub confidence: f64,
    pub insights: Vec<Insight>,
}

impl EnhancementResult {
    /// Convert insights to recommendations for the merged list
    pub fn to_recommendations(&self) -> Vec<Recommendation> {
        self.insights
            .iter()
            .map(|insight| Recommendation {
                priority: Priority::Low,
                category: insight.category.clone(),
                title: insight.title.clone(),
                description: insight.description.clone(),
                estimated_effort: None,
            })
            .collect()
    }
}

/// Insight provider capability
#[async_trait::async_trait]
pub trait InsightProvider: Send + Sync {
    /// Provider name for provenance tracking
    fn name(&self) -> &'static str;

    async fn produce_insights(&self, input: &InsightInput)
        -> Result<ProviderResponse, ProviderError>;
}

/// Enhancement stage: confidence gate + timeout around one provider call
pub struct EnhancementStage {
    provider: Arc<dyn InsightProvider>,
    confidence_threshold: f64,
    timeout: Duration,
}

impl EnhancementStage {
    pub fn new(
        provider: Arc<dyn InsightProvider>,
        confidence_threshold: f64,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            confidence_threshold: confidence_threshold.clamp(0.0, 1.0),
            timeout,
        }
    }

    /// Call the provider and gate its response
    ///
    /// Returns `None` on error, timeout, or confidence below the threshold.
    pub async fn enhance(&self, input: &InsightInput) -> Option<EnhancementResult> {
        let response =
            match tokio::time::timeout(self.timeout, self.provider.produce_insights(input)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    warn!(
                        provider = self.provider.name(),
                        error = %e,
                        "Insight provider failed (non-fatal, enhancement absent)"
                    );
                    return None;
                }
                Err(_) => {
                    warn!(
                        provider = self.provider.name(),
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Insight provider timed out (non-fatal, enhancement absent)"
                    );
                    return None;
                }
            };

        let confidence = response.confidence.clamp(0.0, 1.0);
        if confidence < self.confidence_threshold {
            debug!(
                provider = self.provider.name(),
                confidence,
                threshold = self.confidence_threshold,
                "Enhancement rejected below confidence gate"
            );
            return None;
        }

        info!(
            provider = self.provider.name(),
            confidence,
            insights = response.insights.len(),
            "Enhancement accepted"
        );

        Some(EnhancementResult {
            provider: self.provider.name().to_string(),
            confidence,
            insights: response.insights,
        })
    }
}

// ============================================================================
// HTTP-backed provider
// ============================================================================

const USER_AGENT: &str = concat!("sitegrade/", env!("CARGO_PKG_VERSION"));

/// Insight provider backed by an HTTP endpoint
///
/// POSTs the [`InsightInput`] as JSON and expects a [`ProviderResponse`]
/// JSON body back.
pub struct HttpInsightProvider {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpInsightProvider {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl InsightProvider for HttpInsightProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn produce_insights(
        &self,
        input: &InsightInput,
    ) -> Result<ProviderResponse, ProviderError> {
        let mut request = self.http_client.post(&self.endpoint).json(input);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api(status.as_u16()));
        }

        response
            .json::<ProviderResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}
