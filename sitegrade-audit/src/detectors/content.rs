//! Content length detector
//!
//! Word-count banding against a thin-content threshold. The bands are
//! coarse on purpose: the pipeline cares about "substantial vs. thin", not
//! prose quality.

use crate::types::{AnalysisContext, Detector, DetectorError, SignalPayload};

pub struct ContentLengthDetector;

#[async_trait::async_trait]
impl Detector for ContentLengthDetector {
    fn id(&self) -> &'static str {
        "content_length"
    }

    fn category(&self) -> &'static str {
        "content_length"
    }

    async fn detect(&self, ctx: &AnalysisContext) -> Result<SignalPayload, DetectorError> {
        let words = ctx.snapshot.word_count;
        let mut issues = Vec::new();

        let score = if words >= 600 {
            100.0
        } else if words >= 300 {
            70.0
        } else if words >= 100 {
            issues.push(format!("only {} words of visible text", words));
            40.0
        } else {
            issues.push(format!("thin content: {} words of visible text", words));
            10.0
        };

        Ok(SignalPayload::new(
            score,
            issues,
            serde_json::json!({ "word_count": words }),
        ))
    }
}
