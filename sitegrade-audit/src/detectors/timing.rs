//! Load timing detector
//!
//! Bands the full-load time against a performance budget. When the renderer
//! reported no timing data the detector fails with `MissingInput`, which the
//! aggregation stage records as a gap: no timing evidence is not the same as
//! a slow page.

use crate::types::{AnalysisContext, Detector, DetectorError, SignalPayload};

pub struct LoadTimingDetector;

#[async_trait::async_trait]
impl Detector for LoadTimingDetector {
    fn id(&self) -> &'static str {
        "load_timing"
    }

    fn category(&self) -> &'static str {
        "load_timing"
    }

    async fn detect(&self, ctx: &AnalysisContext) -> Result<SignalPayload, DetectorError> {
        let timing = ctx
            .snapshot
            .timing
            .ok_or_else(|| DetectorError::MissingInput("load timing".to_string()))?;

        let ms = timing.full_load_ms;
        let mut issues = Vec::new();

        let score = if ms <= 1_500 {
            100.0
        } else if ms <= 3_000 {
            80.0
        } else if ms <= 5_000 {
            issues.push(format!("full load took {} ms", ms));
            60.0
        } else {
            issues.push(format!("full load took {} ms (budget: 5000 ms)", ms));
            30.0
        };

        Ok(SignalPayload::new(
            score,
            issues,
            serde_json::json!({
                "full_load_ms": ms,
                "time_to_first_byte_ms": timing.time_to_first_byte_ms,
            }),
        ))
    }
}
