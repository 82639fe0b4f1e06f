//! Image alt-text detector
//!
//! Scores alt coverage as a ratio. A page with no images is vacuously
//! compliant.

use crate::types::{AnalysisContext, Detector, DetectorError, SignalPayload};

pub struct ImageAltDetector;

#[async_trait::async_trait]
impl Detector for ImageAltDetector {
    fn id(&self) -> &'static str {
        "image_alt"
    }

    fn category(&self) -> &'static str {
        "image_alt"
    }

    async fn detect(&self, ctx: &AnalysisContext) -> Result<SignalPayload, DetectorError> {
        let images = &ctx.snapshot.images;
        let mut issues = Vec::new();

        let (score, coverage) = if images.is_empty() {
            (100.0, 1.0)
        } else {
            let with_alt = images
                .iter()
                .filter(|img| img.alt.as_deref().is_some_and(|alt| !alt.trim().is_empty()))
                .count();
            let coverage = with_alt as f64 / images.len() as f64;
            if coverage < 1.0 {
                issues.push(format!(
                    "{} of {} images missing alt text",
                    images.len() - with_alt,
                    images.len()
                ));
            }
            (coverage * 100.0, coverage)
        };

        Ok(SignalPayload::new(
            score,
            issues,
            serde_json::json!({ "alt_coverage": coverage, "image_count": images.len() }),
        ))
    }
}
