//! Link profile detector
//!
//! Scores anchor-text quality and internal/external mix. Anchor text is
//! "descriptive" when it is at least four characters and not a generic
//! call-to-action phrase.

use crate::types::{AnalysisContext, Detector, DetectorError, SignalPayload};

const GENERIC_ANCHORS: [&str; 6] = ["click here", "here", "read more", "more", "link", "this"];

fn is_descriptive(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    normalized.chars().count() >= 4 && !GENERIC_ANCHORS.contains(&normalized.as_str())
}

pub struct LinkProfileDetector;

#[async_trait::async_trait]
impl Detector for LinkProfileDetector {
    fn id(&self) -> &'static str {
        "link_profile"
    }

    fn category(&self) -> &'static str {
        "link_profile"
    }

    async fn detect(&self, ctx: &AnalysisContext) -> Result<SignalPayload, DetectorError> {
        let links = &ctx.snapshot.links;
        let mut issues = Vec::new();

        if links.is_empty() {
            issues.push("page has no links".to_string());
            return Ok(SignalPayload::new(
                50.0,
                issues,
                serde_json::json!({ "link_count": 0, "descriptive_ratio": 0.0 }),
            ));
        }

        let descriptive = links.iter().filter(|l| is_descriptive(&l.text)).count();
        let descriptive_ratio = descriptive as f64 / links.len() as f64;
        if descriptive_ratio < 0.5 {
            issues.push(format!(
                "{} of {} links have generic anchor text",
                links.len() - descriptive,
                links.len()
            ));
        }

        let has_internal = links.iter().any(|l| l.internal);
        let has_external = links.iter().any(|l| !l.internal);
        let mix_bonus = if has_internal && has_external {
            30.0
        } else {
            15.0
        };
        if !has_internal {
            issues.push("no internal links".to_string());
        }

        let score = descriptive_ratio * 70.0 + mix_bonus;

        Ok(SignalPayload::new(
            score,
            issues,
            serde_json::json!({
                "link_count": links.len(),
                "descriptive_ratio": descriptive_ratio,
                "internal": has_internal,
                "external": has_external,
            }),
        ))
    }
}
