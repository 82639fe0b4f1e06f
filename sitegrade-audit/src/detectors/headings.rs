//! Heading outline detector
//!
//! Checks for a single H1 and a hierarchy without skipped levels (an H4
//! directly under an H2 loses the reader and the crawler alike).

use crate::types::{AnalysisContext, Detector, DetectorError, SignalPayload};

pub struct HeadingOutlineDetector;

#[async_trait::async_trait]
impl Detector for HeadingOutlineDetector {
    fn id(&self) -> &'static str {
        "heading_outline"
    }

    fn category(&self) -> &'static str {
        "heading_outline"
    }

    async fn detect(&self, ctx: &AnalysisContext) -> Result<SignalPayload, DetectorError> {
        let headings = &ctx.snapshot.headings;
        let mut issues = Vec::new();

        let h1_count = headings.iter().filter(|h| h.level == 1).count();

        let mut score: f64 = match h1_count {
            1 => 100.0,
            0 => {
                issues.push("no H1 heading".to_string());
                30.0
            }
            n => {
                issues.push(format!("{} H1 headings (expected exactly one)", n));
                60.0
            }
        };

        // Skipped levels: each jump of more than one level costs 20 points
        let mut skips = 0;
        for pair in headings.windows(2) {
            if pair[1].level > pair[0].level + 1 {
                skips += 1;
            }
        }
        if skips > 0 {
            issues.push(format!("heading hierarchy skips levels {} time(s)", skips));
            score -= 20.0 * skips as f64;
        }

        Ok(SignalPayload::new(
            score,
            issues,
            serde_json::json!({ "h1_count": h1_count, "skipped_levels": skips }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Heading, PageSnapshot};

    fn ctx_with_headings(levels: &[u8]) -> AnalysisContext {
        AnalysisContext {
            url: "https://example.com/".to_string(),
            snapshot: PageSnapshot {
                headings: levels
                    .iter()
                    .map(|&level| Heading {
                        level,
                        text: format!("H{}", level),
                    })
                    .collect(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_clean_outline() {
        let payload = HeadingOutlineDetector
            .detect(&ctx_with_headings(&[1, 2, 3, 2, 3]))
            .await
            .unwrap();
        assert_eq!(payload.leaf_score, 100.0);
        assert_eq!(payload.details["h1_count"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn test_no_h1() {
        let payload = HeadingOutlineDetector
            .detect(&ctx_with_headings(&[2, 3]))
            .await
            .unwrap();
        assert_eq!(payload.leaf_score, 30.0);
    }

    #[tokio::test]
    async fn test_multiple_h1_and_skip() {
        // Two H1s (60) plus one skipped level (H1 -> H3) costs 20
        let payload = HeadingOutlineDetector
            .detect(&ctx_with_headings(&[1, 3, 1]))
            .await
            .unwrap();
        assert_eq!(payload.leaf_score, 40.0);
        assert_eq!(payload.details["skipped_levels"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn test_score_floor_at_zero() {
        // No H1 and many skips cannot go negative
        let payload = HeadingOutlineDetector
            .detect(&ctx_with_headings(&[2, 4, 2, 4, 2, 4]))
            .await
            .unwrap();
        assert_eq!(payload.leaf_score, 0.0);
    }
}
