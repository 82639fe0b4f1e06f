//! Title detector
//!
//! Scores the document title on presence and length. Search engines
//! truncate titles around 60 characters; very short titles waste the
//! highest-signal element on the page.

use crate::types::{AnalysisContext, Detector, DetectorError, SignalPayload};

const MIN_TITLE_LEN: usize = 10;
const MAX_TITLE_LEN: usize = 60;

pub struct TitleDetector;

#[async_trait::async_trait]
impl Detector for TitleDetector {
    fn id(&self) -> &'static str {
        "title"
    }

    fn category(&self) -> &'static str {
        "title"
    }

    async fn detect(&self, ctx: &AnalysisContext) -> Result<SignalPayload, DetectorError> {
        let mut issues = Vec::new();

        let (score, present, length) = match ctx.snapshot.title.as_deref() {
            None => {
                issues.push("document has no title".to_string());
                (0.0, false, 0)
            }
            Some(title) if title.trim().is_empty() => {
                issues.push("document title is empty".to_string());
                (0.0, false, 0)
            }
            Some(title) => {
                let len = title.chars().count();
                let score = if (MIN_TITLE_LEN..=MAX_TITLE_LEN).contains(&len) {
                    100.0
                } else if len < MIN_TITLE_LEN {
                    issues.push(format!("title is only {} characters", len));
                    60.0
                } else {
                    issues.push(format!("title is {} characters and will be truncated", len));
                    70.0
                };
                (score, true, len)
            }
        };

        Ok(SignalPayload::new(
            score,
            issues,
            serde_json::json!({ "present": present, "length": length }),
        ))
    }
}
