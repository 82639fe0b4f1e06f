//! Meta description detector

use crate::types::{AnalysisContext, Detector, DetectorError, SignalPayload};

const MIN_DESC_LEN: usize = 50;
const MAX_DESC_LEN: usize = 160;

pub struct MetaDescriptionDetector;

#[async_trait::async_trait]
impl Detector for MetaDescriptionDetector {
    fn id(&self) -> &'static str {
        "meta_description"
    }

    fn category(&self) -> &'static str {
        "meta_description"
    }

    async fn detect(&self, ctx: &AnalysisContext) -> Result<SignalPayload, DetectorError> {
        let mut issues = Vec::new();

        let (score, present) = match ctx.snapshot.meta_description.as_deref() {
            None => {
                issues.push("no meta description".to_string());
                (0.0, false)
            }
            Some(desc) if desc.trim().is_empty() => {
                issues.push("meta description is empty".to_string());
                (0.0, false)
            }
            Some(desc) => {
                let len = desc.chars().count();
                if (MIN_DESC_LEN..=MAX_DESC_LEN).contains(&len) {
                    (100.0, true)
                } else {
                    issues.push(format!(
                        "meta description is {} characters (recommended {}-{})",
                        len, MIN_DESC_LEN, MAX_DESC_LEN
                    ));
                    (65.0, true)
                }
            }
        };

        Ok(SignalPayload::new(
            score,
            issues,
            serde_json::json!({ "present": present }),
        ))
    }
}
