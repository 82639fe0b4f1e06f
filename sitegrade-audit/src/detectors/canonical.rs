//! Canonical URL detector

use crate::types::{AnalysisContext, Detector, DetectorError, SignalPayload};

pub struct CanonicalDetector;

/// Trailing-slash-insensitive URL comparison
fn urls_equivalent(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

#[async_trait::async_trait]
impl Detector for CanonicalDetector {
    fn id(&self) -> &'static str {
        "canonical"
    }

    fn category(&self) -> &'static str {
        "canonical"
    }

    async fn detect(&self, ctx: &AnalysisContext) -> Result<SignalPayload, DetectorError> {
        let mut issues = Vec::new();

        let (score, present, self_referential) = match ctx.snapshot.canonical_url.as_deref() {
            None => {
                issues.push("no canonical URL declared".to_string());
                (40.0, false, false)
            }
            Some(canonical) if urls_equivalent(canonical, &ctx.url) => (100.0, true, true),
            Some(canonical) => {
                issues.push(format!(
                    "canonical URL points elsewhere: {}",
                    canonical
                ));
                (60.0, true, false)
            }
        };

        Ok(SignalPayload::new(
            score,
            issues,
            serde_json::json!({ "present": present, "self_referential": self_referential }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageSnapshot;

    fn ctx(url: &str, canonical: Option<&str>) -> AnalysisContext {
        AnalysisContext {
            url: url.to_string(),
            snapshot: PageSnapshot {
                canonical_url: canonical.map(String::from),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_self_referential_canonical() {
        let payload = CanonicalDetector
            .detect(&ctx(
                "https://example.com/page",
                Some("https://example.com/page/"),
            ))
            .await
            .unwrap();
        assert_eq!(payload.leaf_score, 100.0);
        assert_eq!(payload.details["self_referential"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_cross_canonical_flagged() {
        let payload = CanonicalDetector
            .detect(&ctx(
                "https://example.com/page",
                Some("https://example.com/other"),
            ))
            .await
            .unwrap();
        assert_eq!(payload.leaf_score, 60.0);
    }

    #[tokio::test]
    async fn test_missing_canonical() {
        let payload = CanonicalDetector
            .detect(&ctx("https://example.com/page", None))
            .await
            .unwrap();
        assert_eq!(payload.leaf_score, 40.0);
        assert_eq!(payload.details["present"], serde_json::json!(false));
    }
}
