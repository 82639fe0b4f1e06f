//! Best-practices compliance validation
//!
//! A static rule catalog evaluated independently of the score tree: every
//! rule produces exactly one finding per run, pass or fail. Critical-tier
//! failures never change the numeric score but always surface
//! highest-priority recommendations. "How good" (score) and "is it broken"
//! (compliance) stay separate.

use crate::aggregation::AggregatedSignals;
use serde::{Deserialize, Serialize};

/// Rule severity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTier {
    Critical,
    Important,
    Enhancement,
}

/// One static compliance rule
///
/// Validators consume aggregated signals only; when the feeding detector
/// failed (gap), the evidence of compliance is absent and the rule fails.
pub struct ComplianceRule {
    pub id: &'static str,
    pub tier: RuleTier,
    pub impact: &'static str,
    pub fix_suggestion: &'static str,
    pub validate: fn(&AggregatedSignals) -> bool,
}

/// Pass/fail record for one rule in one run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComplianceFinding {
    pub rule_id: String,
    pub tier: RuleTier,
    pub passed: bool,
    pub impact: String,
    pub fix_suggestion: String,
}

fn detail_bool(agg: &AggregatedSignals, category: &str, key: &str) -> bool {
    agg.detail(category, key)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn detail_f64(agg: &AggregatedSignals, category: &str, key: &str) -> Option<f64> {
    agg.detail(category, key).and_then(|v| v.as_f64())
}

/// The static rule catalog
pub fn rule_catalog() -> &'static [ComplianceRule] {
    &RULES
}

static RULES: [ComplianceRule; 8] = [
    ComplianceRule {
        id: "title-present",
        tier: RuleTier::Critical,
        impact: "Pages without a title are effectively invisible to search and unusable in browser tabs",
        fix_suggestion: "Add a unique, descriptive <title> element",
        validate: |agg| detail_bool(agg, "title", "present"),
    },
    ComplianceRule {
        id: "content-substantial",
        tier: RuleTier::Critical,
        impact: "Pages with almost no indexable text rank poorly and give visitors nothing to act on",
        fix_suggestion: "Provide at least a few paragraphs of unique body content",
        validate: |agg| {
            detail_f64(agg, "content_length", "word_count").is_some_and(|w| w >= 100.0)
        },
    },
    ComplianceRule {
        id: "meta-description-present",
        tier: RuleTier::Important,
        impact: "Search engines substitute arbitrary page text when no meta description exists",
        fix_suggestion: "Add a meta description of 50-160 characters",
        validate: |agg| detail_bool(agg, "meta_description", "present"),
    },
    ComplianceRule {
        id: "single-h1",
        tier: RuleTier::Important,
        impact: "Zero or multiple H1 headings obscure the page topic for assistive tech and crawlers",
        fix_suggestion: "Use exactly one H1 that states the page topic",
        validate: |agg| {
            detail_f64(agg, "heading_outline", "h1_count").is_some_and(|c| c == 1.0)
        },
    },
    ComplianceRule {
        id: "image-alt-coverage",
        tier: RuleTier::Important,
        impact: "Images without alt text are inaccessible to screen reader users",
        fix_suggestion: "Add alt attributes to at least 80% of content images",
        validate: |agg| {
            detail_f64(agg, "image_alt", "alt_coverage").is_some_and(|c| c >= 0.8)
        },
    },
    ComplianceRule {
        id: "load-time-budget",
        tier: RuleTier::Important,
        impact: "Load times beyond 5 seconds sharply increase abandonment",
        fix_suggestion: "Reduce full page load below 5000 ms",
        validate: |agg| {
            detail_f64(agg, "load_timing", "full_load_ms").is_some_and(|ms| ms <= 5000.0)
        },
    },
    ComplianceRule {
        id: "canonical-present",
        tier: RuleTier::Enhancement,
        impact: "Without a canonical URL, query-string variants can split ranking signals",
        fix_suggestion: "Add a self-referential <link rel=\"canonical\">",
        validate: |agg| detail_bool(agg, "canonical", "present"),
    },
    ComplianceRule {
        id: "descriptive-links",
        tier: RuleTier::Enhancement,
        impact: "Generic anchor text (\"click here\") weakens both accessibility and relevance signals",
        fix_suggestion: "Rewrite anchors to describe their destination",
        validate: |agg| {
            detail_f64(agg, "link_profile", "descriptive_ratio").is_some_and(|r| r >= 0.5)
        },
    },
];

/// Evaluate every rule in the catalog against the aggregated signals
///
/// Invariant: the output length always equals the catalog length.
pub fn validate_all(agg: &AggregatedSignals) -> Vec<ComplianceFinding> {
    let findings: Vec<ComplianceFinding> = rule_catalog()
        .iter()
        .map(|rule| {
            let passed = (rule.validate)(agg);
            ComplianceFinding {
                rule_id: rule.id.to_string(),
                tier: rule.tier,
                passed,
                impact: rule.impact.to_string(),
                fix_suggestion: rule.fix_suggestion.to_string(),
            }
        })
        .collect();

    let failed = findings.iter().filter(|f| !f.passed).count();
    tracing::debug!(
        rules = findings.len(),
        failed,
        "Compliance validation complete"
    );

    findings
}

/// Count failed findings by tier: (critical, important, enhancement)
pub fn count_failed_by_tier(findings: &[ComplianceFinding]) -> (usize, usize, usize) {
    let mut critical = 0;
    let mut important = 0;
    let mut enhancement = 0;

    for finding in findings.iter().filter(|f| !f.passed) {
        match finding.tier {
            RuleTier::Critical => critical += 1,
            RuleTier::Important => important += 1,
            RuleTier::Enhancement => enhancement += 1,
        }
    }

    (critical, important, enhancement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::aggregate;
    use crate::types::{SignalBundle, SignalOutcome, SignalPayload};
    use std::time::Duration;

    fn bundle(id: &'static str, category: &'static str, details: serde_json::Value) -> SignalBundle {
        SignalBundle {
            detector_id: id,
            category,
            outcome: SignalOutcome::Ok(SignalPayload::new(100.0, vec![], details)),
            timing: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_every_rule_produces_one_finding() {
        let agg = aggregate(&[]);
        let findings = validate_all(&agg);
        assert_eq!(findings.len(), rule_catalog().len());
    }

    #[test]
    fn test_title_rule_passes_with_evidence() {
        let agg = aggregate(&[bundle("title", "title", serde_json::json!({ "present": true }))]);
        let findings = validate_all(&agg);
        let title = findings.iter().find(|f| f.rule_id == "title-present").unwrap();
        assert!(title.passed);
        assert_eq!(title.tier, RuleTier::Critical);
    }

    #[test]
    fn test_rule_fails_without_evidence() {
        // No signals at all: compliance cannot be confirmed for any rule
        let agg = aggregate(&[]);
        let findings = validate_all(&agg);
        assert!(findings.iter().all(|f| !f.passed));
    }

    #[test]
    fn test_count_failed_by_tier() {
        let agg = aggregate(&[
            bundle("title", "title", serde_json::json!({ "present": true })),
            bundle(
                "content",
                "content_length",
                serde_json::json!({ "word_count": 500 }),
            ),
        ]);
        let findings = validate_all(&agg);
        let (critical, important, enhancement) = count_failed_by_tier(&findings);

        // Both critical rules pass; the rest fail for lack of evidence
        assert_eq!(critical, 0);
        assert_eq!(important, 4);
        assert_eq!(enhancement, 2);
    }
}
