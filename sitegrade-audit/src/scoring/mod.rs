//! Rules & Scoring Engine
//!
//! Computes the weighted hierarchical score from aggregated signals, runs
//! compliance validation, maps the overall score to a letter grade, and
//! derives recommendations.
//!
//! # Score propagation
//! Leaves take their score from aggregated signals where available, else
//! null. A parent's score is the weight-normalized average over children with
//! a non-null score, re-normalized over only that subset: absent children do
//! not count as zero and do not count as 100. If no child has a score the
//! parent is null too. Overall score is the root's score, or 0 when the root
//! is null (hard floor, not an error).

pub mod compliance;
pub mod framework;
pub mod grade;
pub mod recommendations;

use crate::aggregation::AggregatedSignals;
use compliance::{ComplianceFinding, RuleTier};
use framework::{CategoryNode, CategorySpec, ScoringFramework};
use grade::{grade_for, Grade};
use recommendations::{merge_deduped, EstimatedEffort, Priority, Recommendation};
use sitegrade_common::Result;

/// Complete output of the scoring engine for one run
#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub overall_score: f64,
    pub grade: Grade,
    pub score_tree: CategoryNode,
    pub findings: Vec<ComplianceFinding>,
    pub recommendations: Vec<Recommendation>,
}

/// The scoring engine
///
/// Holds the validated static framework; `score()` is a pure function of the
/// aggregated signals and cannot fail (null-safe arithmetic throughout).
pub struct ScoringEngine {
    framework: ScoringFramework,
    acceptable_leaf_score: f64,
}

impl ScoringEngine {
    /// Create an engine over the given framework
    ///
    /// # Errors
    /// Returns `Error::Config` when the framework weight table is malformed
    /// (startup-time validation; scoring itself never fails).
    pub fn new(framework: ScoringFramework, acceptable_leaf_score: f64) -> Result<Self> {
        framework.validate()?;
        Ok(Self {
            framework,
            acceptable_leaf_score: acceptable_leaf_score.clamp(0.0, 100.0),
        })
    }

    /// Engine over the standard page-quality framework
    pub fn standard(acceptable_leaf_score: f64) -> Result<Self> {
        Self::new(ScoringFramework::standard(), acceptable_leaf_score)
    }

    /// Score one run's aggregated signals
    pub fn score(&self, agg: &AggregatedSignals) -> ScoreOutcome {
        let score_tree = self.build_node(self.framework.root(), agg);

        let overall_score = round_tenth(score_tree.score.unwrap_or(0.0).clamp(0.0, 100.0));
        let grade = grade_for(overall_score);

        let findings = compliance::validate_all(agg);

        let mut leaf_recs = Vec::new();
        score_tree.for_each_leaf(&mut |leaf| leaf_recs.extend(leaf.recommendations.clone()));
        let finding_recs = recommendations_from_findings(&findings);
        let recommendations = merge_deduped(vec![leaf_recs, finding_recs]);

        tracing::info!(
            overall_score,
            grade = %grade,
            findings = findings.len(),
            recommendations = recommendations.len(),
            gaps = agg.gaps.len(),
            "Scoring complete"
        );

        ScoreOutcome {
            overall_score,
            grade,
            score_tree,
            findings,
            recommendations,
        }
    }

    /// Build the populated score tree bottom-up
    fn build_node(&self, spec: &CategorySpec, agg: &AggregatedSignals) -> CategoryNode {
        if spec.children.is_empty() {
            return self.build_leaf(spec, agg);
        }

        let children: Vec<CategoryNode> = spec
            .children
            .iter()
            .map(|child| self.build_node(child, agg))
            .collect();

        // Weight-normalized average over children with a score, re-normalized
        // over only the non-null subset
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        for child in &children {
            if let Some(score) = child.score {
                weighted_sum += child.weight * score;
                weight_sum += child.weight;
            }
        }
        let score = if weight_sum > 0.0 {
            Some(round_tenth((weighted_sum / weight_sum).clamp(0.0, 100.0)))
        } else {
            None
        };

        CategoryNode {
            name: spec.name.to_string(),
            weight: spec.weight,
            score,
            children,
            issues: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    fn build_leaf(&self, spec: &CategorySpec, agg: &AggregatedSignals) -> CategoryNode {
        let score = agg
            .leaf_score(spec.name)
            .map(|s| round_tenth(s.clamp(0.0, 100.0)));
        let issues = agg.issues(spec.name);

        let mut node_recs = Vec::new();
        if let Some(score) = score {
            if score < self.acceptable_leaf_score {
                node_recs.push(self.leaf_recommendation(spec, score, &issues));
            }
        }

        CategoryNode {
            name: spec.name.to_string(),
            weight: spec.weight,
            score,
            children: Vec::new(),
            issues,
            recommendations: node_recs,
        }
    }

    /// Recommendation for a leaf scoring below the acceptable threshold,
    /// prioritized by the leaf's weight times its score gap
    fn leaf_recommendation(
        &self,
        spec: &CategorySpec,
        score: f64,
        issues: &[String],
    ) -> Recommendation {
        let gap = self.acceptable_leaf_score - score;
        let severity = spec.weight * gap;
        let priority = if severity >= 15.0 {
            Priority::High
        } else if severity >= 5.0 {
            Priority::Medium
        } else {
            Priority::Low
        };

        let description = if issues.is_empty() {
            format!(
                "Scored {:.1} against an acceptable threshold of {:.0}",
                score, self.acceptable_leaf_score
            )
        } else {
            format!(
                "Scored {:.1} against an acceptable threshold of {:.0}: {}",
                score,
                self.acceptable_leaf_score,
                issues.join("; ")
            )
        };

        Recommendation {
            priority,
            category: spec.name.to_string(),
            title: format!("Improve {}", spec.name.replace('_', " ")),
            description,
            estimated_effort: None,
        }
    }
}

/// Recommendations for failed critical/important findings
///
/// Critical failures get the highest priority regardless of the numeric
/// grade; enhancement-tier failures stay findings only.
fn recommendations_from_findings(findings: &[ComplianceFinding]) -> Vec<Recommendation> {
    findings
        .iter()
        .filter(|f| !f.passed)
        .filter_map(|f| {
            let (priority, effort) = match f.tier {
                RuleTier::Critical => (Priority::High, EstimatedEffort::Hours),
                RuleTier::Important => (Priority::Medium, EstimatedEffort::Minutes),
                RuleTier::Enhancement => return None,
            };
            Some(Recommendation {
                priority,
                category: "compliance".to_string(),
                title: f.fix_suggestion.clone(),
                description: f.impact.clone(),
                estimated_effort: Some(effort),
            })
        })
        .collect()
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
