//! Recommendation records and merging

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Coarse effort estimate for acting on a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatedEffort {
    Minutes,
    Hours,
    Days,
}

/// One actionable recommendation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub title: String,
    pub description: String,
    pub estimated_effort: Option<EstimatedEffort>,
}

/// Merge recommendation lists, deduplicating by `(category, title)`
///
/// Earlier lists win on collision (engine-derived recommendations take
/// precedence over enhancement-derived ones). The merged list is sorted by
/// priority, then category for stable output.
pub fn merge_deduped(lists: Vec<Vec<Recommendation>>) -> Vec<Recommendation> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut merged = Vec::new();

    for list in lists {
        for rec in list {
            let key = (rec.category.clone(), rec.title.clone());
            if seen.insert(key) {
                merged.push(rec);
            }
        }
    }

    merged.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.category.cmp(&b.category))
    });
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(priority: Priority, category: &str, title: &str) -> Recommendation {
        Recommendation {
            priority,
            category: category.to_string(),
            title: title.to_string(),
            description: String::new(),
            estimated_effort: None,
        }
    }

    #[test]
    fn test_dedup_by_category_and_title() {
        let merged = merge_deduped(vec![
            vec![rec(Priority::High, "content", "Add a title")],
            vec![
                rec(Priority::Low, "content", "Add a title"), // duplicate, dropped
                rec(Priority::Low, "technical", "Add a title"), // different category, kept
            ],
        ]);

        assert_eq!(merged.len(), 2);
        // The first occurrence wins, keeping its priority
        assert_eq!(merged[0].priority, Priority::High);
        assert_eq!(merged[0].category, "content");
    }

    #[test]
    fn test_sorted_by_priority() {
        let merged = merge_deduped(vec![vec![
            rec(Priority::Low, "a", "x"),
            rec(Priority::High, "b", "y"),
            rec(Priority::Medium, "c", "z"),
        ]]);

        assert_eq!(merged[0].priority, Priority::High);
        assert_eq!(merged[1].priority, Priority::Medium);
        assert_eq!(merged[2].priority, Priority::Low);
    }
}
