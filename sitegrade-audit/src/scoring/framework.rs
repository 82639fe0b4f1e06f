//! Static scoring framework
//!
//! The weighted category tree is defined once at startup and validated
//! before any run: sibling weights must sum to 1.0 within tolerance. A
//! malformed table is a startup configuration error, never a runtime one.

use serde::Serialize;
use sitegrade_common::{Error, Result};

use crate::scoring::recommendations::Recommendation;

/// Tolerance for sibling-weight normalization checks
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// One node of the static framework definition
#[derive(Debug, Clone)]
pub struct CategorySpec {
    pub name: &'static str,
    /// Weight relative to siblings (0 < w <= 1)
    pub weight: f64,
    pub children: Vec<CategorySpec>,
}

impl CategorySpec {
    fn leaf(name: &'static str, weight: f64) -> Self {
        Self {
            name,
            weight,
            children: Vec::new(),
        }
    }

    fn branch(name: &'static str, weight: f64, children: Vec<CategorySpec>) -> Self {
        Self {
            name,
            weight,
            children,
        }
    }
}

/// The static scoring framework
#[derive(Debug, Clone)]
pub struct ScoringFramework {
    root: CategorySpec,
}

impl ScoringFramework {
    /// Standard page-quality framework
    ///
    /// Leaf names match the categories declared by the built-in detectors.
    pub fn standard() -> Self {
        Self {
            root: CategorySpec::branch(
                "page_quality",
                1.0,
                vec![
                    CategorySpec::branch(
                        "content",
                        0.40,
                        vec![
                            CategorySpec::leaf("title", 0.25),
                            CategorySpec::leaf("meta_description", 0.15),
                            CategorySpec::leaf("content_length", 0.35),
                            CategorySpec::leaf("heading_outline", 0.25),
                        ],
                    ),
                    CategorySpec::branch(
                        "technical",
                        0.35,
                        vec![
                            CategorySpec::leaf("load_timing", 0.6),
                            CategorySpec::leaf("canonical", 0.4),
                        ],
                    ),
                    CategorySpec::branch(
                        "structure",
                        0.25,
                        vec![
                            CategorySpec::leaf("image_alt", 0.5),
                            CategorySpec::leaf("link_profile", 0.5),
                        ],
                    ),
                ],
            ),
        }
    }

    /// Build a framework from a custom root spec
    pub fn new(root: CategorySpec) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &CategorySpec {
        &self.root
    }

    /// Validate the weight table
    ///
    /// Checks, for every node: weight in (0, 1], and children's weights sum
    /// to 1.0 within [`WEIGHT_TOLERANCE`].
    pub fn validate(&self) -> Result<()> {
        validate_node(&self.root)
    }

    /// Leaf category names in tree order
    pub fn leaf_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        collect_leaves(&self.root, &mut names);
        names
    }
}

fn validate_node(spec: &CategorySpec) -> Result<()> {
    if spec.weight <= 0.0 || spec.weight > 1.0 {
        return Err(Error::Config(format!(
            "category '{}' has weight {} outside (0, 1]",
            spec.name, spec.weight
        )));
    }

    if !spec.children.is_empty() {
        let sum: f64 = spec.children.iter().map(|c| c.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(Error::Config(format!(
                "children of '{}' have weights summing to {} (expected 1.0)",
                spec.name, sum
            )));
        }
        for child in &spec.children {
            validate_node(child)?;
        }
    }

    Ok(())
}

fn collect_leaves(spec: &CategorySpec, out: &mut Vec<&'static str>) {
    if spec.children.is_empty() {
        out.push(spec.name);
    } else {
        for child in &spec.children {
            collect_leaves(child, out);
        }
    }
}

// ============================================================================
// Runtime score tree
// ============================================================================

/// One node of the populated score tree for a single run
///
/// Built once per run from the framework plus aggregated data; never mutated
/// after scoring completes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryNode {
    pub name: String,
    pub weight: f64,
    /// Score in [0, 100]; `None` when no applicable signal was present
    pub score: Option<f64>,
    pub children: Vec<CategoryNode>,
    pub issues: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

impl CategoryNode {
    /// Find a node by name anywhere in the subtree
    pub fn find(&self, name: &str) -> Option<&CategoryNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Visit all leaves in tree order
    pub fn for_each_leaf(&self, f: &mut impl FnMut(&CategoryNode)) {
        if self.children.is_empty() {
            f(self);
        } else {
            for child in &self.children {
                child.for_each_leaf(f);
            }
        }
    }
}
