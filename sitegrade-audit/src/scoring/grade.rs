//! Letter grade mapping
//!
//! Fixed, non-overlapping, descending table of inclusive ranges. Lookup is a
//! linear scan in descending order, first match wins; a score outside all
//! ranges maps to the lowest grade.

use serde::{Deserialize, Serialize};

/// Letter grade for an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    APlus,
    A,
    BPlus,
    B,
    CPlus,
    C,
    D,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Descending (lower bound, grade) table covering [0, 100]
const GRADE_TABLE: [(f64, Grade); 8] = [
    (95.0, Grade::APlus),
    (90.0, Grade::A),
    (85.0, Grade::BPlus),
    (80.0, Grade::B),
    (75.0, Grade::CPlus),
    (70.0, Grade::C),
    (60.0, Grade::D),
    (0.0, Grade::F),
];

/// Map a score to its letter grade
pub fn grade_for(score: f64) -> Grade {
    for (lower_bound, grade) in GRADE_TABLE {
        if score >= lower_bound {
            return grade;
        }
    }
    Grade::F
}
