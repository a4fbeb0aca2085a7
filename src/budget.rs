//! Script size against the in-game character limit.

use std::fmt;

use serde::Serialize;

/// Characters a programmable block accepts.
pub const BUDGET_CEILING: usize = 100_000;

/// Length of a generated script, measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetReport {
    pub length: usize,
    pub ceiling: usize,
}

impl BudgetReport {
    pub fn new(script: &str) -> Self {
        Self::with_ceiling(script, BUDGET_CEILING)
    }

    pub fn with_ceiling(script: &str, ceiling: usize) -> Self {
        Self {
            length: script.chars().count(),
            ceiling,
        }
    }

    /// The script is too long to paste. Advisory only.
    pub fn exceeds(&self) -> bool {
        self.length > self.ceiling
    }
}

impl fmt::Display for BudgetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.length, self.ceiling)
    }
}
