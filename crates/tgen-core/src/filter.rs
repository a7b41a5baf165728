//! Include/exclude filtering of tests by group and test name.
//!
//! Patterns are regular expressions searched anywhere in the name, so
//! anchors must be spelled out (`^Lexer$`). Evaluation order:
//!
//! 1. group excludes
//! 2. group includes
//! 3. test excludes
//! 4. test includes
//!
//! Excludes win over includes at the same scope, and the group scope is
//! decided before the test scope. An empty list places no constraint.

use regex::Regex;
use thiserror::Error;

/// Errors raised while compiling the filter.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// The four pattern lists of a configuration, as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatterns {
    pub group_includes: Vec<String>,
    pub group_excludes: Vec<String>,
    pub test_includes: Vec<String>,
    pub test_excludes: Vec<String>,
}

impl FilterPatterns {
    /// Compiles every list, failing on the first broken pattern.
    pub fn compile(&self) -> Result<PatternFilter, FilterError> {
        Ok(PatternFilter {
            group_includes: compile_all(&self.group_includes)?,
            group_excludes: compile_all(&self.group_excludes)?,
            test_includes: compile_all(&self.test_includes)?,
            test_excludes: compile_all(&self.test_excludes)?,
        })
    }

    /// Returns true if no pattern is configured at all.
    pub fn is_empty(&self) -> bool {
        self.group_includes.is_empty()
            && self.group_excludes.is_empty()
            && self.test_includes.is_empty()
            && self.test_excludes.is_empty()
    }
}

/// Compiled include/exclude patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    group_includes: Vec<Regex>,
    group_excludes: Vec<Regex>,
    test_includes: Vec<Regex>,
    test_excludes: Vec<Regex>,
}

impl PatternFilter {
    /// Decides whether the test `test` of group `group` is generated.
    pub fn included(&self, group: &str, test: &str) -> bool {
        if matches_any(group, &self.group_excludes) {
            return false;
        }

        if !self.group_includes.is_empty() && !matches_any(group, &self.group_includes) {
            return false;
        }

        if matches_any(test, &self.test_excludes) {
            return false;
        }

        self.test_includes.is_empty() || matches_any(test, &self.test_includes)
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, FilterError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

fn matches_any(name: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|re| re.is_match(name))
}
