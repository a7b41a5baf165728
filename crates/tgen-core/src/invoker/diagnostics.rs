use regex::Regex;

use super::{GenerationOutcome, InvokeError, ToolOutput};
use crate::config::{DEFAULT_BENIGN_DIAGNOSTICS, ERROR_PREFIX, WARNING_PREFIX};

/// What a line of tool output means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Runtime chatter that says nothing about the grammar.
    Benign,
    Warning,
    Error,
}

/// Non-benign tool output, split by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Sorts generator output lines into benign, warning and error.
#[derive(Debug, Clone)]
pub struct DiagnosticFilter {
    benign: Vec<Regex>,
}

impl DiagnosticFilter {
    /// The built-in benign patterns plus `extra`.
    pub fn new(extra: &[String]) -> Result<Self, InvokeError> {
        let benign = DEFAULT_BENIGN_DIAGNOSTICS
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str))
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| InvokeError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { benign })
    }

    pub fn kind(&self, line: &str) -> LineKind {
        let line = line.trim();
        if line.is_empty() || self.benign.iter().any(|re| re.is_match(line)) {
            LineKind::Benign
        } else if line.starts_with(WARNING_PREFIX) {
            LineKind::Warning
        } else {
            LineKind::Error
        }
    }

    /// Splits `text` into warning and error lines, dropping benign ones.
    pub fn partition(&self, text: &str) -> Diagnostics {
        let mut diagnostics = Diagnostics::default();
        for line in text.lines() {
            match self.kind(line) {
                LineKind::Benign => {}
                LineKind::Warning => diagnostics.warnings.push(line.trim_end().to_string()),
                LineKind::Error => diagnostics.errors.push(line.trim_end().to_string()),
            }
        }
        diagnostics
    }

    /// Like `partition`, but only `error(` lines count as errors. Anything
    /// else the tool prints to stdout is progress or info output.
    pub fn partition_stdout(&self, text: &str) -> Diagnostics {
        let mut diagnostics = Diagnostics::default();
        for line in text.lines() {
            match self.kind(line) {
                LineKind::Benign => {}
                LineKind::Warning => diagnostics.warnings.push(line.trim_end().to_string()),
                LineKind::Error if line.trim_start().starts_with(ERROR_PREFIX) => {
                    diagnostics.errors.push(line.trim_end().to_string())
                }
                LineKind::Error => log::debug!("generator: {}", line.trim_end()),
            }
        }
        diagnostics
    }

    /// A run succeeds when the tool exits cleanly and no error line is left.
    pub fn classify(&self, output: &ToolOutput) -> GenerationOutcome {
        let mut diagnostics = self.partition_stdout(&output.stdout);
        let from_stderr = self.partition(&output.stderr);
        diagnostics.warnings.extend(from_stderr.warnings);
        diagnostics.errors.extend(from_stderr.errors);

        if output.success && diagnostics.errors.is_empty() {
            return GenerationOutcome::Succeeded {
                warnings: diagnostics.warnings,
            };
        }

        let mut lines = diagnostics.errors;
        lines.extend(diagnostics.warnings);
        if lines.is_empty() {
            lines.push("generator exited with a failure status".to_string());
        }
        GenerationOutcome::Failed { diagnostics: lines }
    }
}
