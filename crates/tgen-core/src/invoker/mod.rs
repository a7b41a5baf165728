//! Runs the external parser generator and interprets what it reports.

mod diagnostics;
mod process;

pub use diagnostics::{DiagnosticFilter, Diagnostics, LineKind};
pub use process::ProcessTool;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::DEFAULT_GRAMMAR_ENCODING;

/// Errors that keep the generator from producing an outcome at all.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("Generator command is empty")]
    EmptyCommand,

    #[error("Failed to run `{program}` for {}: {source}", grammar.display())]
    Spawn {
        program: String,
        grammar: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid diagnostic pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Captured result of one tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Something that can turn a grammar file into recognizer sources.
pub trait GeneratorTool {
    /// Human readable name for diagnostics.
    fn name(&self) -> &str;

    /// Runs the tool with `args` in `work_dir` and waits for it.
    fn run(&self, args: &[String], work_dir: &Path) -> Result<ToolOutput, std::io::Error>;
}

/// How a generator run went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Artifacts were written. Warnings are informational.
    Succeeded { warnings: Vec<String> },
    /// The tool failed or reported errors.
    Failed { diagnostics: Vec<String> },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Succeeded { .. })
    }
}

/// Assembles the tool command line for one grammar.
///
/// Options already present in `extra` are not repeated. The grammar file is
/// always the last argument.
pub fn build_arguments(
    work_dir: &Path,
    language: &str,
    grammar_file: &Path,
    extra: &[String],
) -> Vec<String> {
    let mut args: Vec<String> = extra.to_vec();
    let has = |args: &[String], option: &str| {
        args.iter()
            .any(|arg| arg == option || arg.starts_with(&format!("{}=", option)))
    };

    if !has(&args, "-Dlanguage") {
        args.push(format!("-Dlanguage={}", language));
    }

    let dir = work_dir.display().to_string();
    if !has(&args, "-o") {
        args.extend(["-o".to_string(), dir.clone()]);
    }
    if !has(&args, "--lib") {
        args.extend(["--lib".to_string(), dir]);
    }
    if !has(&args, "--encoding") {
        args.extend(["--encoding".to_string(), DEFAULT_GRAMMAR_ENCODING.to_string()]);
    }

    args.push(grammar_file.display().to_string());
    args
}

/// Runs a [`GeneratorTool`] for a target language and classifies the result.
pub struct Invoker {
    tool: Box<dyn GeneratorTool>,
    language: String,
    filter: DiagnosticFilter,
}

impl Invoker {
    pub fn new(tool: Box<dyn GeneratorTool>, language: impl Into<String>, filter: DiagnosticFilter) -> Self {
        Self {
            tool,
            language: language.into(),
            filter,
        }
    }

    /// Generates recognizers for `grammar_file` into `work_dir`.
    pub fn invoke(
        &self,
        work_dir: &Path,
        grammar_file: &Path,
        extra: &[String],
    ) -> Result<GenerationOutcome, InvokeError> {
        let args = build_arguments(work_dir, &self.language, grammar_file, extra);
        log::debug!("{} {}", self.tool.name(), args.join(" "));

        let output = self
            .tool
            .run(&args, work_dir)
            .map_err(|source| InvokeError::Spawn {
                program: self.tool.name().to_string(),
                grammar: grammar_file.to_path_buf(),
                source,
            })?;

        Ok(self.filter.classify(&output))
    }
}
