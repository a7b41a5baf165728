//! The generation pipeline.
//!
//! For every admitted test the generator renders the grammars, runs the
//! parser generator on them and writes the harness plus the input file into
//! `<target>/<group>/<test>/`. The first failing test stops the run.

mod progress;
mod stage;

pub use progress::{NoProgress, Progress};
pub use stage::Stage;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::config::{Config, GRAMMAR_EXTENSION, INPUT_FILE_NAME};
use crate::descriptor::TestDescriptor;
use crate::filter::{FilterError, PatternFilter};
use crate::harness;
use crate::invoker::{DiagnosticFilter, GenerationOutcome, GeneratorTool, InvokeError, Invoker};
use crate::naming::GrammarNames;
use crate::template::{Attributes, TemplateError, TemplateGroup};

/// What can go wrong while generating one test.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error("Generator reported {} problem(s)", diagnostics.len())]
    GeneratorFailed { diagnostics: Vec<String> },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenerationError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerationError::Io {
            path: path.into(),
            source,
        }
    }

    /// Tool output explaining a generator failure, if any.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            GenerationError::GeneratorFailed { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

/// The failure that stopped a run.
#[derive(Debug, Error)]
#[error("{group} > {test}: failed while {stage}: {error}")]
pub struct GenerationFailure {
    pub group: String,
    pub test: String,
    pub stage: Stage,
    #[source]
    pub error: GenerationError,
}

/// Counts of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tests written to disk.
    pub generated: usize,
    /// Tests rejected by the include/exclude patterns.
    pub filtered: usize,
    /// Warning lines reported by the generator.
    pub warnings: usize,
}

/// Result of [`Generator::run`].
#[derive(Debug)]
pub enum RunOutcome {
    Succeeded(RunSummary),
    Failed(GenerationFailure),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded(_))
    }
}

/// A test that passed the filter.
#[derive(Debug, Clone, Copy)]
pub struct PlannedTest<'c> {
    pub group: &'c str,
    pub descriptor: &'c TestDescriptor,
}

/// Per test values derived before the generator runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Rendered main grammar.
    pub grammar: String,
    pub names: GrammarNames,
}

impl GenerationOptions {
    pub fn use_listener(&self) -> bool {
        self.names.use_listener()
    }

    pub fn use_visitor(&self) -> bool {
        self.names.use_visitor()
    }
}

/// A failed step, before it is tied to a test.
struct StageError {
    stage: Stage,
    error: GenerationError,
}

fn at<E: Into<GenerationError>>(stage: Stage) -> impl FnOnce(E) -> StageError {
    move |error| StageError {
        stage,
        error: error.into(),
    }
}

/// Drives the generation of a catalog for one target language.
pub struct Generator {
    config: Config,
    filter: PatternFilter,
    invoker: Invoker,
    grammar_templates: Arc<TemplateGroup>,
    harness_template: String,
}

impl Generator {
    /// Creates a generator, loading both templates named in the configuration.
    pub fn new(config: Config, tool: Box<dyn GeneratorTool>) -> Result<Self, GenerationError> {
        let grammar_templates = TemplateGroup::from_file(config.grammar_template_path())?;
        let harness_path = config.spec_template_path();
        let harness_template = std::fs::read_to_string(&harness_path)
            .map_err(|e| GenerationError::io(&harness_path, e))?;

        Self::with_templates(config, tool, grammar_templates, harness_template)
    }

    /// Creates a generator from templates that are already loaded.
    pub fn with_templates(
        config: Config,
        tool: Box<dyn GeneratorTool>,
        grammar_templates: TemplateGroup,
        harness_template: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let diagnostics = DiagnosticFilter::new(&config.benign_diagnostics)?;
        let invoker = Invoker::new(tool, config.language.clone(), diagnostics);

        Ok(Self {
            filter: config.pattern_filter()?,
            config,
            invoker,
            grammar_templates: Arc::new(grammar_templates),
            harness_template: harness_template.into(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The tests of `catalog` that pass the include/exclude patterns, in
    /// generation order.
    pub fn plan<'c>(&self, catalog: &'c Catalog) -> Vec<PlannedTest<'c>> {
        let mut planned = Vec::new();
        for (group, tests) in catalog.groups() {
            for descriptor in tests {
                if self.filter.included(group, &descriptor.name) {
                    planned.push(PlannedTest { group, descriptor });
                } else {
                    log::debug!("Filtered out {} > {}", group, descriptor.name);
                }
            }
        }
        planned
    }

    /// Generates every admitted test, stopping at the first failure.
    pub fn run(&self, catalog: &Catalog, progress: &dyn Progress) -> RunOutcome {
        let planned = self.plan(catalog);

        let total = planned.len();
        progress.planned(total);
        log::info!("Generating {} of {} tests for {}", total, catalog.len(), self.config.language);

        let root = self.config.target_root();
        let initial = RunSummary {
            filtered: catalog.len() - total,
            ..RunSummary::default()
        };

        let result = planned
            .iter()
            .enumerate()
            .try_fold(initial, |mut summary, (index, test)| {
                let name = test.descriptor.name.as_str();
                progress.started(index + 1, total, test.group, name);

                let warnings = self
                    .generate(test.group, test.descriptor, &root)
                    .map_err(|failed| GenerationFailure {
                        group: test.group.to_string(),
                        test: name.to_string(),
                        stage: failed.stage,
                        error: failed.error,
                    })?;

                if !warnings.is_empty() {
                    for line in &warnings {
                        log::warn!("{} > {}: {}", test.group, name, line);
                    }
                    progress.warned(test.group, name, &warnings);
                    summary.warnings += warnings.len();
                }

                summary.generated += 1;
                progress.finished(test.group, name);
                Ok::<_, GenerationFailure>(summary)
            });

        match result {
            Ok(summary) => RunOutcome::Succeeded(summary),
            Err(failure) => {
                log::debug!("Run stopped: {}", failure);
                RunOutcome::Failed(failure)
            }
        }
    }

    /// Renders the main grammar and resolves the names of one test.
    pub fn options(&self, descriptor: &TestDescriptor) -> Result<GenerationOptions, TemplateError> {
        let grammar = self.render_grammar(&descriptor.grammar)?;
        Ok(GenerationOptions {
            grammar,
            names: GrammarNames::for_descriptor(descriptor),
        })
    }

    fn render_grammar(&self, text: &str) -> Result<String, TemplateError> {
        TemplateGroup::importing(Arc::clone(&self.grammar_templates)).render_inline(text, &Attributes::new())
    }

    /// Generates one test and returns the generator's warnings.
    fn generate(
        &self,
        group: &str,
        descriptor: &TestDescriptor,
        root: &Path,
    ) -> Result<Vec<String>, StageError> {
        let dir = root.join(group).join(&descriptor.name);
        log::debug!("Generating {} > {} in {}", group, descriptor.name, dir.display());

        std::fs::create_dir_all(&dir)
            .map_err(|e| GenerationError::io(&dir, e))
            .map_err(at(Stage::Emitting))?;

        for slave in &descriptor.slave_grammars {
            let text = self.render_grammar(&slave.text).map_err(at(Stage::Rendering))?;
            write(&dir, &grammar_file_name(&slave.name), &text)?;
        }

        let options = self.options(descriptor).map_err(at(Stage::Rendering))?;
        let grammar_file = write(&dir, &grammar_file_name(&descriptor.grammar_name), &options.grammar)?;

        let mut extra = Vec::new();
        if options.use_visitor() {
            extra.push("-v".to_string());
        }

        let outcome = self
            .invoker
            .invoke(&dir, &grammar_file, &extra)
            .map_err(at(Stage::Invoking))?;
        let warnings = match outcome {
            GenerationOutcome::Succeeded { warnings } => warnings,
            GenerationOutcome::Failed { diagnostics } => {
                return Err(at(Stage::Invoking)(GenerationError::GeneratorFailed { diagnostics }))
            }
        };

        let attributes = harness::attributes(&self.config, descriptor, &options.names);
        let harness = TemplateGroup::new()
            .render_inline(&self.harness_template, &attributes)
            .map_err(at(Stage::Rendering))?;
        write(&dir, &self.config.harness_file_name(), &harness)?;
        write(&dir, INPUT_FILE_NAME, &descriptor.input)?;

        Ok(warnings)
    }
}

fn grammar_file_name(name: &str) -> String {
    format!("{}.{}", name, GRAMMAR_EXTENSION)
}

fn write(dir: &Path, name: &str, content: &str) -> Result<PathBuf, StageError> {
    let path = dir.join(name);
    std::fs::write(&path, content)
        .map_err(|e| GenerationError::io(&path, e))
        .map_err(at(Stage::Emitting))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::ToolOutput;

    struct Silent;

    impl GeneratorTool for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        fn run(&self, _args: &[String], _work_dir: &Path) -> Result<ToolOutput, std::io::Error> {
            Ok(ToolOutput {
                success: true,
                ..ToolOutput::default()
            })
        }
    }

    fn generator() -> Generator {
        let config = Config::from_json_str(
            r#"{
                "language": "Java",
                "targetExtension": "java",
                "specTemplateFile": "Test.java.stg",
                "grammarTemplateFile": "Java.test.stg"
            }"#,
        )
        .unwrap();
        let group = TemplateGroup::parse("writeln(s) ::= <<System.out.println(<s>);>>", "Java.test.stg").unwrap();
        Generator::with_templates(config, Box::new(Silent), group, "<grammarName>").unwrap()
    }

    #[test]
    fn test_options_render_grammar_templates() {
        let descriptor = TestDescriptor::new(
            "t",
            crate::descriptor::GrammarType::Parser,
            "T",
            "grammar T;\na : 'a' {<writeln(\"\\\"x\\\"\")>};",
        );
        let options = generator().options(&descriptor).unwrap();
        assert_eq!(options.grammar, "grammar T;\na : 'a' {System.out.println(\"x\");};");
        assert!(options.use_listener());
        assert!(options.use_visitor());
    }

    #[test]
    fn test_failure_display() {
        let failure = GenerationFailure {
            group: "Lexer".to_string(),
            test: "simple".to_string(),
            stage: Stage::Invoking,
            error: GenerationError::GeneratorFailed {
                diagnostics: vec!["error(50): bad".to_string()],
            },
        };
        assert_eq!(
            failure.to_string(),
            "Lexer > simple: failed while invoking the generator: Generator reported 1 problem(s)"
        );
        assert_eq!(failure.error.diagnostics().len(), 1);
    }
}
