//! Configuration management for tgen.
//!
//! One configuration file describes one target language. It is loaded from
//! JSON (or TOML, chosen by file extension) and then adjusted by environment
//! variables:
//! 1. Environment variables (highest priority)
//! 2. The configuration file
//! 3. Built-in defaults (lowest priority)
//!
//! All relative paths in the file are resolved against the directory that
//! contains it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;

pub use defaults::*;

use crate::filter::{FilterError, FilterPatterns, PatternFilter};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse config file: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A support file (or folder) to copy into the output tree after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Glob pattern, relative to the configuration directory.
    pub source_pattern: String,

    /// Destination folder. Falls back to the output root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// The language identifier as registered with the parser generator.
    pub language: String,

    /// The file extension to use for the generated harness file.
    pub target_extension: String,

    /// Template of the harness file that is generated for each test case.
    pub spec_template_file: String,

    /// Template group with the target specific grammar fragments.
    pub grammar_template_file: String,

    /// Where to store the generated test cases (default: `tests`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,

    /// Base name of the generated harness file (default: `Test`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_file_name: Option<String>,

    /// Annotation pair for enabled and disabled tests, in that order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_annotations: Option<[String; 2]>,

    /// Groups to include. Empty means all groups.
    #[serde(default)]
    pub group_includes: Vec<String>,

    /// Groups to exclude. Wins over `group_includes`.
    #[serde(default)]
    pub group_excludes: Vec<String>,

    /// Tests to include. Empty means all tests.
    #[serde(default)]
    pub test_includes: Vec<String>,

    /// Tests to exclude. Wins over `test_includes`.
    #[serde(default)]
    pub test_excludes: Vec<String>,

    /// Files to copy after the generation.
    #[serde(default)]
    pub files: Vec<FileEntry>,

    /// Root of the descriptor library (default: `resources/descriptors`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptors_path: Option<String>,

    /// Command line used to run the parser generator (default: `antlr-ng`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<Vec<String>>,

    /// Additional regexes for tool output that must not fail a test.
    #[serde(default)]
    pub benign_diagnostics: Vec<String>,

    /// Directory the relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Config {
    /// Load configuration from a specific file.
    ///
    /// Files ending in `.toml` are read as TOML, everything else as JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = if path.extension().is_some_and(|e| e == "toml") {
            Self::from_toml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };
        config.base_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a JSON document without touching the environment.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parses a TOML document without touching the environment.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(command) = std::env::var(ENV_GENERATOR) {
            let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
            if !parts.is_empty() {
                self.generator = Some(parts);
            }
        }
        if let Ok(target) = std::env::var(ENV_TARGET_PATH) {
            self.target_path = Some(target);
        }
    }

    /// Checks the constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("language", &self.language),
            ("targetExtension", &self.target_extension),
            ("specTemplateFile", &self.spec_template_file),
            ("grammarTemplateFile", &self.grammar_template_file),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("`{}` must not be empty", key)));
            }
        }

        if self.target_extension.starts_with('.') {
            return Err(ConfigError::Invalid(
                "`targetExtension` is given without the leading dot".to_string(),
            ));
        }

        if matches!(&self.test_file_name, Some(name) if name.trim().is_empty()) {
            return Err(ConfigError::Invalid("`testFileName` must not be empty".to_string()));
        }

        if matches!(&self.generator, Some(command) if command.is_empty()) {
            return Err(ConfigError::Invalid("`generator` needs at least a program".to_string()));
        }

        if let Some(entry) = self.files.iter().find(|e| e.source_pattern.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "file entry with target {:?} has an empty `sourcePattern`",
                entry.target_path
            )));
        }

        Ok(())
    }

    /// Resolves a path from the configuration file against its directory.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.base_dir.join(relative)
    }

    /// Root folder of the generated test tree.
    pub fn target_root(&self) -> PathBuf {
        self.resolve(self.target_path.as_deref().unwrap_or(DEFAULT_TARGET_PATH))
    }

    /// Root folder of the descriptor library.
    pub fn descriptors_root(&self) -> PathBuf {
        self.resolve(
            self.descriptors_path
                .as_deref()
                .unwrap_or(DEFAULT_DESCRIPTORS_PATH),
        )
    }

    /// Full path of the harness template.
    pub fn spec_template_path(&self) -> PathBuf {
        self.resolve(&self.spec_template_file)
    }

    /// Full path of the grammar template group.
    pub fn grammar_template_path(&self) -> PathBuf {
        self.resolve(&self.grammar_template_file)
    }

    /// File name of the harness, e.g. `Test.java`.
    pub fn harness_file_name(&self) -> String {
        format!(
            "{}.{}",
            self.test_file_name.as_deref().unwrap_or(DEFAULT_TEST_FILE_NAME),
            self.target_extension
        )
    }

    /// Get the generator command, falling back to the default.
    pub fn generator_or_default(&self) -> Vec<String> {
        self.generator.clone().unwrap_or_else(|| {
            DEFAULT_GENERATOR_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect()
        })
    }

    /// The annotation for a test, depending on whether this target skips it.
    pub fn annotation(&self, skipped: bool) -> &str {
        match &self.test_annotations {
            Some([enabled, disabled]) => {
                if skipped {
                    disabled
                } else {
                    enabled
                }
            }
            None => "",
        }
    }

    /// The include/exclude pattern lists of this configuration.
    pub fn filter_patterns(&self) -> FilterPatterns {
        FilterPatterns {
            group_includes: self.group_includes.clone(),
            group_excludes: self.group_excludes.clone(),
            test_includes: self.test_includes.clone(),
            test_excludes: self.test_excludes.clone(),
        }
    }

    /// Compiles the include/exclude filter for this configuration.
    pub fn pattern_filter(&self) -> Result<PatternFilter, FilterError> {
        self.filter_patterns().compile()
    }
}
