use std::path::PathBuf;
use thiserror::Error;

/// The ways a descriptor text can be malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("{file}: missing required section [{section}]")]
    MissingSection { file: PathBuf, section: &'static str },

    #[error("{file}: section [{section}] appears more than once")]
    DuplicateSection { file: PathBuf, section: String },

    #[error("{file}: text before the first section header at line {line}")]
    StrayText { file: PathBuf, line: usize },

    #[error("{file}: unknown test type `{value}`")]
    UnknownType { file: PathBuf, value: String },

    #[error("{file}: unknown flag `{flag}`")]
    UnknownFlag { file: PathBuf, flag: String },

    #[error("{file}: flag `{flag}` has a non-boolean value `{value}`")]
    InvalidFlagValue {
        file: PathBuf,
        flag: String,
        value: String,
    },

    #[error("{file}: unknown prediction mode `{value}`")]
    UnknownPredictionMode { file: PathBuf, value: String },

    #[error("{file}: no grammar declaration found in [{section}]")]
    MissingGrammarName { file: PathBuf, section: &'static str },
}

impl DescriptorError {
    /// The descriptor file the error was found in.
    pub fn file(&self) -> &PathBuf {
        match self {
            DescriptorError::MissingSection { file, .. }
            | DescriptorError::DuplicateSection { file, .. }
            | DescriptorError::StrayText { file, .. }
            | DescriptorError::UnknownType { file, .. }
            | DescriptorError::UnknownFlag { file, .. }
            | DescriptorError::InvalidFlagValue { file, .. }
            | DescriptorError::UnknownPredictionMode { file, .. }
            | DescriptorError::MissingGrammarName { file, .. } => file,
        }
    }
}
