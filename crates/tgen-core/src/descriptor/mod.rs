//! The in-memory model of a test descriptor.
//!
//! A descriptor is one named test case: the grammar under test, its input,
//! and what the generated lexer/parser is expected to print.

mod error;
mod parser;
mod writer;

pub use error::DescriptorError;
pub use parser::parse;
#[cfg(test)]
pub(crate) use parser::grammar_name;

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The kind of grammar a test exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarType {
    Lexer,
    Parser,
    CompositeLexer,
    CompositeParser,
}

impl GrammarType {
    /// Returns true if the test needs a parser next to the lexer.
    pub fn is_parser(&self) -> bool {
        matches!(self, GrammarType::Parser | GrammarType::CompositeParser)
    }

    /// Returns the name used in descriptor files.
    pub fn as_str(&self) -> &'static str {
        match self {
            GrammarType::Lexer => "Lexer",
            GrammarType::Parser => "Parser",
            GrammarType::CompositeLexer => "CompositeLexer",
            GrammarType::CompositeParser => "CompositeParser",
        }
    }
}

impl FromStr for GrammarType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Lexer" => Ok(GrammarType::Lexer),
            "Parser" => Ok(GrammarType::Parser),
            "CompositeLexer" => Ok(GrammarType::CompositeLexer),
            "CompositeParser" => Ok(GrammarType::CompositeParser),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for GrammarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ambiguity resolution strategy used by the generated parser at run time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PredictionMode {
    Sll,
    #[default]
    Ll,
    LlExactAmbigDetection,
}

impl PredictionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionMode::Sll => "SLL",
            PredictionMode::Ll => "LL",
            PredictionMode::LlExactAmbigDetection => "LL_EXACT_AMBIG_DETECTION",
        }
    }
}

impl FromStr for PredictionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SLL" => Ok(PredictionMode::Sll),
            "LL" => Ok(PredictionMode::Ll),
            "LL_EXACT_AMBIG_DETECTION" => Ok(PredictionMode::LlExactAmbigDetection),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An auxiliary grammar imported by the main grammar of a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaveGrammar {
    /// Declared grammar name, also the file stem.
    pub name: String,
    /// Template text of the grammar.
    pub text: String,
}

/// One test case, as read from a descriptor file or defined in code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDescriptor {
    /// Unique within its group, derived from the file name.
    pub name: String,
    pub test_type: GrammarType,
    pub notes: String,
    /// Declared name of the main grammar.
    pub grammar_name: String,
    /// Grammar template text, rendered before use.
    pub grammar: String,
    /// Imported grammars, in emission order.
    pub slave_grammars: Vec<SlaveGrammar>,
    /// Rule at which parsing starts.
    pub start_rule: Option<String>,
    /// Text fed to the generated lexer/parser.
    pub input: String,
    /// Expected output. Empty if nothing is expected.
    pub output: String,
    /// Expected errors. Empty if nothing is expected.
    pub errors: String,
    /// For lexer tests, dump the DFA of the default lexer mode.
    pub show_dfa: bool,
    /// For parser tests, engage the diagnostic error listener.
    pub show_diagnostic_errors: bool,
    pub trace_atn: bool,
    pub prediction_mode: PredictionMode,
    pub build_parse_tree: bool,
    /// Targets this test is known not to work with.
    pub skip_targets: BTreeSet<String>,
    /// Originating file, if any.
    pub path: Option<PathBuf>,
}

impl TestDescriptor {
    /// Creates a descriptor with default flags and no expectations.
    pub fn new(
        name: impl Into<String>,
        test_type: GrammarType,
        grammar_name: impl Into<String>,
        grammar: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            test_type,
            notes: String::new(),
            grammar_name: grammar_name.into(),
            grammar: grammar.into(),
            slave_grammars: Vec::new(),
            start_rule: None,
            input: String::new(),
            output: String::new(),
            errors: String::new(),
            show_dfa: false,
            show_diagnostic_errors: false,
            trace_atn: false,
            prediction_mode: PredictionMode::default(),
            build_parse_tree: true,
            skip_targets: BTreeSet::new(),
            path: None,
        }
    }

    /// Returns true if the given target is listed in the skip set.
    pub fn skips(&self, target: &str) -> bool {
        self.skip_targets.contains(target)
    }

    /// Serializes the descriptor back into descriptor text.
    pub fn to_descriptor_text(&self) -> String {
        writer::write(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_type_round_trips_names() {
        for ty in [
            GrammarType::Lexer,
            GrammarType::Parser,
            GrammarType::CompositeLexer,
            GrammarType::CompositeParser,
        ] {
            assert_eq!(ty.as_str().parse::<GrammarType>(), Ok(ty));
        }
        assert!("lexer".parse::<GrammarType>().is_err());
    }

    #[test]
    fn test_parser_family() {
        assert!(GrammarType::Parser.is_parser());
        assert!(GrammarType::CompositeParser.is_parser());
        assert!(!GrammarType::Lexer.is_parser());
        assert!(!GrammarType::CompositeLexer.is_parser());
    }

    #[test]
    fn test_prediction_mode_default_is_ll() {
        assert_eq!(PredictionMode::default(), PredictionMode::Ll);
        assert_eq!(
            "LL_EXACT_AMBIG_DETECTION".parse::<PredictionMode>(),
            Ok(PredictionMode::LlExactAmbigDetection)
        );
    }
}
