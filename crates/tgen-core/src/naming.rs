//! Derives the lexer/parser names and the generation mode of a test.

use crate::descriptor::TestDescriptor;

const LEXER_SUFFIX: &str = "Lexer";
const PARSER_SUFFIX: &str = "Parser";

/// The recognizers a test needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarNames {
    /// Pure lexer test.
    LexerOnly { lexer: String },
    /// Lexer and parser generated from one naming root.
    Combined { lexer: String, parser: String },
}

impl GrammarNames {
    /// Resolves the names for a descriptor from its type and grammar name.
    pub fn for_descriptor(descriptor: &TestDescriptor) -> Self {
        let root = &descriptor.grammar_name;
        if descriptor.test_type.is_parser() {
            GrammarNames::Combined {
                lexer: format!("{}{}", root, LEXER_SUFFIX),
                parser: format!("{}{}", root, PARSER_SUFFIX),
            }
        } else {
            GrammarNames::LexerOnly {
                lexer: root.clone(),
            }
        }
    }

    pub fn lexer_name(&self) -> &str {
        match self {
            GrammarNames::LexerOnly { lexer } | GrammarNames::Combined { lexer, .. } => lexer,
        }
    }

    pub fn parser_name(&self) -> Option<&str> {
        match self {
            GrammarNames::LexerOnly { .. } => None,
            GrammarNames::Combined { parser, .. } => Some(parser),
        }
    }

    pub fn is_combined(&self) -> bool {
        matches!(self, GrammarNames::Combined { .. })
    }

    /// The grammar name handed to the harness.
    ///
    /// Lexer-only tests use the lexer name as is; combined grammars use the
    /// short name shared by lexer and parser.
    pub fn grammar_name(&self) -> String {
        match self {
            GrammarNames::LexerOnly { lexer } => lexer.clone(),
            GrammarNames::Combined { lexer, parser } => {
                resolve_short_name(Some(parser), Some(lexer)).unwrap_or_else(|| parser.clone())
            }
        }
    }

    /// Listener and visitor are generated for parser tests only.
    pub fn use_listener(&self) -> bool {
        self.is_combined()
    }

    pub fn use_visitor(&self) -> bool {
        self.is_combined()
    }
}

/// The name shared by a lexer/parser pair.
///
/// Prefers the parser name without its `Parser` suffix, then the lexer name
/// without its `Lexer` suffix. A name without the suffix is returned as is.
pub fn resolve_short_name(parser: Option<&str>, lexer: Option<&str>) -> Option<String> {
    if let Some(parser) = parser {
        return Some(parser.strip_suffix(PARSER_SUFFIX).unwrap_or(parser).to_string());
    }

    lexer.map(|lexer| lexer.strip_suffix(LEXER_SUFFIX).unwrap_or(lexer).to_string())
}
