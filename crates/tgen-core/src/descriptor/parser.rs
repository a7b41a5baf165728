//! Line oriented parser for descriptor files.
//!
//! A descriptor is a list of sections. Each section starts with a header
//! line such as `[grammar]` and runs until the next known header:
//!
//! ```text
//! [type]
//! Lexer
//!
//! [grammar]
//! lexer grammar L;
//! A : 'a' ;
//!
//! [input]
//! a
//!
//! [output]
//! """[@0,0:0='a',<1>,1:0]
//! """
//! ```

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;

use super::error::DescriptorError;
use super::{GrammarType, PredictionMode, SlaveGrammar, TestDescriptor};

/// Marks a value whose surrounding whitespace is significant.
pub(super) const QUOTE: &str = "\"\"\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum Section {
    Notes,
    Type,
    Grammar,
    SlaveGrammar,
    Start,
    Input,
    Output,
    Errors,
    Flags,
    Skip,
}

impl Section {
    pub(super) fn name(&self) -> &'static str {
        match self {
            Section::Notes => "notes",
            Section::Type => "type",
            Section::Grammar => "grammar",
            Section::SlaveGrammar => "slaveGrammar",
            Section::Start => "start",
            Section::Input => "input",
            Section::Output => "output",
            Section::Errors => "errors",
            Section::Flags => "flags",
            Section::Skip => "skip",
        }
    }

    /// Recognizes a header line. Unknown bracketed lines are body text.
    fn from_header(line: &str) -> Option<Section> {
        let name = line.strip_prefix('[')?.strip_suffix(']')?;
        let section = match name {
            "notes" => Section::Notes,
            "type" => Section::Type,
            "grammar" => Section::Grammar,
            "slaveGrammar" => Section::SlaveGrammar,
            "start" => Section::Start,
            "input" => Section::Input,
            "output" => Section::Output,
            "errors" => Section::Errors,
            "flags" => Section::Flags,
            "skip" => Section::Skip,
            _ => return None,
        };
        Some(section)
    }

    fn repeatable(&self) -> bool {
        matches!(self, Section::SlaveGrammar)
    }
}

/// Parses one descriptor.
///
/// `name` becomes the test name and `source` is kept as provenance for
/// diagnostics. No filesystem access happens here.
pub fn parse(
    name: &str,
    text: &str,
    source: impl AsRef<Path>,
) -> Result<TestDescriptor, DescriptorError> {
    let file = source.as_ref().to_path_buf();
    let sections = split_sections(text, &file)?;

    let mut test_type = None;
    let mut grammar = None;
    let mut descriptor = TestDescriptor::new(name, GrammarType::Lexer, "", "");
    descriptor.path = Some(file.clone());

    for (section, body) in sections {
        let value = normalize(&body);
        match section {
            Section::Notes => descriptor.notes = value,
            Section::Type => {
                let parsed = value.parse::<GrammarType>().map_err(|value| {
                    DescriptorError::UnknownType {
                        file: file.clone(),
                        value,
                    }
                })?;
                test_type = Some(parsed);
            }
            Section::Grammar => {
                let grammar_name =
                    grammar_name(&value).ok_or_else(|| DescriptorError::MissingGrammarName {
                        file: file.clone(),
                        section: Section::Grammar.name(),
                    })?;
                grammar = Some((grammar_name, value));
            }
            Section::SlaveGrammar => {
                let slave_name =
                    grammar_name(&value).ok_or_else(|| DescriptorError::MissingGrammarName {
                        file: file.clone(),
                        section: Section::SlaveGrammar.name(),
                    })?;
                descriptor.slave_grammars.push(SlaveGrammar {
                    name: slave_name,
                    text: value,
                });
            }
            Section::Start => {
                descriptor.start_rule = if value.is_empty() { None } else { Some(value) };
            }
            Section::Input => descriptor.input = value,
            Section::Output => descriptor.output = value,
            Section::Errors => descriptor.errors = value,
            Section::Flags => apply_flags(&mut descriptor, &value, &file)?,
            Section::Skip => {
                descriptor.skip_targets = value
                    .lines()
                    .map(str::trim)
                    .filter(|target| !target.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }
    }

    descriptor.test_type = test_type.ok_or_else(|| DescriptorError::MissingSection {
        file: file.clone(),
        section: Section::Type.name(),
    })?;
    let (grammar_name, grammar) = grammar.ok_or_else(|| DescriptorError::MissingSection {
        file: file.clone(),
        section: Section::Grammar.name(),
    })?;
    descriptor.grammar_name = grammar_name;
    descriptor.grammar = grammar;

    Ok(descriptor)
}

/// Cuts the text into raw section bodies, in order of appearance.
fn split_sections(text: &str, file: &Path) -> Result<Vec<(Section, String)>, DescriptorError> {
    let mut sections: Vec<(Section, String)> = Vec::new();
    let mut current: Option<(Section, String)> = None;
    let mut seen = HashSet::new();

    for (index, raw) in text.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(section) = Section::from_header(line) {
            if !section.repeatable() && !seen.insert(section) {
                return Err(DescriptorError::DuplicateSection {
                    file: file.to_path_buf(),
                    section: section.name().to_string(),
                });
            }
            if let Some(done) = current.take() {
                sections.push(done);
            }
            current = Some((section, String::new()));
            continue;
        }

        match current.as_mut() {
            Some((_, body)) => {
                body.push_str(line);
                body.push('\n');
            }
            None if line.trim().is_empty() => {}
            None => {
                return Err(DescriptorError::StrayText {
                    file: file.to_path_buf(),
                    line: index + 1,
                })
            }
        }
    }

    if let Some(done) = current {
        sections.push(done);
    }

    Ok(sections)
}

/// Trims a section body. Quoted values keep their inner text verbatim,
/// multi-line values keep one trailing newline.
pub(super) fn normalize(body: &str) -> String {
    let value = body.trim();
    if value.starts_with(QUOTE) {
        value.replace(QUOTE, "")
    } else if value.contains('\n') {
        format!("{}\n", value)
    } else {
        value.to_string()
    }
}

/// A grammar declaration at the start of a line.
const DECLARATION_PATTERN: &str = r"(?m)^[ \t]*(?:(?:lexer|parser)[ \t]+)?grammar[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*;";
const BLOCK_COMMENT_PATTERN: &str = r"(?s)/\*.*?\*/";

/// Extracts `X` from `grammar X;`, `lexer grammar X;` or `parser grammar X;`.
///
/// Only a declaration line counts; comments mentioning `grammar` are skipped.
pub(crate) fn grammar_name(text: &str) -> Option<String> {
    let declaration = Regex::new(DECLARATION_PATTERN).ok()?;
    let comments = Regex::new(BLOCK_COMMENT_PATTERN).ok()?;

    let text = comments.replace_all(text, "");
    declaration
        .captures(&text)
        .and_then(|cap| cap.get(1))
        .map(|name| name.as_str().to_string())
}

fn apply_flags(
    descriptor: &mut TestDescriptor,
    value: &str,
    file: &Path,
) -> Result<(), DescriptorError> {
    for entry in value.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (flag, argument) = match entry.split_once('=') {
            Some((flag, argument)) => (flag.trim(), Some(argument.trim())),
            None => (entry, None),
        };

        match flag {
            "showDFA" => descriptor.show_dfa = switch(flag, argument, file)?,
            "showDiagnosticErrors" => {
                descriptor.show_diagnostic_errors = switch(flag, argument, file)?
            }
            "traceATN" => descriptor.trace_atn = switch(flag, argument, file)?,
            "notBuildParseTree" => descriptor.build_parse_tree = !switch(flag, argument, file)?,
            "predictionMode" => {
                descriptor.prediction_mode = argument
                    .unwrap_or_default()
                    .parse::<PredictionMode>()
                    .map_err(|value| DescriptorError::UnknownPredictionMode {
                        file: file.to_path_buf(),
                        value,
                    })?;
            }
            _ => {
                return Err(DescriptorError::UnknownFlag {
                    file: file.to_path_buf(),
                    flag: flag.to_string(),
                })
            }
        }
    }

    Ok(())
}

/// A bare flag means `true`; `flag=true` and `flag=false` are also accepted.
fn switch(flag: &str, argument: Option<&str>, file: &Path) -> Result<bool, DescriptorError> {
    match argument {
        None | Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(DescriptorError::InvalidFlagValue {
            file: file.to_path_buf(),
            flag: flag.to_string(),
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_name_variants() {
        assert_eq!(grammar_name("grammar T;\na : 'a';"), Some("T".to_string()));
        assert_eq!(grammar_name("lexer grammar L;"), Some("L".to_string()));
        assert_eq!(grammar_name("parser grammar  S ;"), Some("S".to_string()));
        assert_eq!(grammar_name("a : 'a';"), None);
        assert_eq!(grammar_name("grammar ;"), None);
    }

    #[test]
    fn test_grammar_name_skips_comments() {
        assert_eq!(
            grammar_name("// grammar for x;\nlexer grammar L;\nA : 'a' ;"),
            Some("L".to_string())
        );
        assert_eq!(
            grammar_name("/* old:\ngrammar Old;\n*/\nparser grammar P;"),
            Some("P".to_string())
        );
        assert_eq!(grammar_name("a : 'grammar x;' ;\ngrammar T;"), Some("T".to_string()));
    }

    #[test]
    fn test_normalize_plain_and_multiline() {
        assert_eq!(normalize("  abc  \n"), "abc");
        assert_eq!(normalize("a\nb\n\n"), "a\nb\n");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_quoted_keeps_whitespace() {
        assert_eq!(normalize("\"\"\"abc\n\"\"\"\n"), "abc\n");
        assert_eq!(normalize("\"\"\" x \"\"\""), " x ");
    }

    #[test]
    fn test_crlf_lines() {
        let text = "[type]\r\nLexer\r\n[grammar]\r\nlexer grammar L;\r\nA : 'a';\r\n";
        let descriptor = parse("crlf", text, "crlf.txt").unwrap();
        assert_eq!(descriptor.grammar, "lexer grammar L;\nA : 'a';\n");
    }

    #[test]
    fn test_unknown_brackets_are_body_text() {
        let text = "[type]\nLexer\n[grammar]\nlexer grammar L;\n[a-z]\n";
        let descriptor = parse("brackets", text, "brackets.txt").unwrap();
        assert_eq!(descriptor.grammar, "lexer grammar L;\n[a-z]\n");
    }
}
