//! Descriptors defined in code.
//!
//! These tests need inputs or grammars that are impractical to write by
//! hand: thousands of rules, or line separators that editors normalize.

use std::fmt::Write;

use super::SupplementalSource;
use crate::descriptor::{GrammarType, TestDescriptor};

const LEXER_GROUP: &str = "LexerExec";
const PARSER_GROUP: &str = "ParserExec";

/// The built-in supplemental descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDescriptors;

impl SupplementalSource for BuiltinDescriptors {
    fn groups(&self) -> Vec<(String, Vec<TestDescriptor>)> {
        vec![
            (
                LEXER_GROUP.to_string(),
                vec![
                    line_separator_lf(),
                    line_separator_crlf(),
                    large_lexer(),
                    atn_states_size_more_than_65535(),
                ],
            ),
            (PARSER_GROUP.to_string(), vec![multi_token_alternative()]),
        ]
    }
}

fn lexer(name: &str, grammar: String, input: String, output: String) -> TestDescriptor {
    let mut descriptor = TestDescriptor::new(name, GrammarType::Lexer, "L", grammar);
    descriptor.input = input;
    descriptor.output = output;
    descriptor
}

fn line_separator_lf() -> TestDescriptor {
    lexer(
        "LineSeparatorLf",
        "lexer grammar L;\nT: ~'\\n'+;\nSEPARATOR: '\\n';".to_string(),
        "1\n2\n3".to_string(),
        [
            "[@0,0:0='1',<1>,1:0]",
            "[@1,1:1='\\n',<2>,1:1]",
            "[@2,2:2='2',<1>,2:0]",
            "[@3,3:3='\\n',<2>,2:1]",
            "[@4,4:4='3',<1>,3:0]",
            "[@5,5:4='<EOF>',<-1>,3:1]",
            "",
        ]
        .join("\n"),
    )
}

fn line_separator_crlf() -> TestDescriptor {
    lexer(
        "LineSeparatorCrLf",
        "lexer grammar L;\nT: ~'\\r'+;\nSEPARATOR: '\\r\\n';".to_string(),
        "1\r\n2\r\n3".to_string(),
        [
            "[@0,0:0='1',<1>,1:0]",
            "[@1,1:2='\\r\\n',<2>,1:1]",
            "[@2,3:3='2',<1>,2:0]",
            "[@3,4:5='\\r\\n',<2>,2:1]",
            "[@4,6:6='3',<1>,3:0]",
            "[@5,7:6='<EOF>',<-1>,3:1]",
            "",
        ]
        .join("\n"),
    )
}

/// A lexer with thousands of keywords.
fn large_lexer() -> TestDescriptor {
    const TOKENS: usize = 4000;

    let mut grammar = String::from("lexer grammar L;\nWS: [ \\t\\r\\n]+ -> skip;\n");
    for i in 0..TOKENS {
        let _ = writeln!(grammar, "KW{} : 'KW' '{}';", i, i);
    }

    lexer(
        "LargeLexer",
        grammar,
        "KW400".to_string(),
        "[@0,0:4='KW400',<402>,1:0]\n[@1,5:4='<EOF>',<-1>,1:5]\n".to_string(),
    )
}

/// Enough long literals to push the ATN past 65535 states.
fn atn_states_size_more_than_65535() -> TestDescriptor {
    const TOKENS: usize = 1024;

    let suffix = "_".repeat(70);
    let mut grammar = String::from("lexer grammar L;\n\n");
    let mut input = String::new();
    let mut output = String::new();

    let mut stop: i64 = -2;
    for i in 0..TOKENS {
        let rule = format!("T_{:06}", i);
        let value = format!("{}{}", rule, suffix);
        let _ = writeln!(grammar, "{}: '{}';", rule, value);
        input.push_str(&value);
        input.push('\n');

        let start = stop + 2;
        stop += value.len() as i64 + 1;
        let _ = writeln!(output, "[@{},{}:{}='{}',<{}>,{}:0]", i, start, stop, value, i + 1, i + 1);
    }
    grammar.push_str("\nWS: [ \\t\\r\\n]+ -> skip;\n");

    let start = stop + 2;
    let _ = writeln!(
        output,
        "[@{},{}:{}='<EOF>',<-1>,{}:0]",
        TOKENS,
        start,
        start - 1,
        TOKENS + 1
    );

    let mut descriptor = lexer("AtnStatesSizeMoreThan65535", grammar, input, output);
    descriptor.notes = "Lexer ATN with more than 65535 states".to_string();
    descriptor.skip_targets = [
        "CSharp",
        "Python3",
        "Go",
        "PHP",
        "Swift",
        "JavaScript",
        "TypeScript",
        "Dart",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    descriptor
}

/// One rule with 64 single token alternatives, plus one more token type
/// outside of it.
fn multi_token_alternative() -> TestDescriptor {
    const ALTERNATIVES: usize = 64;

    let names: Vec<String> = (0..=ALTERNATIVES).map(|i| format!("T{}", i)).collect();
    let mut tokens = String::new();
    for name in &names {
        let _ = writeln!(tokens, "{}: '{}';", name, name);
    }

    let grammar = format!(
        "grammar P;\nr: (r1 | {})+ EOF {{<writeln(\"$text\")>}};\nr1: {};\n{}\nWS: [ ]+ -> skip;",
        names[ALTERNATIVES],
        names[..ALTERNATIVES].join(" | "),
        tokens
    );

    let mut descriptor = TestDescriptor::new("MultiTokenAlternative", GrammarType::Parser, "P", grammar);
    descriptor.start_rule = Some("r".to_string());
    // Skipped whitespace is not part of `$text`.
    descriptor.input = names.iter().map(|name| format!("{} ", name)).collect();
    descriptor.output = format!("{}\n", names.concat());
    descriptor
}
