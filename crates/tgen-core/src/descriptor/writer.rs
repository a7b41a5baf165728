//! Canonical descriptor text output, the inverse of [`super::parse`].

use super::parser::{normalize, Section, QUOTE};
use super::{PredictionMode, TestDescriptor};

pub(super) fn write(descriptor: &TestDescriptor) -> String {
    let mut out = String::new();

    section(&mut out, Section::Notes, &descriptor.notes);
    section(&mut out, Section::Type, descriptor.test_type.as_str());
    section(&mut out, Section::Grammar, &descriptor.grammar);
    for slave in &descriptor.slave_grammars {
        section(&mut out, Section::SlaveGrammar, &slave.text);
    }
    if let Some(start) = &descriptor.start_rule {
        section(&mut out, Section::Start, start);
    }
    section(&mut out, Section::Input, &descriptor.input);
    section(&mut out, Section::Output, &descriptor.output);
    section(&mut out, Section::Errors, &descriptor.errors);

    let mut flags = Vec::new();
    if descriptor.show_dfa {
        flags.push("showDFA".to_string());
    }
    if descriptor.show_diagnostic_errors {
        flags.push("showDiagnosticErrors".to_string());
    }
    if descriptor.trace_atn {
        flags.push("traceATN".to_string());
    }
    if descriptor.prediction_mode != PredictionMode::default() {
        flags.push(format!("predictionMode={}", descriptor.prediction_mode));
    }
    if !descriptor.build_parse_tree {
        flags.push("notBuildParseTree".to_string());
    }
    section(&mut out, Section::Flags, &flags.join("\n"));

    let skips: Vec<&str> = descriptor.skip_targets.iter().map(String::as_str).collect();
    section(&mut out, Section::Skip, &skips.join("\n"));

    out
}

/// Appends one section. Empty values are left out entirely.
fn section(out: &mut String, section: Section, value: &str) {
    if value.is_empty() {
        return;
    }

    if !out.is_empty() {
        out.push('\n');
    }
    out.push('[');
    out.push_str(section.name());
    out.push_str("]\n");

    if survives_plain(value) {
        out.push_str(value);
    } else {
        out.push_str(QUOTE);
        out.push_str(value);
        out.push_str(QUOTE);
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
}

/// True if the value reads back unchanged without quoting.
fn survives_plain(value: &str) -> bool {
    !value.starts_with(QUOTE) && normalize(value) == value
}
