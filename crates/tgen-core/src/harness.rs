//! Binds the placeholders of the harness template for one test.

use crate::config::Config;
use crate::descriptor::TestDescriptor;
use crate::naming::GrammarNames;
use crate::template::{Attributes, Value};

/// Escapes text for a double quoted string literal in the harness.
///
/// Backslashes go first so the escapes added afterwards stay intact.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('"', "\\\"")
}

/// Reverses [`escape`]. Unknown escapes are kept as written.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Collects the attribute set the harness template is rendered with.
pub fn attributes(config: &Config, descriptor: &TestDescriptor, names: &GrammarNames) -> Attributes {
    let mut attributes = Attributes::new();
    let mut bind = |key: &str, value: Value| {
        attributes.insert(key.to_string(), value);
    };

    bind("grammarName", names.grammar_name().into());
    bind("lexerName", names.lexer_name().into());
    // Absent for lexer-only tests, so `<if(parserName)>` is false.
    bind("parserName", names.parser_name().into());
    bind(
        "parserStartRuleName",
        descriptor.start_rule.as_deref().unwrap_or_default().into(),
    );
    bind("showDiagnosticErrors", descriptor.show_diagnostic_errors.into());
    bind("traceATN", descriptor.trace_atn.into());
    bind("profile", false.into());
    bind("showDFA", descriptor.show_dfa.into());
    bind("useListener", names.use_listener().into());
    bind("useVisitor", names.use_visitor().into());
    bind("predictionMode", descriptor.prediction_mode.as_str().into());
    bind("buildParseTree", descriptor.build_parse_tree.into());
    bind("input", escape(&descriptor.input).into());
    bind("expectedOutput", escape(&descriptor.output).into());
    bind("expectedErrors", escape(&descriptor.errors).into());
    bind("testName", descriptor.name.as_str().into());
    bind(
        "testAnnotation",
        config.annotation(descriptor.skips(&config.language)).into(),
    );

    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::GrammarType;

    fn config() -> Config {
        let mut config = Config::from_json_str(
            r#"{
                "language": "Java",
                "targetExtension": "java",
                "specTemplateFile": "Test.java.stg",
                "grammarTemplateFile": "Java.test.stg",
                "testAnnotations": ["@Test", "@Disabled"]
            }"#,
        )
        .unwrap();
        config.base_dir = std::path::PathBuf::from("/tmp");
        config
    }

    #[test]
    fn test_escape_order() {
        assert_eq!(escape("a\\\"b"), "a\\\\\\\"b");
        assert_eq!(escape("x\r\ny"), "x\\r\\ny");
    }

    #[test]
    fn test_unescape_keeps_unknown_escapes() {
        assert_eq!(unescape("\\t\\n"), "\\t\n");
        assert_eq!(unescape("end\\"), "end\\");
    }

    #[test]
    fn test_lexer_attributes() {
        let mut descriptor = TestDescriptor::new("simple", GrammarType::Lexer, "L", "");
        descriptor.input = "a\"b\n".to_string();
        let names = GrammarNames::for_descriptor(&descriptor);

        let attributes = attributes(&config(), &descriptor, &names);
        assert_eq!(attributes["grammarName"], Value::from("L"));
        assert_eq!(attributes["parserName"], Value::Absent);
        assert_eq!(attributes["useListener"], Value::from(false));
        assert_eq!(attributes["profile"], Value::from(false));
        assert_eq!(attributes["input"], Value::from("a\\\"b\\n"));
        assert_eq!(attributes["predictionMode"], Value::from("LL"));
        assert_eq!(attributes["buildParseTree"], Value::from(true));
        assert_eq!(attributes["testAnnotation"], Value::from("@Test"));
    }

    #[test]
    fn test_parser_attributes_and_skip_annotation() {
        let mut descriptor = TestDescriptor::new("rule", GrammarType::Parser, "T", "");
        descriptor.start_rule = Some("s".to_string());
        descriptor.skip_targets.insert("Java".to_string());
        let names = GrammarNames::for_descriptor(&descriptor);

        let attributes = attributes(&config(), &descriptor, &names);
        assert_eq!(attributes["grammarName"], Value::from("T"));
        assert_eq!(attributes["lexerName"], Value::from("TLexer"));
        assert_eq!(attributes["parserName"], Value::from("TParser"));
        assert_eq!(attributes["parserStartRuleName"], Value::from("s"));
        assert_eq!(attributes["useVisitor"], Value::from(true));
        assert_eq!(attributes["testAnnotation"], Value::from("@Disabled"));
    }
}
