use proptest::prelude::*;
use tgen_core::descriptor::{GrammarType, PredictionMode, TestDescriptor};
use tgen_core::harness::{attributes, escape, unescape};
use tgen_core::template::TemplateGroup;
use tgen_core::{Config, GrammarNames};

const HARNESS: &str = r#"<testAnnotation>("<testName>")
void run() {
<if(parserName)>
    var parser = new <parserName>(new <lexerName>(input));
    <if(showDiagnosticErrors)>
    parser.addErrorListener(new DiagnosticErrorListener());
    <endif>
    parser.getInterpreter().setPredictionMode(PredictionMode.<predictionMode>);
    <if(!buildParseTree)>
    parser.setBuildParseTree(false);
    <endif>
    parser.<parserStartRuleName>();
<else>
    var lexer = new <lexerName>(input);
    <if(showDFA)>
    System.out.print(lexer.getInterpreter().getDFA(Lexer.DEFAULT_MODE).toLexerString());
    <endif>
<endif>
    assertEquals("<expectedOutput>", output());
    assertEquals("<expectedErrors>", errors());
}
"#;

fn config() -> Config {
    Config::from_json_str(
        r#"{
            "language": "Java",
            "targetExtension": "java",
            "specTemplateFile": "Test.java.stg",
            "grammarTemplateFile": "Java.test.stg",
            "testAnnotations": ["@Test", "@Disabled"]
        }"#,
    )
    .unwrap()
}

fn render(descriptor: &TestDescriptor) -> String {
    let names = GrammarNames::for_descriptor(descriptor);
    let bound = attributes(&config(), descriptor, &names);
    TemplateGroup::new().render_inline(HARNESS, &bound).unwrap()
}

#[test]
fn test_parser_harness() {
    let mut descriptor = TestDescriptor::new("Ambig", GrammarType::Parser, "T", "grammar T;");
    descriptor.start_rule = Some("prog".to_string());
    descriptor.show_diagnostic_errors = true;
    descriptor.prediction_mode = PredictionMode::LlExactAmbigDetection;
    descriptor.build_parse_tree = false;
    descriptor.output = "x\n".to_string();
    descriptor.errors = "line 1:0 reportAmbiguity d=0: ambigAlts={1, 2}, input='a'\n".to_string();

    assert_eq!(
        render(&descriptor),
        "@Test(\"Ambig\")\nvoid run() {\n\
         \x20   var parser = new TParser(new TLexer(input));\n\
         \x20   parser.addErrorListener(new DiagnosticErrorListener());\n\
         \x20   parser.getInterpreter().setPredictionMode(PredictionMode.LL_EXACT_AMBIG_DETECTION);\n\
         \x20   parser.setBuildParseTree(false);\n\
         \x20   parser.prog();\n\
         \x20   assertEquals(\"x\\n\", output());\n\
         \x20   assertEquals(\"line 1:0 reportAmbiguity d=0: ambigAlts={1, 2}, input='a'\\n\", errors());\n\
         }\n"
    );
}

#[test]
fn test_lexer_harness_skipped_for_target() {
    let mut descriptor = TestDescriptor::new("DFA", GrammarType::Lexer, "L", "lexer grammar L;");
    descriptor.show_dfa = true;
    descriptor.skip_targets.insert("Java".to_string());

    assert_eq!(
        render(&descriptor),
        "@Disabled(\"DFA\")\nvoid run() {\n\
         \x20   var lexer = new L(input);\n\
         \x20   System.out.print(lexer.getInterpreter().getDFA(Lexer.DEFAULT_MODE).toLexerString());\n\
         \x20   assertEquals(\"\", output());\n\
         \x20   assertEquals(\"\", errors());\n\
         }\n"
    );
}

#[test]
fn test_composite_lexer_has_no_parser() {
    let descriptor = TestDescriptor::new("Imports", GrammarType::CompositeLexer, "M", "lexer grammar M;");
    let names = GrammarNames::for_descriptor(&descriptor);
    assert_eq!(names.parser_name(), None);
    assert!(render(&descriptor).contains("var lexer = new M(input);"));
}

proptest! {
    #[test]
    fn prop_unescape_reverses_escape(text in "[ -~\\n\\r\\t]{0,64}") {
        prop_assert_eq!(unescape(&escape(&text)), text);
    }

    #[test]
    fn prop_escaped_text_has_no_raw_line_breaks(text in "[ -~\\n\\r]{0,64}") {
        let escaped = escape(&text);
        prop_assert!(!escaped.contains('\n'));
        prop_assert!(!escaped.contains('\r'));
    }
}
