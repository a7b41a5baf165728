use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use tgen_core::config::{
    ConfigError, FileEntry, DEFAULT_DESCRIPTORS_PATH, DEFAULT_TARGET_PATH, ENV_GENERATOR,
    ENV_TARGET_PATH,
};
use tgen_core::Config;

const JSON: &str = r#"{
    "language": "TypeScript",
    "targetExtension": "spec.ts",
    "specTemplateFile": "templates/Test.spec.ts.stg",
    "grammarTemplateFile": "templates/TypeScript.test.stg",
    "testAnnotations": ["", "xit"],
    "groupIncludes": ["Lexer"],
    "testExcludes": ["^Large"],
    "files": [
        { "sourcePattern": "support/*.ts", "targetPath": "helpers" },
        { "sourcePattern": "package.json" }
    ],
    "benignDiagnostics": ["^npm notice"]
}"#;

const TOML: &str = r#"
language = "Go"
targetExtension = "go"
specTemplateFile = "Test.go.stg"
grammarTemplateFile = "Go.test.stg"
testFileName = "runner_test"
generator = ["java", "-jar", "antlr4.jar"]
"#;

#[test]
fn test_config_from_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tgen.json");
    fs::write(&path, JSON).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.language, "TypeScript");
    assert_eq!(config.base_dir, dir.path());
    assert_eq!(config.harness_file_name(), "Test.spec.ts");
    assert_eq!(config.annotation(false), "");
    assert_eq!(config.annotation(true), "xit");
    assert_eq!(
        config.files,
        vec![
            FileEntry {
                source_pattern: "support/*.ts".to_string(),
                target_path: Some("helpers".to_string()),
            },
            FileEntry {
                source_pattern: "package.json".to_string(),
                target_path: None,
            },
        ]
    );
    assert_eq!(config.benign_diagnostics, vec!["^npm notice".to_string()]);
    assert_eq!(
        config.spec_template_path(),
        dir.path().join("templates/Test.spec.ts.stg")
    );
    assert_eq!(
        config.descriptors_root(),
        dir.path().join(DEFAULT_DESCRIPTORS_PATH)
    );
}

#[test]
fn test_config_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tgen.toml");
    fs::write(&path, TOML).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.language, "Go");
    assert_eq!(config.harness_file_name(), "runner_test.go");
    assert!(config.test_annotations.is_none());
    assert!(config.files.is_empty());
}

#[test]
fn test_filter_is_built_from_patterns() {
    let config = Config::from_json_str(JSON).unwrap();
    let filter = config.pattern_filter().unwrap();

    assert!(filter.included("Lexer", "simple"));
    assert!(!filter.included("Lexer", "LargeLexer"));
    assert!(!filter.included("Parser", "simple"));
}

#[test]
fn test_broken_pattern_is_reported_once_compiled() {
    let config = Config::from_json_str(&JSON.replace("^Large", "[Large")).unwrap();
    assert!(config.pattern_filter().is_err());
    assert!(!config.filter_patterns().is_empty());
}

#[test]
fn test_missing_file() {
    let err = Config::from_file("/definitely/not/here/tgen.json").unwrap_err();
    match err {
        ConfigError::ReadError { path, .. } => {
            assert_eq!(path, PathBuf::from("/definitely/not/here/tgen.json"))
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_missing_required_key() {
    let err = Config::from_json_str(r#"{ "language": "Java" }"#).unwrap_err();
    assert!(matches!(err, ConfigError::JsonError(_)));
}

#[test]
fn test_invalid_values_are_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tgen.json");
    fs::write(&path, JSON.replace("\"package.json\"", "\"  \"")).unwrap();

    assert!(matches!(
        Config::from_file(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_config_serializes_back() {
    let config = Config::from_json_str(JSON).unwrap();
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"targetExtension\":\"spec.ts\""));
    assert!(!json.contains("baseDir"));
    assert!(!json.contains("targetPath\":null"));
}

// Environment overrides are checked in one test so no other test in this
// binary observes them.
#[test]
fn test_environment_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tgen.toml");
    fs::write(&path, TOML).unwrap();

    let before = Config::from_file(&path).unwrap();
    assert_eq!(before.target_root(), dir.path().join(DEFAULT_TARGET_PATH));

    std::env::set_var(ENV_GENERATOR, "node  ./antlr-ng.js");
    std::env::set_var(ENV_TARGET_PATH, "out");
    let config = Config::from_file(&path);
    std::env::remove_var(ENV_GENERATOR);
    std::env::remove_var(ENV_TARGET_PATH);

    let config = config.unwrap();
    assert_eq!(
        config.generator_or_default(),
        vec!["node".to_string(), "./antlr-ng.js".to_string()]
    );
    assert_eq!(config.target_root(), dir.path().join("out"));
}
