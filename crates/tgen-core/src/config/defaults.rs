//! Default values for tgen configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Layout Defaults
// ============================================================================

/// Default output root, relative to the configuration file.
pub const DEFAULT_TARGET_PATH: &str = "tests";

/// Default descriptor library root, relative to the configuration file.
pub const DEFAULT_DESCRIPTORS_PATH: &str = "resources/descriptors";

/// Default base name of the generated harness file.
pub const DEFAULT_TEST_FILE_NAME: &str = "Test";

/// Name of the literal input file written next to every harness.
pub const INPUT_FILE_NAME: &str = "input";

/// Extension of descriptor files in the library.
pub const DESCRIPTOR_EXTENSION: &str = "txt";

/// Extension of emitted grammar files.
pub const GRAMMAR_EXTENSION: &str = "g4";

// ============================================================================
// Generator Defaults
// ============================================================================

/// Default command used to run the parser generator.
pub const DEFAULT_GENERATOR_COMMAND: &[&str] = &["antlr-ng"];

/// Encoding passed to the generator for grammar sources.
pub const DEFAULT_GRAMMAR_ENCODING: &str = "UTF-8";

/// Tool output lines that never indicate a problem with the grammar.
pub const DEFAULT_BENIGN_DIAGNOSTICS: &[&str] = &[
    r"^Picked up (_JAVA_OPTIONS|JAVA_TOOL_OPTIONS|JDK_JAVA_OPTIONS)",
    r"^Debugger listening on ",
    r"^Debugger attached\.?$",
    r"^Waiting for the debugger to disconnect",
    r"^For help, see: https://nodejs\.org/en/docs/inspector",
];

/// Prefix of tool output lines that are warnings rather than errors.
pub const WARNING_PREFIX: &str = "warning(";

/// Error lines on stdout carry this prefix; other stdout lines are informational.
pub const ERROR_PREFIX: &str = "error(";

// ============================================================================
// Environment Overrides
// ============================================================================

/// Overrides the generator command (whitespace separated).
pub const ENV_GENERATOR: &str = "TGEN_GENERATOR";

/// Overrides the output root.
pub const ENV_TARGET_PATH: &str = "TGEN_TARGET_PATH";
