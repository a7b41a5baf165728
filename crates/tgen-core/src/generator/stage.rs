use std::fmt;

/// The step a test was in when something went wrong.
///
/// Every admitted test passes through the steps in this order:
/// Filtering → Rendering → Invoking → Emitting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    /// Deciding whether the test takes part in the run
    #[default]
    Filtering,
    /// Expanding grammar or harness templates
    Rendering,
    /// Running the external parser generator
    Invoking,
    /// Writing grammars, harness and input to disk
    Emitting,
}

impl Stage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::Filtering => "filtering",
            Stage::Rendering => "rendering",
            Stage::Invoking => "invoking the generator",
            Stage::Emitting => "writing files",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
