use std::path::Path;
use std::process::Command;

use super::{GeneratorTool, InvokeError, ToolOutput};

/// Runs the generator as a child process.
#[derive(Debug, Clone)]
pub struct ProcessTool {
    program: String,
    base_args: Vec<String>,
}

impl ProcessTool {
    /// Builds a tool from a command line such as `["java", "-jar", "antlr.jar"]`.
    pub fn new(command: &[String]) -> Result<Self, InvokeError> {
        let (program, base_args) = command.split_first().ok_or(InvokeError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            base_args: base_args.to_vec(),
        })
    }
}

impl GeneratorTool for ProcessTool {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&self, args: &[String], work_dir: &Path) -> Result<ToolOutput, std::io::Error> {
        let output = Command::new(&self.program)
            .args(&self.base_args)
            .args(args)
            .current_dir(work_dir)
            .output()?;

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
