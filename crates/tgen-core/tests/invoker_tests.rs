use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tgen_core::invoker::{
    DiagnosticFilter, GenerationOutcome, GeneratorTool, InvokeError, Invoker, ProcessTool, ToolOutput,
};

/// Replays a fixed output and remembers where it was run.
struct Scripted {
    output: Option<ToolOutput>,
    seen: Rc<RefCell<Vec<(Vec<String>, PathBuf)>>>,
}

impl Scripted {
    fn new(success: bool, stdout: &str, stderr: &str) -> Self {
        Self {
            output: Some(ToolOutput {
                success,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
            seen: Rc::default(),
        }
    }

    fn broken() -> Self {
        Self {
            output: None,
            seen: Rc::default(),
        }
    }
}

impl GeneratorTool for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn run(&self, args: &[String], work_dir: &Path) -> Result<ToolOutput, std::io::Error> {
        self.seen
            .borrow_mut()
            .push((args.to_vec(), work_dir.to_path_buf()));
        self.output
            .clone()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no such tool"))
    }
}

fn invoker(tool: Scripted) -> Invoker {
    let filter = DiagnosticFilter::new(&["^Downloading ".to_string()]).unwrap();
    Invoker::new(Box::new(tool), "Python3", filter)
}

#[test]
fn test_clean_run_with_benign_chatter() {
    let tool = Scripted::new(
        true,
        "Downloading antlr4-4.13.jar\n",
        "Picked up _JAVA_OPTIONS: -Xmx2g\n",
    );
    let seen = Rc::clone(&tool.seen);

    let outcome = invoker(tool)
        .invoke(Path::new("/out/Lexer/t"), Path::new("/out/Lexer/t/L.g4"), &[])
        .unwrap();
    assert_eq!(outcome, GenerationOutcome::Succeeded { warnings: vec![] });

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, PathBuf::from("/out/Lexer/t"));
    assert_eq!(seen[0].0[0], "-Dlanguage=Python3");
}

#[test]
fn test_warnings_do_not_fail_the_run() {
    let tool = Scripted::new(true, "", "warning(125): T.g4:4:4: implicit definition of token B\n");
    let outcome = invoker(tool).invoke(Path::new("."), Path::new("T.g4"), &[]).unwrap();
    assert_eq!(
        outcome,
        GenerationOutcome::Succeeded {
            warnings: vec!["warning(125): T.g4:4:4: implicit definition of token B".to_string()]
        }
    );
}

#[test]
fn test_error_line_fails_despite_exit_status() {
    let tool = Scripted::new(
        true,
        "",
        "warning(125): T.g4:4:4: implicit definition of token B\nerror(56): T.g4:2:2: reference to undefined rule: c\n",
    );
    let outcome = invoker(tool).invoke(Path::new("."), Path::new("T.g4"), &[]).unwrap();
    assert_eq!(
        outcome,
        GenerationOutcome::Failed {
            diagnostics: vec![
                "error(56): T.g4:2:2: reference to undefined rule: c".to_string(),
                "warning(125): T.g4:4:4: implicit definition of token B".to_string(),
            ]
        }
    );
}

#[test]
fn test_silent_failure_still_explains_itself() {
    let outcome = invoker(Scripted::new(false, "", ""))
        .invoke(Path::new("."), Path::new("T.g4"), &[])
        .unwrap();
    assert!(!outcome.is_success());
    assert_eq!(
        outcome,
        GenerationOutcome::Failed {
            diagnostics: vec!["generator exited with a failure status".to_string()]
        }
    );
}

#[test]
fn test_tool_that_cannot_start() {
    let err = invoker(Scripted::broken())
        .invoke(Path::new("."), Path::new("T.g4"), &[])
        .unwrap_err();
    match err {
        InvokeError::Spawn { program, grammar, .. } => {
            assert_eq!(program, "scripted");
            assert_eq!(grammar, PathBuf::from("T.g4"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_invalid_benign_pattern() {
    assert!(matches!(
        DiagnosticFilter::new(&["[unclosed".to_string()]),
        Err(InvokeError::InvalidPattern { .. })
    ));
}

#[cfg(unix)]
#[test]
fn test_process_tool_runs_in_work_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    let command = vec![
        "sh".to_string(),
        "-c".to_string(),
        "touch \"$(basename \"$0\" .g4).py\"".to_string(),
    ];
    let tool = ProcessTool::new(&command).unwrap();
    let output = tool.run(&["T.g4".to_string()], dir.path()).unwrap();

    assert!(output.success);
    assert!(dir.path().join("T.py").is_file());
}
