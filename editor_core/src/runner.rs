//! Running the buffer through the interpreter, and the output pane that
//! shows the result.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::RunError;

/// Captured result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` if the interpreter was killed by a signal.
    pub status: Option<i32>,
    /// Where the script was written. Already deleted when this is returned.
    pub script: PathBuf,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Writes source to a temporary `.py` file and runs the interpreter on it.
#[derive(Debug, Clone)]
pub struct CodeRunner {
    interpreter: String,
}

impl CodeRunner {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Runs `source` to completion. The temporary file is removed on every
    /// return path when it goes out of scope.
    pub fn run(&self, source: &str) -> Result<RunOutput, RunError> {
        let mut script = tempfile::Builder::new()
            .prefix("laefex-")
            .suffix(".py")
            .tempfile()
            .map_err(RunError::TempFile)?;
        script
            .write_all(source.as_bytes())
            .and_then(|()| script.flush())
            .map_err(RunError::TempFile)?;

        let path = script.path().to_path_buf();
        log::info!("running {} {}", self.interpreter, path.display());
        let output = Command::new(&self.interpreter)
            .arg(&path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| {
                log::error!("could not start {}: {source}", self.interpreter);
                RunError::Spawn {
                    interpreter: self.interpreter.clone(),
                    source,
                }
            })?;
        drop(script);

        Ok(RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
            script: path,
        })
    }
}

/// The read-only run output pane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPane {
    text: String,
    visible: bool,
}

impl OutputPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Appends a block of output with its trailing newline trimmed. Empty
    /// output is ignored.
    pub fn append(&mut self, output: &str) {
        let output = output.trim_end_matches(['\n', '\r']);
        if output.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(output);
        self.visible = true;
    }

    /// Replaces the pane contents with the outcome of a run.
    pub fn show_run(&mut self, result: &Result<RunOutput, RunError>) {
        self.clear();
        match result {
            Ok(output) => {
                self.append(&output.stdout);
                self.append(&output.stderr);
            }
            Err(err) => self.append(&err.to_string()),
        }
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn python() -> Option<CodeRunner> {
        let runner = CodeRunner::new("python3");
        let found = Command::new(runner.interpreter())
            .arg("--version")
            .output()
            .is_ok();
        found.then_some(runner)
    }

    #[test]
    fn test_run_captures_stdout_and_removes_script() {
        let Some(runner) = python() else {
            eprintln!("python3 not installed, skipping");
            return;
        };
        let output = runner.run("print(1+1)").unwrap();
        assert_eq!(output.stdout.trim_end(), "2");
        assert!(output.success());
        assert!(!output.script.exists());
    }

    #[test]
    fn test_run_captures_stderr() {
        let Some(runner) = python() else {
            eprintln!("python3 not installed, skipping");
            return;
        };
        let output = runner.run("import sys\nsys.exit('boom')").unwrap();
        assert_eq!(output.stderr.trim_end(), "boom");
        assert_eq!(output.status, Some(1));
        assert!(!output.script.exists());
    }

    #[test]
    fn test_missing_interpreter_is_a_spawn_error() {
        let runner = CodeRunner::new("laefex-test-no-such-interpreter");
        let err = runner.run("print(1)").unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }

    #[test]
    fn test_output_pane() {
        let mut pane = OutputPane::new();
        assert!(!pane.is_visible());

        pane.append("");
        assert!(!pane.is_visible());

        pane.append("2\n");
        pane.append("warning\n");
        assert_eq!(pane.text(), "2\nwarning");
        assert!(pane.is_visible());

        pane.show_run(&Err(RunError::Spawn {
            interpreter: "py".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }));
        assert!(pane.text().starts_with("could not start `py`"));

        pane.hide();
        assert!(!pane.is_visible());
    }
}
