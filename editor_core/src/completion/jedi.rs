//! Completion engine backed by the `jedi` Python library.
//!
//! A long-lived interpreter process is started on first use and fed one JSON
//! request per line on stdin; it answers with one JSON object per line. If
//! the process cannot be started or dies (for instance because jedi is not
//! installed) the engine stays unavailable for the rest of the session.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};

use super::analysis::AnalysisEngine;
use super::CompletionRequest;
use crate::error::AnalysisError;

const JEDI_SERVER: &str = r#"
import json, sys
import jedi

for raw in sys.stdin:
    req = json.loads(raw)
    try:
        script = jedi.Script(req["text"], path="")
        out = {"names": [c.name for c in script.complete(req["line"], req["column"])]}
    except Exception as exc:
        out = {"error": str(exc)}
    sys.stdout.write(json.dumps(out) + "\n")
    sys.stdout.flush()
"#;

#[derive(Debug, Serialize)]
struct JediRequest<'a> {
    text: &'a str,
    /// 1-based, as jedi expects.
    line: usize,
    column: usize,
}

#[derive(Debug, Deserialize)]
struct JediResponse {
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

struct JediProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

pub struct JediEngine {
    interpreter: String,
    process: Option<JediProcess>,
    failed: bool,
}

impl JediEngine {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            process: None,
            failed: false,
        }
    }

    fn start(&self) -> Result<JediProcess, AnalysisError> {
        let mut child = Command::new(&self.interpreter)
            .arg("-c")
            .arg(JEDI_SERVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(AnalysisError::Engine("interpreter pipes unavailable".to_string()));
        };
        log::info!("started jedi analysis via {}", self.interpreter);
        Ok(JediProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Sends one request. The outer error means the process is unusable; the
    /// inner one is a per-request failure reported by jedi.
    fn exchange(
        process: &mut JediProcess,
        request: &CompletionRequest,
    ) -> Result<Result<Vec<String>, String>, AnalysisError> {
        let payload = JediRequest {
            text: &request.text,
            line: request.position.line + 1,
            column: request.position.col,
        };
        serde_json::to_writer(&mut process.stdin, &payload)?;
        process.stdin.write_all(b"\n")?;
        process.stdin.flush()?;

        let mut line = String::new();
        if process.stdout.read_line(&mut line)? == 0 {
            return Err(AnalysisError::Engine("analysis process exited".to_string()));
        }
        let response: JediResponse = serde_json::from_str(&line)?;
        Ok(match response.error {
            Some(message) => Err(message),
            None => Ok(response.names),
        })
    }

    fn shutdown(&mut self) {
        if let Some(mut process) = self.process.take() {
            let _ = process.child.kill();
            let _ = process.child.wait();
        }
    }
}

impl AnalysisEngine for JediEngine {
    fn name(&self) -> &str {
        "jedi"
    }

    fn complete(&mut self, request: &CompletionRequest) -> Result<Vec<String>, AnalysisError> {
        if self.failed {
            return Err(AnalysisError::Unavailable);
        }
        if self.process.is_none() {
            match self.start() {
                Ok(process) => self.process = Some(process),
                Err(err) => {
                    self.failed = true;
                    return Err(err);
                }
            }
        }
        let Some(process) = self.process.as_mut() else {
            return Err(AnalysisError::Unavailable);
        };
        match Self::exchange(process, request) {
            Ok(Ok(names)) => Ok(names),
            Ok(Err(message)) => Err(AnalysisError::Engine(message)),
            Err(err) => {
                log::warn!("jedi analysis unavailable: {err}");
                self.failed = true;
                self.shutdown();
                Err(err)
            }
        }
    }
}

impl Drop for JediEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
