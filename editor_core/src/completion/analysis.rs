//! Deep-analysis completion running on a background worker.
//!
//! The session thread sends a request and waits at most `timeout` for the
//! answer. Replies are tagged with the request they answer and the edit
//! counter it was made at; anything that does not match the current request
//! is stale and dropped. The worker only ever runs the newest queued
//! request, so a burst of keystrokes never builds up a backlog.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::{CompletionProvider, CompletionRequest};
use crate::error::AnalysisError;
use crate::syntax::SymbolTable;

/// A semantic completion backend. Runs on the worker thread only.
pub trait AnalysisEngine: Send + 'static {
    fn name(&self) -> &str;

    fn complete(&mut self, request: &CompletionRequest) -> Result<Vec<String>, AnalysisError>;
}

struct Job {
    id: u64,
    request: CompletionRequest,
}

struct Reply {
    id: u64,
    edit_seq: u64,
    result: Result<Vec<String>, AnalysisError>,
}

pub struct DeepAnalysisProvider {
    name: String,
    job_tx: Sender<Job>,
    reply_rx: Receiver<Reply>,
    timeout: Duration,
    next_id: u64,
}

impl DeepAnalysisProvider {
    /// Starts the worker thread for `engine`.
    pub fn spawn<E: AnalysisEngine>(mut engine: E, timeout: Duration) -> Result<Self, AnalysisError> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        let (reply_tx, reply_rx) = crossbeam_channel::unbounded::<Reply>();
        let name = engine.name().to_string();

        thread::Builder::new()
            .name(format!("analysis-{name}"))
            .spawn(move || {
                while let Ok(mut job) = job_rx.recv() {
                    // Newest request wins.
                    while let Ok(newer) = job_rx.try_recv() {
                        job = newer;
                    }
                    let result = engine.complete(&job.request);
                    let reply = Reply {
                        id: job.id,
                        edit_seq: job.request.edit_seq,
                        result,
                    };
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
                log::debug!("analysis worker stopped");
            })?;

        Ok(Self {
            name,
            job_tx,
            reply_rx,
            timeout,
            next_id: 0,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CompletionProvider for DeepAnalysisProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete(
        &mut self,
        request: &CompletionRequest,
        _symbols: &SymbolTable,
    ) -> Result<Vec<String>, AnalysisError> {
        self.next_id += 1;
        let id = self.next_id;
        self.job_tx
            .send(Job {
                id,
                request: request.clone(),
            })
            .map_err(|_| AnalysisError::Unavailable)?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.reply_rx.recv_timeout(remaining) {
                Ok(reply) if reply.id == id && reply.edit_seq == request.edit_seq => {
                    return reply.result;
                }
                Ok(reply) => {
                    log::debug!(
                        "{}: discarding stale result for edit {} (now {})",
                        self.name,
                        reply.edit_seq,
                        request.edit_seq
                    );
                }
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("{}: no answer within {:?}", self.name, self.timeout);
                    return Err(AnalysisError::Timeout(self.timeout));
                }
                Err(RecvTimeoutError::Disconnected) => return Err(AnalysisError::Unavailable),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Position;

    /// Answers `<prefix>_<edit_seq>`, sleeping first when the prefix is "slow".
    struct EchoEngine;

    impl AnalysisEngine for EchoEngine {
        fn name(&self) -> &str {
            "echo"
        }

        fn complete(&mut self, request: &CompletionRequest) -> Result<Vec<String>, AnalysisError> {
            if request.prefix == "slow" {
                thread::sleep(Duration::from_millis(300));
            }
            Ok(vec![format!("{}_{}", request.prefix, request.edit_seq)])
        }
    }

    struct FailingEngine;

    impl AnalysisEngine for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        fn complete(&mut self, _request: &CompletionRequest) -> Result<Vec<String>, AnalysisError> {
            Err(AnalysisError::Engine("no backend".to_string()))
        }
    }

    fn request(prefix: &str, edit_seq: u64) -> CompletionRequest {
        CompletionRequest {
            text: prefix.to_string(),
            position: Position::new(0, prefix.len()),
            prefix: prefix.to_string(),
            edit_seq,
        }
    }

    #[test]
    fn test_answers_within_timeout() {
        let mut provider = DeepAnalysisProvider::spawn(EchoEngine, Duration::from_secs(2)).unwrap();
        let result = provider.complete(&request("pri", 4), &SymbolTable::default());
        assert_eq!(result.unwrap(), vec!["pri_4".to_string()]);
    }

    #[test]
    fn test_engine_errors_are_returned() {
        let mut provider = DeepAnalysisProvider::spawn(FailingEngine, Duration::from_secs(2)).unwrap();
        let result = provider.complete(&request("x", 1), &SymbolTable::default());
        assert!(matches!(result, Err(AnalysisError::Engine(_))));
    }

    #[test]
    fn test_slow_engine_times_out_and_late_reply_is_discarded() {
        let mut provider =
            DeepAnalysisProvider::spawn(EchoEngine, Duration::from_millis(100)).unwrap();

        let first = provider.complete(&request("slow", 1), &SymbolTable::default());
        assert!(matches!(first, Err(AnalysisError::Timeout(_))));

        // Let the late answer for edit 1 land in the reply queue.
        thread::sleep(Duration::from_millis(400));

        let second = provider.complete(&request("fast", 2), &SymbolTable::default());
        assert_eq!(second.unwrap(), vec!["fast_2".to_string()]);
    }
}
