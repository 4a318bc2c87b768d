//! Error types for the editor core.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures while constructing or reconfiguring an editor session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid highlight rule `{pattern}`: {source}")]
    Rule {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("could not load grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),
}

/// Failures of the deep-analysis completion engine.
///
/// These never reach the user; the completion chain falls back instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis timed out after {0:?}")]
    Timeout(Duration),
    #[error("analysis worker is not running")]
    Unavailable,
    #[error("analysis engine failed: {0}")]
    Engine(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed analysis response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while running the buffer through the interpreter.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not write temporary script: {0}")]
    TempFile(#[source] std::io::Error),
    #[error("could not start `{interpreter}`: {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while loading a stylesheet theme.
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("Theme '{0}' not found.")]
    NotFound(String),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while opening a file into a new tab.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Failures while loading the editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
