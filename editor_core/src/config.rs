//! Editor configuration.
//!
//! Every field has a default so a partial (or missing) `laefex.toml` is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

fn default_analysis_timeout_ms() -> u64 {
    150
}

fn default_true() -> bool {
    true
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_themes_dir() -> PathBuf {
    PathBuf::from("bin/themes")
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_history_size() -> usize {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditorConfig {
    /// Upper bound for a deep-analysis completion request.
    #[serde(default = "default_analysis_timeout_ms")]
    pub analysis_timeout_ms: u64,
    /// Whether the deep-analysis provider is consulted at all.
    #[serde(default = "default_true")]
    pub deep_analysis: bool,
    /// Interpreter used by the runner and the analysis engine.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_themes_dir")]
    pub themes_dir: PathBuf,
    #[serde(default = "default_theme")]
    pub default_theme: String,
    /// Maximum number of undo groups kept per session.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            analysis_timeout_ms: default_analysis_timeout_ms(),
            deep_analysis: default_true(),
            interpreter: default_interpreter(),
            themes_dir: default_themes_dir(),
            default_theme: default_theme(),
            history_size: default_history_size(),
        }
    }
}

impl EditorConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads the configuration at `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_millis(self.analysis_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = EditorConfig::from_toml_str("interpreter = \"python3.12\"\n").unwrap();
        assert_eq!(
            config,
            EditorConfig {
                interpreter: "python3.12".to_string(),
                ..EditorConfig::default()
            }
        );
        assert_eq!(config.analysis_timeout(), Duration::from_millis(150));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(&dir.path().join("laefex.toml")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("laefex.toml");
        std::fs::write(&path, "history_size = \"lots\"").unwrap();
        assert!(matches!(
            EditorConfig::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
