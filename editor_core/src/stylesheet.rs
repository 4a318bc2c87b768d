//! Named `.qss` stylesheets in a themes directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ThemeError;

const STYLESHEET_EXTENSION: &str = "qss";

/// Lists and loads stylesheets from one directory.
#[derive(Debug, Clone)]
pub struct ThemeManager {
    dir: PathBuf,
}

impl ThemeManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{STYLESHEET_EXTENSION}"))
    }

    /// Stylesheet names (file stems), sorted. A missing directory has none.
    pub fn available(&self) -> Result<Vec<String>, ThemeError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ThemeError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| ThemeError::Io {
                    path: self.dir.clone(),
                    source,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some(STYLESHEET_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Reads the stylesheet called `name`.
    pub fn load(&self, name: &str) -> Result<String, ThemeError> {
        let path = self.path_for(name);
        match fs::read_to_string(&path) {
            Ok(sheet) => {
                log::debug!("loaded stylesheet {}", path.display());
                Ok(sheet)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(ThemeError::NotFound(name.to_string()))
            }
            Err(source) => Err(ThemeError::Io { path, source }),
        }
    }
}
