//! Code completion.
//!
//! Providers are tried in order; the first one that produces a non-empty,
//! prefix-filtered list wins. A failing provider is skipped silently.

mod analysis;
mod jedi;
mod providers;

use std::collections::HashSet;

pub use analysis::{AnalysisEngine, DeepAnalysisProvider};
pub use jedi::JediEngine;
pub use providers::{BufferSymbolProvider, StaticKeywordProvider};

use crate::config::EditorConfig;
use crate::cursor::Position;
use crate::error::AnalysisError;
use crate::syntax::{Language, SymbolTable};

/// Everything a provider needs to know about the buffer at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Full buffer text.
    pub text: String,
    /// Cursor position (0-based line and char column).
    pub position: Position,
    /// Identifier characters immediately before the cursor.
    pub prefix: String,
    /// Session edit counter when the request was made.
    pub edit_seq: u64,
}

pub trait CompletionProvider: Send {
    fn name(&self) -> &str;

    /// Returns raw candidates; the chain filters and deduplicates them.
    fn complete(
        &mut self,
        request: &CompletionRequest,
        symbols: &SymbolTable,
    ) -> Result<Vec<String>, AnalysisError>;
}

/// Returns true for characters that can be part of an identifier.
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The run of identifier characters at the end of `before_cursor`.
pub fn identifier_prefix(before_cursor: &str) -> String {
    let mut prefix: Vec<char> = before_cursor
        .chars()
        .rev()
        .take_while(|&c| is_identifier_char(c))
        .collect();
    prefix.reverse();
    prefix.into_iter().collect()
}

/// Deduplicates `candidates` (keeping first occurrences) and keeps those
/// starting with `prefix`, ignoring case.
pub fn filter_candidates(candidates: Vec<String>, prefix: &str) -> Vec<String> {
    let prefix = prefix.to_lowercase();
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| c.to_lowercase().starts_with(&prefix))
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

/// Ordered fallback chain of providers.
pub struct CompletionChain {
    providers: Vec<Box<dyn CompletionProvider>>,
}

impl std::fmt::Debug for CompletionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

impl CompletionChain {
    pub fn new(providers: Vec<Box<dyn CompletionProvider>>) -> Self {
        Self { providers }
    }

    /// Deep analysis (when enabled and available), then buffer symbols, then
    /// the static keyword list.
    pub fn for_language(language: Language, config: &EditorConfig) -> Self {
        let mut providers: Vec<Box<dyn CompletionProvider>> = Vec::new();
        if config.deep_analysis && language == Language::Python {
            let engine = JediEngine::new(config.interpreter.clone());
            match DeepAnalysisProvider::spawn(engine, config.analysis_timeout()) {
                Ok(provider) => providers.push(Box::new(provider)),
                Err(err) => log::warn!("deep analysis disabled: {err}"),
            }
        }
        providers.push(Box::new(BufferSymbolProvider::new(language)));
        providers.push(Box::new(StaticKeywordProvider::new(language)));
        Self::new(providers)
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn complete(&mut self, request: &CompletionRequest, symbols: &SymbolTable) -> Vec<String> {
        for provider in &mut self.providers {
            match provider.complete(request, symbols) {
                Ok(candidates) => {
                    let filtered = filter_candidates(candidates, &request.prefix);
                    if !filtered.is_empty() {
                        return filtered;
                    }
                    log::debug!("{}: no candidates for {:?}", provider.name(), request.prefix);
                }
                Err(err) => log::debug!("{}: {err}, falling back", provider.name()),
            }
        }
        Vec::new()
    }
}

/// The completion popup model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionState {
    pub prefix: String,
    pub candidates: Vec<String>,
    pub selected: usize,
    pub visible: bool,
}

impl CompletionState {
    /// Replaces the candidate list; the popup is only shown when it is non-empty.
    pub fn show(&mut self, prefix: String, candidates: Vec<String>) {
        self.visible = !candidates.is_empty();
        self.prefix = prefix;
        self.candidates = candidates;
        self.selected = 0;
    }

    pub fn hide(&mut self) {
        *self = Self::default();
    }

    pub fn selected_candidate(&self) -> Option<&str> {
        if !self.visible {
            return None;
        }
        self.candidates.get(self.selected).map(String::as_str)
    }

    pub fn select_next(&mut self) {
        if self.visible && !self.candidates.is_empty() {
            self.selected = (self.selected + 1) % self.candidates.len();
        }
    }

    pub fn select_previous(&mut self) {
        if self.visible && !self.candidates.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.candidates.len() - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixed(&'static str, Result<Vec<&'static str>, ()>);

    impl CompletionProvider for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn complete(
            &mut self,
            _request: &CompletionRequest,
            _symbols: &SymbolTable,
        ) -> Result<Vec<String>, AnalysisError> {
            match &self.1 {
                Ok(words) => Ok(words.iter().map(|w| w.to_string()).collect()),
                Err(()) => Err(AnalysisError::Engine("boom".to_string())),
            }
        }
    }

    fn request(prefix: &str) -> CompletionRequest {
        CompletionRequest {
            text: prefix.to_string(),
            position: Position::new(0, prefix.chars().count()),
            prefix: prefix.to_string(),
            edit_seq: 1,
        }
    }

    #[test]
    fn test_identifier_prefix() {
        assert_eq!(identifier_prefix("x = pri"), "pri");
        assert_eq!(identifier_prefix("foo.ba_r2"), "ba_r2");
        assert_eq!(identifier_prefix("print("), "");
        assert_eq!(identifier_prefix(""), "");
    }

    #[test]
    fn test_filter_is_case_insensitive_and_dedups() {
        let words = ["Print", "print", "pass", "print", "range"]
            .iter()
            .map(|w| w.to_string())
            .collect();
        assert_eq!(filter_candidates(words, "PR"), vec!["Print", "print"]);
    }

    #[test]
    fn test_chain_falls_back_past_errors_and_empty_results() {
        let mut chain = CompletionChain::new(vec![
            Box::new(Fixed("broken", Err(()))),
            Box::new(Fixed("unrelated", Ok(vec!["zeta"]))),
            Box::new(Fixed("words", Ok(vec!["alpha", "beta", "alphabet"]))),
        ]);
        assert_eq!(
            chain.complete(&request("al"), &SymbolTable::default()),
            vec!["alpha", "alphabet"]
        );
        assert!(chain.complete(&request("q"), &SymbolTable::default()).is_empty());
    }

    #[test]
    fn test_standard_chain_without_deep_analysis() {
        let config = EditorConfig {
            deep_analysis: false,
            ..EditorConfig::default()
        };
        let chain = CompletionChain::for_language(Language::Python, &config);
        assert_eq!(chain.provider_names(), vec!["buffer-symbols", "static-keywords"]);
    }

    #[test]
    fn test_state_navigation_wraps() {
        let mut state = CompletionState::default();
        state.show("p".to_string(), vec!["pass".to_string(), "print".to_string()]);
        assert_eq!(state.selected_candidate(), Some("pass"));
        state.select_previous();
        assert_eq!(state.selected_candidate(), Some("print"));
        state.select_next();
        assert_eq!(state.selected_candidate(), Some("pass"));

        state.show("q".to_string(), Vec::new());
        assert!(!state.visible);
        assert_eq!(state.selected_candidate(), None);
    }
}
