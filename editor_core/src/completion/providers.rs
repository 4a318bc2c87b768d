//! Providers backed by static word lists and the buffer's symbol table.

use std::collections::BTreeSet;

use super::{CompletionProvider, CompletionRequest};
use crate::error::AnalysisError;
use crate::syntax::{Language, SymbolTable};

/// The fixed keyword/builtin list for a language.
#[derive(Debug, Clone)]
pub struct StaticKeywordProvider {
    words: Vec<String>,
}

impl StaticKeywordProvider {
    pub fn new(language: Language) -> Self {
        Self {
            words: language.completion_words(),
        }
    }
}

impl CompletionProvider for StaticKeywordProvider {
    fn name(&self) -> &str {
        "static-keywords"
    }

    fn complete(
        &mut self,
        _request: &CompletionRequest,
        _symbols: &SymbolTable,
    ) -> Result<Vec<String>, AnalysisError> {
        Ok(self.words.clone())
    }
}

/// Keywords plus every function and variable name defined in the buffer.
#[derive(Debug, Clone)]
pub struct BufferSymbolProvider {
    words: Vec<String>,
}

impl BufferSymbolProvider {
    pub fn new(language: Language) -> Self {
        Self {
            words: language.completion_words(),
        }
    }
}

impl CompletionProvider for BufferSymbolProvider {
    fn name(&self) -> &str {
        "buffer-symbols"
    }

    fn complete(
        &mut self,
        _request: &CompletionRequest,
        symbols: &SymbolTable,
    ) -> Result<Vec<String>, AnalysisError> {
        let union: BTreeSet<&str> = self
            .words
            .iter()
            .map(String::as_str)
            .chain(symbols.names())
            .collect();
        Ok(union.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Position;

    fn request() -> CompletionRequest {
        CompletionRequest {
            text: String::new(),
            position: Position::default(),
            prefix: String::new(),
            edit_seq: 0,
        }
    }

    #[test]
    fn test_buffer_symbols_are_merged_and_sorted() {
        let mut symbols = SymbolTable::default();
        symbols.functions.insert("compute".to_string());
        symbols.variables.insert("print".to_string());
        symbols.variables.insert("counter".to_string());

        let mut provider = BufferSymbolProvider::new(Language::Python);
        let words = provider.complete(&request(), &symbols).unwrap();

        let mut sorted = words.clone();
        sorted.sort();
        assert_eq!(words, sorted);
        assert!(words.contains(&"compute".to_string()));
        assert!(words.contains(&"counter".to_string()));
        assert_eq!(words.iter().filter(|w| *w == "print").count(), 1);
    }

    #[test]
    fn test_static_list_ignores_symbols() {
        let mut symbols = SymbolTable::default();
        symbols.functions.insert("compute".to_string());
        let mut provider = StaticKeywordProvider::new(Language::Python);
        let words = provider.complete(&request(), &symbols).unwrap();
        assert_eq!(words, Language::Python.completion_words());
    }
}
