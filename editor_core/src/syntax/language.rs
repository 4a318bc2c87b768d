//! Language detection and per-language word lists.
//!
//! Each language registers its own highlight rule table (see
//! `highlighter::rules_for`) and optionally a tree-sitter grammar used for
//! diagnostics and symbol extraction.

use std::path::Path;

/// Python reserved words (`keyword.kwlist`).
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Names bound in Python's builtins module that get their own highlight.
const PYTHON_BUILTINS: &[&str] = &[
    "abs", "aiter", "all", "anext", "any", "ascii", "bin", "bool", "breakpoint", "bytearray",
    "bytes", "callable", "chr", "classmethod", "compile", "complex", "copyright", "credits",
    "delattr", "dict", "dir", "divmod", "enumerate", "eval", "exec", "exit", "filter", "float",
    "format", "frozenset", "getattr", "globals", "hasattr", "hash", "help", "hex", "id", "input",
    "int", "isinstance", "issubclass", "iter", "len", "license", "list", "locals", "map", "max",
    "memoryview", "min", "next", "object", "oct", "open", "ord", "pow", "print", "property",
    "quit", "range", "repr", "reversed", "round", "set", "setattr", "slice", "sorted",
    "staticmethod", "str", "sum", "super", "tuple", "type", "vars", "zip", "Ellipsis",
    "NotImplemented", "BaseException", "Exception", "ArithmeticError", "AssertionError",
    "AttributeError", "EOFError", "FileNotFoundError", "ImportError", "IndexError", "KeyError",
    "KeyboardInterrupt", "NameError", "NotImplementedError", "OSError", "OverflowError",
    "RecursionError", "RuntimeError", "StopIteration", "SyntaxError", "SystemExit",
    "TypeError", "ValueError", "ZeroDivisionError", "__name__", "__file__", "__doc__",
    "__import__",
];

/// Extra names offered by the static completion list on top of the keywords.
const PYTHON_COMPLETION_EXTRAS: &[&str] = &[
    "print", "len", "range", "int", "float", "str", "list", "dict", "set", "tuple", "input",
    "open", "close", "exit", "help", "type",
];

/// Insertable code templates, by menu name. The caret lands at the end.
const PYTHON_SNIPPETS: &[(&str, &str)] = &[
    ("If Statement", "if condition:\n    "),
    ("For Loop", "for item in iterable:\n    "),
    ("While Loop", "while condition:\n    "),
    ("Function", "def function_name(parameters):\n    "),
    ("Class", "class ClassName:\n    def __init__(self):\n        "),
];

/// Supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    Python,
    PlainText,
}

impl Language {
    /// Detects language from a file path based on extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::PlainText)
    }

    /// Detects language from a file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" | "pyw" | "pyi" => Self::Python,
            _ => Self::PlainText,
        }
    }

    /// Returns the display name of the language.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::PlainText => "Plain Text",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Python => PYTHON_KEYWORDS,
            Self::PlainText => &[],
        }
    }

    pub fn builtins(&self) -> &'static [&'static str] {
        match self {
            Self::Python => PYTHON_BUILTINS,
            Self::PlainText => &[],
        }
    }

    /// The fixed static completion list: keywords plus common builtins, sorted
    /// and deduplicated.
    pub fn completion_words(&self) -> Vec<String> {
        let extras: &[&str] = match self {
            Self::Python => PYTHON_COMPLETION_EXTRAS,
            Self::PlainText => &[],
        };
        let mut words: Vec<String> = self
            .keywords()
            .iter()
            .chain(extras)
            .map(|w| w.to_string())
            .collect();
        words.sort();
        words.dedup();
        words
    }

    pub fn snippets(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Python => PYTHON_SNIPPETS,
            Self::PlainText => &[],
        }
    }

    pub fn snippet(&self, name: &str) -> Option<&'static str> {
        self.snippets()
            .iter()
            .find(|(snippet, _)| *snippet == name)
            .map(|(_, body)| *body)
    }

    /// Returns the tree-sitter grammar for this language, if available.
    pub fn tree_sitter_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Self::PlainText => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("PYI"), Language::Python);
        assert_eq!(Language::from_extension("txt"), Language::PlainText);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Language::from_path(Path::new("main.py")), Language::Python);
        assert_eq!(Language::from_path(Path::new("README")), Language::PlainText);
    }

    #[test]
    fn test_completion_words_sorted_and_unique() {
        let words = Language::Python.completion_words();
        let mut sorted = words.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(words, sorted);
        assert!(words.contains(&"print".to_string()));
        assert!(words.contains(&"lambda".to_string()));
        assert!(Language::PlainText.completion_words().is_empty());
    }

    #[test]
    fn test_snippets_by_name() {
        let names: Vec<&str> = Language::Python.snippets().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["If Statement", "For Loop", "While Loop", "Function", "Class"]);
        assert_eq!(Language::Python.snippet("For Loop"), Some("for item in iterable:\n    "));
        assert_eq!(Language::Python.snippet("Decorator"), None);
        assert_eq!(Language::PlainText.snippet("Class"), None);
    }

    #[test]
    fn test_tree_sitter_language() {
        assert!(Language::Python.tree_sitter_language().is_some());
        assert!(Language::PlainText.tree_sitter_language().is_none());
    }
}
