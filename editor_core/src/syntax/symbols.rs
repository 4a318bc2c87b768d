//! Function and variable names extracted from a parse tree.

use std::collections::BTreeSet;

use tree_sitter::{Node, Tree};

/// Names defined in the current buffer. Rebuilt on every text change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    pub functions: BTreeSet<String>,
    pub variables: BTreeSet<String>,
}

impl SymbolTable {
    pub fn from_tree(tree: &Tree, source: &str) -> Self {
        let mut table = Self::default();
        table.collect(tree.root_node(), source.as_bytes());
        table
    }

    fn collect(&mut self, node: Node<'_>, source: &[u8]) {
        if node.is_error() {
            return;
        }
        match node.kind() {
            "function_definition" => {
                if let Some(name) = node
                    .child_by_field_name("name")
                    .and_then(|n| n.utf8_text(source).ok())
                {
                    self.functions.insert(name.to_string());
                }
            }
            "assignment" => {
                if let Some(target) = node
                    .child_by_field_name("left")
                    .filter(|n| n.kind() == "identifier")
                    .and_then(|n| n.utf8_text(source).ok())
                {
                    self.variables.insert(target.to_string());
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect(child, source);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.variables.is_empty()
    }

    /// Every known name, sorted and deduplicated.
    pub fn names(&self) -> BTreeSet<&str> {
        self.functions
            .iter()
            .chain(&self.variables)
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Language, SourceParser};
    use pretty_assertions::assert_eq;

    fn table(source: &str) -> SymbolTable {
        let mut parser = SourceParser::for_language(Language::Python).unwrap().unwrap();
        let tree = parser.parse_tree(source).unwrap();
        SymbolTable::from_tree(&tree, source)
    }

    #[test]
    fn test_functions_and_variables() {
        let symbols = table(
            "total = 0\n\ndef add(a, b):\n    def inner():\n        pass\n    result = a + b\n    return result\n\nobj.attr = 3\nx, y = 1, 2\n",
        );
        assert_eq!(
            symbols.functions.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["add", "inner"]
        );
        assert_eq!(
            symbols.variables.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["result", "total"]
        );
    }

    #[test]
    fn test_chained_assignment() {
        let symbols = table("a = b = 1\n");
        assert!(symbols.variables.contains("a"));
        assert!(symbols.variables.contains("b"));
    }

    #[test]
    fn test_broken_source_still_contributes() {
        let symbols = table("count = 1\n\ndef ok():\n    pass\n\nvalue = = 3\n");
        assert!(symbols.functions.contains("ok"));
        assert!(symbols.variables.contains("count"));
    }

    #[test]
    fn test_names_is_sorted_union() {
        let symbols = table("def zeta():\n    pass\nalpha = 1\n");
        assert_eq!(symbols.names().into_iter().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
    }
}
