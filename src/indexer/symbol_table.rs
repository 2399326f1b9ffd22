use std::collections::{HashMap, HashSet};

use crate::graph::NodeKind;

/// One hit in the name-only index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyHit {
    pub node_id: String,
    pub file_path: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolTableStats {
    pub file_count: usize,
    /// Number of distinct symbol names across the repository.
    pub global_symbol_count: usize,
}

/// Two-level symbol index built after extraction finishes.
///
/// `exact` resolves (file, name) with last-writer-wins semantics; `fuzzy`
/// keeps every definition of a name in insertion order, duplicates
/// included, so call resolution ties break on file order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    exact: HashMap<(String, String), String>,
    fuzzy: HashMap<String, Vec<FuzzyHit>>,
    files: HashSet<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file_path: &str, name: &str, node_id: &str, kind: NodeKind) {
        self.exact.insert(
            (file_path.to_string(), name.to_string()),
            node_id.to_string(),
        );
        self.fuzzy
            .entry(name.to_string())
            .or_default()
            .push(FuzzyHit {
                node_id: node_id.to_string(),
                file_path: file_path.to_string(),
                kind,
            });
        self.files.insert(file_path.to_string());
    }

    pub fn lookup_exact(&self, file_path: &str, name: &str) -> Option<&str> {
        self.exact
            .get(&(file_path.to_string(), name.to_string()))
            .map(String::as_str)
    }

    pub fn lookup_fuzzy(&self, name: &str) -> &[FuzzyHit] {
        self.fuzzy.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.exact.clear();
        self.fuzzy.clear();
        self.files.clear();
    }

    pub fn stats(&self) -> SymbolTableStats {
        SymbolTableStats {
            file_count: self.files.len(),
            global_symbol_count: self.fuzzy.len(),
        }
    }
}
