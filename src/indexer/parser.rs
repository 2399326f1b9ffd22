use std::path::Path;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use crate::error::{AtlasError, Result};
use crate::languages::{LanguageGrammar, LanguageRegistry};

/// Parser host. Owns one long-lived tree-sitter parser that is re-targeted
/// per file; extraction workers each construct their own host, so the inner
/// mutex is never contended.
pub struct SourceParser {
    registry: LanguageRegistry,
    parser: Mutex<tree_sitter::Parser>,
}

impl SourceParser {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self {
            registry,
            parser: Mutex::new(tree_sitter::Parser::new()),
        }
    }

    pub fn grammar_for(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        self.registry.get_for_file(path)
    }

    pub fn parse_file(&self, root: &Path, relative_path: &str) -> Result<ParsedFile> {
        let grammar = self
            .registry
            .get_for_file(Path::new(relative_path))
            .ok_or_else(|| AtlasError::UnsupportedLanguage(relative_path.to_string()))?;
        let source = std::fs::read_to_string(root.join(relative_path))?;
        self.parse_source(&source, grammar)
    }

    pub fn parse_source(
        &self,
        source: &str,
        grammar: Arc<dyn LanguageGrammar>,
    ) -> Result<ParsedFile> {
        let mut parser = self.parser.lock().unwrap();
        parser
            .set_language(&grammar.language())
            .map_err(|e| AtlasError::Parse(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AtlasError::Parse("failed to parse source".to_string()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_string(),
            language: grammar.name().to_string(),
            grammar,
        })
    }
}

pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: String,
    pub language: String,
    pub grammar: Arc<dyn LanguageGrammar>,
}

impl ParsedFile {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn node_text(&self, node: &tree_sitter::Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }
}

/// Bounded LRU over parsed trees, keyed by file path. A `get` refreshes the
/// entry's recency; inserting past capacity drops the least-recently-used
/// entry and releases its tree.
pub struct AstCache<V> {
    entries: IndexMap<String, V>,
    max_entries: usize,
}

impl<V> AstCache<V> {
    pub const DEFAULT_MAX_ENTRIES: usize = 50;

    pub fn new() -> Self {
        Self::with_max_entries(Self::DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn get(&mut self, path: &str) -> Option<&V> {
        let index = self.entries.get_index_of(path)?;
        let last = self.entries.len() - 1;
        self.entries.move_index(index, last);
        self.entries.get(path)
    }

    pub fn put(&mut self, path: impl Into<String>, value: V) {
        let path = path.into();
        if self.entries.shift_remove(&path).is_none() && self.entries.len() >= self.max_entries {
            // evict least-recently-used (front of the order)
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(path, value);
    }

    pub fn invalidate(&mut self, path: &str) -> bool {
        self.entries.shift_remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}

impl<V> Default for AstCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
