pub mod c;
pub mod cpp;
pub mod csharp;
pub mod go;
pub mod java;
pub mod javascript;
pub mod kotlin;
pub mod php;
pub mod python;
pub mod rust;
#[cfg(feature = "swift")]
pub mod swift;
pub mod typescript;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tree_sitter::{Node, Query};

/// A language grammar bundles the tree-sitter language with the pattern
/// queries the extraction worker runs against each file.
///
/// Query capture conventions:
/// - definitions: `@name` plus a `@definition.<kind>` capture on the
///   defining node (`definition.function`, `definition.class`, ...)
/// - imports: `@import.specifier` on the raw specifier node
/// - calls: `@call.name` on the called identifier
/// - heritage: `@class.name` plus one of `@extends.name`,
///   `@implements.name`, `@trait.name` (Rust trait impls) or `@base.name`
///   (languages where base class and interface are syntactically identical)
pub trait LanguageGrammar: Send + Sync {
    fn name(&self) -> &'static str;
    fn file_extensions(&self) -> &[&'static str];
    fn language(&self) -> tree_sitter::Language;

    fn definitions_query(&self) -> &str;
    fn imports_query(&self) -> &str;
    fn calls_query(&self) -> &str;

    /// Extends/implements/trait-impl patterns. Empty for languages without
    /// inheritance constructs.
    fn heritage_query(&self) -> &str {
        ""
    }

    /// Language-specific export visibility for a captured definition node.
    fn is_exported(&self, node: &Node, name: &str, source: &str) -> bool {
        let _ = (node, name, source);
        false
    }

    /// Get cached definitions query (compiled once)
    fn cached_definitions_query(&self) -> Option<&'static Query> {
        None
    }

    /// Get cached imports query (compiled once)
    fn cached_imports_query(&self) -> Option<&'static Query> {
        None
    }

    /// Get cached calls query (compiled once)
    fn cached_calls_query(&self) -> Option<&'static Query> {
        None
    }

    /// Get cached heritage query (compiled once)
    fn cached_heritage_query(&self) -> Option<&'static Query> {
        None
    }
}

pub struct LanguageRegistry {
    grammars: Vec<Arc<dyn LanguageGrammar>>,
    extension_map: HashMap<String, usize>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            grammars: Vec::new(),
            extension_map: HashMap::new(),
        };

        registry.register(Arc::new(typescript::TypeScriptGrammar));
        registry.register(Arc::new(typescript::TsxGrammar));
        registry.register(Arc::new(javascript::JavaScriptGrammar));
        registry.register(Arc::new(python::PythonGrammar));
        registry.register(Arc::new(java::JavaGrammar));
        registry.register(Arc::new(c::CGrammar));
        registry.register(Arc::new(cpp::CppGrammar));
        registry.register(Arc::new(csharp::CSharpGrammar));
        registry.register(Arc::new(go::GoGrammar));
        registry.register(Arc::new(rust::RustGrammar));
        registry.register(Arc::new(php::PhpGrammar));
        #[cfg(feature = "swift")]
        registry.register(Arc::new(swift::SwiftGrammar));
        registry.register(Arc::new(kotlin::KotlinGrammar));

        registry
    }

    pub fn register(&mut self, grammar: Arc<dyn LanguageGrammar>) {
        let index = self.grammars.len();
        for ext in grammar.file_extensions() {
            self.extension_map.insert(ext.to_lowercase(), index);
        }
        self.grammars.push(grammar);
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.extension_map
            .get(&ext.to_lowercase())
            .map(|&i| self.grammars[i].clone())
    }

    /// Grammar for a file, selected by extension (case-insensitive). The
    /// `.tsx` flavour of TypeScript is picked here by filename.
    pub fn get_for_file(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get_by_extension(ext))
    }

    /// Language tag for a file, or None when the extension is unsupported
    /// (such files are dropped from analysis).
    pub fn language_tag(&self, path: &Path) -> Option<&'static str> {
        self.get_for_file(path).map(|g| g.name())
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.grammars.iter().find(|g| g.name() == name).cloned()
    }

    pub fn supported_extensions(&self) -> Vec<&str> {
        self.extension_map.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// --- shared visibility helpers used by grammar `is_exported` impls ---

/// True when any ancestor of `node` has the given kind.
pub(crate) fn has_ancestor_of_kind(node: &Node, kind: &str) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == kind {
            return true;
        }
        current = n.parent();
    }
    false
}

/// True when a direct child of `node` has the given kind.
pub(crate) fn has_child_of_kind(node: &Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(|c| c.kind() == kind);
    result
}

/// Text of the first direct child with the given kind.
pub(crate) fn child_text<'a>(node: &Node, kind: &str, source: &'a str) -> Option<&'a str> {
    let mut cursor = node.walk();
    let result = node
        .children(&mut cursor)
        .find(|c| c.kind() == kind)
        .and_then(|c| c.utf8_text(source.as_bytes()).ok());
    result
}

/// Checks the node's `modifiers` child (if any) for one of the given words,
/// walking up to the nearest declaration ancestor when the node itself has
/// none. Used by the JVM-style and Swift grammars.
pub(crate) fn modifiers_contain(node: &Node, source: &str, words: &[&str]) -> bool {
    let mut current = Some(*node);
    while let Some(n) = current {
        if let Some(text) = child_text(&n, "modifiers", source) {
            return words.iter().any(|w| text.contains(w));
        }
        current = n.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_supported_languages() {
        let registry = LanguageRegistry::new();
        for name in [
            "typescript",
            "javascript",
            "python",
            "java",
            "c",
            "cpp",
            "csharp",
            "go",
            "rust",
            "php",
            "kotlin",
        ] {
            assert!(registry.get_by_name(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn test_extension_mapping_per_spec() {
        let registry = LanguageRegistry::new();
        let cases = [
            ("ts", "typescript"),
            ("tsx", "typescript"),
            ("js", "javascript"),
            ("jsx", "javascript"),
            ("py", "python"),
            ("java", "java"),
            ("c", "c"),
            ("h", "c"),
            ("cpp", "cpp"),
            ("cc", "cpp"),
            ("cxx", "cpp"),
            ("hpp", "cpp"),
            ("hxx", "cpp"),
            ("hh", "cpp"),
            ("cs", "csharp"),
            ("go", "go"),
            ("rs", "rust"),
            ("php", "php"),
            ("phtml", "php"),
            ("php3", "php"),
            ("php4", "php"),
            ("php5", "php"),
            ("php8", "php"),
            ("kt", "kotlin"),
            ("kts", "kotlin"),
        ];
        for (ext, lang) in cases {
            let grammar = registry.get_by_extension(ext);
            assert!(grammar.is_some(), "extension {ext} unsupported");
            assert_eq!(grammar.unwrap().name(), lang, "extension {ext}");
        }
    }

    #[test]
    fn test_extension_case_insensitive() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.get_by_extension("TS").unwrap().name(), "typescript");
        assert_eq!(registry.get_by_extension("Py").unwrap().name(), "python");
    }

    #[test]
    fn test_unknown_extension_dropped() {
        let registry = LanguageRegistry::new();
        assert!(registry.get_by_extension("md").is_none());
        assert!(registry.get_by_extension("json").is_none());
        assert!(registry.language_tag(Path::new("README.md")).is_none());
        assert!(registry.language_tag(Path::new("Makefile")).is_none());
    }

    #[test]
    fn test_language_tag_for_file() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.language_tag(Path::new("src/main.rs")), Some("rust"));
        assert_eq!(
            registry.language_tag(Path::new("src/App.tsx")),
            Some("typescript")
        );
        assert_eq!(
            registry.language_tag(Path::new("web/index.php")),
            Some("php")
        );
    }

    #[cfg(feature = "swift")]
    #[test]
    fn test_swift_feature_enabled() {
        let registry = LanguageRegistry::new();
        assert_eq!(
            registry.language_tag(Path::new("App/AppDelegate.swift")),
            Some("swift")
        );
    }
}
