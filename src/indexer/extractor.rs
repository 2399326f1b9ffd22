use std::collections::HashSet;

use tree_sitter::{Query, StreamingIterator};

use crate::error::{AtlasError, Result};
use crate::graph::NodeKind;
use crate::indexer::parser::ParsedFile;

/// How a heritage record relates child to parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeritageKind {
    Extends,
    Implements,
    TraitImpl,
}

#[derive(Debug, Clone)]
pub struct RawDefinition {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub is_exported: bool,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct RawImport {
    pub file_path: String,
    pub specifier: String,
}

#[derive(Debug, Clone)]
pub struct RawCall {
    pub file_path: String,
    pub called_name: String,
    /// Id of the innermost enclosing definition.
    pub source_id: String,
}

#[derive(Debug, Clone)]
pub struct RawHeritage {
    pub file_path: String,
    pub class_name: String,
    pub parent_name: String,
    pub kind: HeritageKind,
}

/// Everything one file contributes, in stable definition order.
#[derive(Debug, Default)]
pub struct FileExtraction {
    pub file_path: String,
    pub language: String,
    pub definitions: Vec<RawDefinition>,
    pub imports: Vec<RawImport>,
    pub calls: Vec<RawCall>,
    pub heritage: Vec<RawHeritage>,
}

/// A compiled query, either shared from a grammar's static cache or owned
/// for this extraction only.
enum QueryRef {
    Static(&'static Query),
    Owned(Query),
}

impl std::ops::Deref for QueryRef {
    type Target = Query;

    fn deref(&self) -> &Query {
        match self {
            QueryRef::Static(q) => q,
            QueryRef::Owned(q) => q,
        }
    }
}

pub struct SymbolExtractor;

impl SymbolExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, parsed: &ParsedFile, file_path: &str) -> Result<FileExtraction> {
        let mut result = FileExtraction {
            file_path: file_path.to_string(),
            language: parsed.language.clone(),
            ..Default::default()
        };

        self.extract_definitions(parsed, file_path, &mut result.definitions)?;
        self.extract_calls(parsed, file_path, &result.definitions, &mut result.calls)?;
        self.extract_imports(parsed, file_path, &mut result.imports)?;
        self.extract_heritage(parsed, file_path, &mut result.heritage)?;

        Ok(result)
    }

    fn query_for(
        &self,
        parsed: &ParsedFile,
        cached: Option<&'static Query>,
        text: &str,
        what: &str,
    ) -> Result<Option<QueryRef>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        if let Some(q) = cached {
            return Ok(Some(QueryRef::Static(q)));
        }
        let query = Query::new(&parsed.grammar.language(), text)
            .map_err(|e| AtlasError::Parse(format!("invalid {what} query: {e}")))?;
        Ok(Some(QueryRef::Owned(query)))
    }

    fn extract_definitions(
        &self,
        parsed: &ParsedFile,
        file_path: &str,
        definitions: &mut Vec<RawDefinition>,
    ) -> Result<()> {
        let Some(query) = self.query_for(
            parsed,
            parsed.grammar.cached_definitions_query(),
            parsed.grammar.definitions_query(),
            "definitions",
        )?
        else {
            return Ok(());
        };

        struct Found {
            kind: NodeKind,
            name: String,
            start_line: u32,
            end_line: u32,
            is_exported: bool,
            text: String,
        }

        let mut found: Vec<Found> = Vec::new();
        let mut cursor = tree_sitter::QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.root_node(), parsed.source_bytes());

        while let Some(m) = matches.next() {
            let mut name: Option<&str> = None;
            let mut kind: Option<NodeKind> = None;
            let mut node: Option<tree_sitter::Node> = None;

            for capture in m.captures {
                let capture_name = query.capture_names()[capture.index as usize];
                if capture_name == "name" {
                    name = Some(parsed.node_text(&capture.node));
                } else if let Some(suffix) = capture_name.strip_prefix("definition.") {
                    kind = NodeKind::from_capture_suffix(suffix);
                    node = Some(capture.node);
                }
            }

            if let (Some(name), Some(kind), Some(node)) = (name, kind, node) {
                if name.is_empty() {
                    continue;
                }
                found.push(Found {
                    kind,
                    name: name.to_string(),
                    start_line: node.start_position().row as u32 + 1,
                    end_line: node.end_position().row as u32 + 1,
                    is_exported: parsed.grammar.is_exported(&node, name, &parsed.source),
                    text: parsed.node_text(&node).to_string(),
                });
            }
        }

        // Some grammars match the same node through two patterns (a class
        // body function is both a method and a bare function). Prefer the
        // method reading; otherwise the first match wins.
        let mut deduped: Vec<Found> = Vec::new();
        for item in found {
            if let Some(existing) = deduped
                .iter_mut()
                .find(|d| d.name == item.name && d.start_line == item.start_line)
            {
                if existing.kind == NodeKind::Function && item.kind == NodeKind::Method {
                    existing.kind = NodeKind::Method;
                }
                continue;
            }
            deduped.push(item);
        }

        deduped.sort_by(|a, b| {
            a.start_line
                .cmp(&b.start_line)
                .then(b.end_line.cmp(&a.end_line))
                .then(a.name.cmp(&b.name))
        });

        // Ids stay short; a start line is appended only when overloads in
        // the same file would collide.
        let mut used_ids: HashSet<String> = HashSet::new();
        for item in deduped {
            let base_id = format!("{}:{}:{}", item.kind.as_str(), file_path, item.name);
            let id = if used_ids.insert(base_id.clone()) {
                base_id
            } else {
                let with_line = format!("{base_id}:{}", item.start_line);
                used_ids.insert(with_line.clone());
                with_line
            };
            definitions.push(RawDefinition {
                id,
                kind: item.kind,
                name: item.name,
                file_path: file_path.to_string(),
                start_line: item.start_line,
                end_line: item.end_line,
                is_exported: item.is_exported,
                text: item.text,
            });
        }

        Ok(())
    }

    fn extract_calls(
        &self,
        parsed: &ParsedFile,
        file_path: &str,
        definitions: &[RawDefinition],
        calls: &mut Vec<RawCall>,
    ) -> Result<()> {
        let Some(query) = self.query_for(
            parsed,
            parsed.grammar.cached_calls_query(),
            parsed.grammar.calls_query(),
            "calls",
        )?
        else {
            return Ok(());
        };

        let mut cursor = tree_sitter::QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.root_node(), parsed.source_bytes());

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let capture_name = query.capture_names()[capture.index as usize];
                if capture_name != "call.name" {
                    continue;
                }
                let called_name = parsed.node_text(&capture.node);
                if called_name.is_empty() {
                    continue;
                }
                let line = capture.node.start_position().row as u32 + 1;
                // Calls outside any definition have no caller to attach to.
                if let Some(source) = Self::enclosing_definition(definitions, line) {
                    calls.push(RawCall {
                        file_path: file_path.to_string(),
                        called_name: called_name.to_string(),
                        source_id: source.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Innermost definition whose line range contains `line`.
    fn enclosing_definition(definitions: &[RawDefinition], line: u32) -> Option<&RawDefinition> {
        definitions
            .iter()
            .filter(|d| d.start_line <= line && line <= d.end_line)
            .max_by_key(|d| d.start_line)
    }

    fn extract_imports(
        &self,
        parsed: &ParsedFile,
        file_path: &str,
        imports: &mut Vec<RawImport>,
    ) -> Result<()> {
        let Some(query) = self.query_for(
            parsed,
            parsed.grammar.cached_imports_query(),
            parsed.grammar.imports_query(),
            "imports",
        )?
        else {
            return Ok(());
        };

        let mut cursor = tree_sitter::QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.root_node(), parsed.source_bytes());

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let capture_name = query.capture_names()[capture.index as usize];
                if capture_name != "import.specifier" {
                    continue;
                }
                let raw = parsed.node_text(&capture.node);
                let specifier = raw.trim_matches(|c| matches!(c, '"' | '\'' | '`' | '<' | '>'));
                if specifier.is_empty() {
                    continue;
                }
                imports.push(RawImport {
                    file_path: file_path.to_string(),
                    specifier: specifier.to_string(),
                });
            }
        }

        Ok(())
    }

    fn extract_heritage(
        &self,
        parsed: &ParsedFile,
        file_path: &str,
        heritage: &mut Vec<RawHeritage>,
    ) -> Result<()> {
        let Some(query) = self.query_for(
            parsed,
            parsed.grammar.cached_heritage_query(),
            parsed.grammar.heritage_query(),
            "heritage",
        )?
        else {
            return Ok(());
        };

        let mut cursor = tree_sitter::QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.root_node(), parsed.source_bytes());

        while let Some(m) = matches.next() {
            let mut class_name: Option<&str> = None;
            let mut parents: Vec<(&str, HeritageKind)> = Vec::new();

            for capture in m.captures {
                let capture_name = query.capture_names()[capture.index as usize];
                let text = parsed.node_text(&capture.node);
                match capture_name {
                    "class.name" => class_name = Some(text),
                    "extends.name" => parents.push((text, HeritageKind::Extends)),
                    "implements.name" => parents.push((text, HeritageKind::Implements)),
                    "trait.name" => parents.push((text, HeritageKind::TraitImpl)),
                    // Base lists that mix classes and interfaces are split
                    // by the I-prefix naming convention.
                    "base.name" => {
                        let kind = if looks_like_interface(text) {
                            HeritageKind::Implements
                        } else {
                            HeritageKind::Extends
                        };
                        parents.push((text, kind));
                    }
                    _ => {}
                }
            }

            if let Some(class_name) = class_name {
                for (parent_name, kind) in parents {
                    if parent_name.is_empty() {
                        continue;
                    }
                    heritage.push(RawHeritage {
                        file_path: file_path.to_string(),
                        class_name: class_name.to_string(),
                        parent_name: parent_name.to_string(),
                        kind,
                    });
                }
            }
        }

        Ok(())
    }
}

impl Default for SymbolExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn looks_like_interface(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('I') && chars.next().map(|c| c.is_uppercase()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::parser::SourceParser;
    use crate::languages::LanguageRegistry;

    fn extract(source: &str, language: &str, filename: &str) -> FileExtraction {
        let registry = LanguageRegistry::new();
        let grammar = registry.get_by_name(language).unwrap();
        let parser = SourceParser::new(LanguageRegistry::new());
        let parsed = parser.parse_source(source, grammar).unwrap();
        SymbolExtractor::new().extract(&parsed, filename).unwrap()
    }

    // === TypeScript ===

    #[test]
    fn test_ts_function_definition() {
        let result = extract(
            "export function handleRequest(req: string) { return req; }",
            "typescript",
            "src/handler.ts",
        );
        let def = result
            .definitions
            .iter()
            .find(|d| d.name == "handleRequest")
            .unwrap();
        assert_eq!(def.kind, NodeKind::Function);
        assert_eq!(def.id, "Function:src/handler.ts:handleRequest");
        assert!(def.is_exported);
        assert_eq!(def.start_line, 1);
    }

    #[test]
    fn test_ts_unexported_function() {
        let result = extract(
            "function helper() { return 1; }",
            "typescript",
            "src/a.ts",
        );
        assert!(!result.definitions[0].is_exported);
    }

    #[test]
    fn test_ts_class_interface_enum_alias() {
        let source = r#"
export class RequestHandler {}
interface Options { id: number; }
enum Mode { A, B }
type Alias = string;
"#;
        let result = extract(source, "typescript", "src/a.ts");
        let kind_of = |name: &str| {
            result
                .definitions
                .iter()
                .find(|d| d.name == name)
                .map(|d| d.kind)
        };
        assert_eq!(kind_of("RequestHandler"), Some(NodeKind::Class));
        assert_eq!(kind_of("Options"), Some(NodeKind::Interface));
        assert_eq!(kind_of("Mode"), Some(NodeKind::Enum));
        assert_eq!(kind_of("Alias"), Some(NodeKind::TypeAlias));
    }

    #[test]
    fn test_ts_arrow_function() {
        let result = extract(
            "export const validate = (x: number) => x > 0;",
            "typescript",
            "src/v.ts",
        );
        let def = result
            .definitions
            .iter()
            .find(|d| d.name == "validate")
            .unwrap();
        assert_eq!(def.kind, NodeKind::Function);
        assert!(def.is_exported);
    }

    #[test]
    fn test_ts_calls_attach_to_enclosing_definition() {
        let source = r#"
export function handleRequest(input: string) {
    validateInput(input);
    saveToDb(input);
    return formatResponse(input);
}
"#;
        let result = extract(source, "typescript", "src/handler.ts");
        assert_eq!(result.calls.len(), 3);
        for call in &result.calls {
            assert_eq!(call.source_id, "Function:src/handler.ts:handleRequest");
        }
        let names: Vec<&str> = result.calls.iter().map(|c| c.called_name.as_str()).collect();
        assert!(names.contains(&"validateInput"));
        assert!(names.contains(&"saveToDb"));
        assert!(names.contains(&"formatResponse"));
    }

    #[test]
    fn test_ts_top_level_call_dropped() {
        let result = extract("console.log('hi');", "typescript", "src/a.ts");
        assert!(result.calls.is_empty());
    }

    #[test]
    fn test_ts_imports() {
        let source = r#"
import { validateInput } from './validator';
import db from "./db";
"#;
        let result = extract(source, "typescript", "src/handler.ts");
        let specs: Vec<&str> = result.imports.iter().map(|i| i.specifier.as_str()).collect();
        assert_eq!(specs, vec!["./validator", "./db"]);
    }

    #[test]
    fn test_ts_heritage_extends_and_implements() {
        let source = r#"
class Base {}
interface Serializable {}
class Child extends Base implements Serializable {}
"#;
        let result = extract(source, "typescript", "src/a.ts");
        assert!(result
            .heritage
            .iter()
            .any(|h| h.class_name == "Child"
                && h.parent_name == "Base"
                && h.kind == HeritageKind::Extends));
        assert!(result
            .heritage
            .iter()
            .any(|h| h.class_name == "Child"
                && h.parent_name == "Serializable"
                && h.kind == HeritageKind::Implements));
    }

    #[test]
    fn test_overload_ids_disambiguated_by_line() {
        // Same name twice in one file: the second id carries its start line.
        let source = "function f() {}\nnamespace X {}\nfunction f() {}\n";
        let result = extract(source, "typescript", "src/a.ts");
        let ids: Vec<&str> = result
            .definitions
            .iter()
            .filter(|d| d.name == "f")
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], "Function:src/a.ts:f");
        assert_eq!(ids[1], "Function:src/a.ts:f:3");
    }

    // === Rust ===

    #[test]
    fn test_rust_definitions() {
        let source = r#"
pub struct Point { x: f64 }

impl Point {
    pub fn new() -> Self { Point { x: 0.0 } }
}

pub trait Drawable { fn draw(&self); }

impl Drawable for Point {
    fn draw(&self) {}
}

fn helper() {}
"#;
        let result = extract(source, "rust", "src/point.rs");
        let find = |name: &str| result.definitions.iter().find(|d| d.name == name).unwrap();
        assert_eq!(find("Point").kind, NodeKind::Struct);
        assert!(find("Point").is_exported);
        assert_eq!(find("new").kind, NodeKind::Method);
        assert_eq!(find("Drawable").kind, NodeKind::Trait);
        assert_eq!(find("helper").kind, NodeKind::Function);
        assert!(!find("helper").is_exported);
    }

    #[test]
    fn test_rust_trait_impl_heritage() {
        let source = r#"
struct Point;
trait Drawable { fn draw(&self); }
impl Drawable for Point {
    fn draw(&self) {}
}
"#;
        let result = extract(source, "rust", "src/a.rs");
        let h = result
            .heritage
            .iter()
            .find(|h| h.kind == HeritageKind::TraitImpl)
            .unwrap();
        assert_eq!(h.class_name, "Point");
        assert_eq!(h.parent_name, "Drawable");
    }

    #[test]
    fn test_rust_calls_include_macros() {
        let source = r#"
fn run() {
    helper();
    println!("x");
}
fn helper() {}
"#;
        let result = extract(source, "rust", "src/a.rs");
        let names: Vec<&str> = result.calls.iter().map(|c| c.called_name.as_str()).collect();
        assert!(names.contains(&"helper"));
        assert!(names.contains(&"println"));
    }

    // === Python ===

    #[test]
    fn test_python_methods_vs_functions() {
        let source = r#"
class Service:
    def process(self):
        return self._hidden()

    def _hidden(self):
        return 1

def top_level():
    pass
"#;
        let result = extract(source, "python", "svc.py");
        let find = |name: &str| result.definitions.iter().find(|d| d.name == name).unwrap();
        assert_eq!(find("Service").kind, NodeKind::Class);
        assert_eq!(find("process").kind, NodeKind::Method);
        assert_eq!(find("top_level").kind, NodeKind::Function);
        assert!(find("process").is_exported);
        assert!(!find("_hidden").is_exported);
    }

    #[test]
    fn test_python_heritage() {
        let source = "class Base: pass\nclass Child(Base): pass\n";
        let result = extract(source, "python", "a.py");
        assert!(result
            .heritage
            .iter()
            .any(|h| h.class_name == "Child" && h.parent_name == "Base"));
    }

    // === Go ===

    #[test]
    fn test_go_export_by_case() {
        let source = r#"
package main

func Exported() {}
func internal() {}
"#;
        let result = extract(source, "go", "main.go");
        let find = |name: &str| result.definitions.iter().find(|d| d.name == name).unwrap();
        assert!(find("Exported").is_exported);
        assert!(!find("internal").is_exported);
    }

    // === General ===

    #[test]
    fn test_extract_empty_source() {
        let result = extract("", "rust", "empty.rs");
        assert!(result.definitions.is_empty());
        assert!(result.calls.is_empty());
        assert!(result.imports.is_empty());
        assert!(result.heritage.is_empty());
    }

    #[test]
    fn test_definitions_in_line_order() {
        let source = "fn a() {}\nfn b() {}\nfn c() {}\n";
        let result = extract(source, "rust", "a.rs");
        let lines: Vec<u32> = result.definitions.iter().map(|d| d.start_line).collect();
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        assert_eq!(lines, sorted);
    }

    #[test]
    fn test_looks_like_interface() {
        assert!(looks_like_interface("IService"));
        assert!(!looks_like_interface("Service"));
        assert!(!looks_like_interface("Item"));
        assert!(!looks_like_interface("I"));
    }
}
