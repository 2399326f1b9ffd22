use once_cell::sync::OnceCell;
use tree_sitter::{Node, Query};

use super::LanguageGrammar;

pub struct GoGrammar;

// Static query caches for Go
static GO_DEFINITIONS_QUERY: OnceCell<Query> = OnceCell::new();
static GO_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();
static GO_CALLS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for GoGrammar {
    fn name(&self) -> &'static str {
        "go"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["go"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn definitions_query(&self) -> &str {
        r#"
        (function_declaration
            name: (identifier) @name
        ) @definition.function

        (method_declaration
            name: (field_identifier) @name
        ) @definition.method

        (type_declaration
            (type_spec
                name: (type_identifier) @name
                type: (struct_type)
            )
        ) @definition.struct

        (type_declaration
            (type_spec
                name: (type_identifier) @name
                type: (interface_type)
            )
        ) @definition.interface

        (type_declaration
            (type_spec
                name: (type_identifier) @name
                type: (type_identifier)
            )
        ) @definition.type
        "#
    }

    fn imports_query(&self) -> &str {
        r#"
        (import_spec
            path: (interpreted_string_literal) @import.specifier
        )
        "#
    }

    fn calls_query(&self) -> &str {
        r#"
        (call_expression
            function: (identifier) @call.name
        )

        (call_expression
            function: (selector_expression
                field: (field_identifier) @call.name
            )
        )
        "#
    }

    // Go has no inheritance; embedding is not modelled.

    fn is_exported(&self, _node: &Node, name: &str, _source: &str) -> bool {
        name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
    }

    fn cached_definitions_query(&self) -> Option<&'static Query> {
        GO_DEFINITIONS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.definitions_query()))
            .ok()
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        GO_IMPORTS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.imports_query()))
            .ok()
    }

    fn cached_calls_query(&self) -> Option<&'static Query> {
        GO_CALLS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.calls_query()))
            .ok()
    }
}
