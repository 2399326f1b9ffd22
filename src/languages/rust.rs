use once_cell::sync::OnceCell;
use tree_sitter::{Node, Query};

use super::{has_ancestor_of_kind, has_child_of_kind, LanguageGrammar};

pub struct RustGrammar;

// Static query caches for Rust
static RUST_DEFINITIONS_QUERY: OnceCell<Query> = OnceCell::new();
static RUST_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();
static RUST_CALLS_QUERY: OnceCell<Query> = OnceCell::new();
static RUST_HERITAGE_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for RustGrammar {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["rs"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn definitions_query(&self) -> &str {
        r#"
        (impl_item
            body: (declaration_list
                (function_item
                    name: (identifier) @name
                ) @definition.method
            )
        )

        (function_item
            name: (identifier) @name
        ) @definition.function

        (struct_item
            name: (type_identifier) @name
        ) @definition.struct

        (enum_item
            name: (type_identifier) @name
        ) @definition.enum

        (trait_item
            name: (type_identifier) @name
        ) @definition.trait

        (union_item
            name: (type_identifier) @name
        ) @definition.union

        (type_item
            name: (type_identifier) @name
        ) @definition.type

        (macro_definition
            name: (identifier) @name
        ) @definition.macro

        (const_item
            name: (identifier) @name
        ) @definition.const

        (static_item
            name: (identifier) @name
        ) @definition.static

        (mod_item
            name: (identifier) @name
        ) @definition.module
        "#
    }

    fn imports_query(&self) -> &str {
        r#"
        (use_declaration
            argument: (_) @import.specifier
        )

        (extern_crate_declaration
            name: (identifier) @import.specifier
        )
        "#
    }

    fn calls_query(&self) -> &str {
        r#"
        (call_expression
            function: (identifier) @call.name
        )

        (call_expression
            function: (field_expression
                field: (field_identifier) @call.name
            )
        )

        (call_expression
            function: (scoped_identifier
                name: (identifier) @call.name
            )
        )

        (macro_invocation
            macro: (identifier) @call.name
        )
        "#
    }

    fn heritage_query(&self) -> &str {
        r#"
        (impl_item
            trait: (type_identifier) @trait.name
            type: (type_identifier) @class.name
        )
        "#
    }

    fn is_exported(&self, node: &Node, _name: &str, _source: &str) -> bool {
        has_child_of_kind(node, "visibility_modifier")
            || has_ancestor_of_kind(node, "visibility_modifier")
    }

    fn cached_definitions_query(&self) -> Option<&'static Query> {
        RUST_DEFINITIONS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.definitions_query()))
            .ok()
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        RUST_IMPORTS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.imports_query()))
            .ok()
    }

    fn cached_calls_query(&self) -> Option<&'static Query> {
        RUST_CALLS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.calls_query()))
            .ok()
    }

    fn cached_heritage_query(&self) -> Option<&'static Query> {
        RUST_HERITAGE_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.heritage_query()))
            .ok()
    }
}
