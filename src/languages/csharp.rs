use once_cell::sync::OnceCell;
use tree_sitter::{Node, Query};

use super::LanguageGrammar;

pub struct CSharpGrammar;

// Static query caches for C#
static CSHARP_DEFINITIONS_QUERY: OnceCell<Query> = OnceCell::new();
static CSHARP_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();
static CSHARP_CALLS_QUERY: OnceCell<Query> = OnceCell::new();
static CSHARP_HERITAGE_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for CSharpGrammar {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["cs"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_c_sharp::LANGUAGE.into()
    }

    fn definitions_query(&self) -> &str {
        r#"
        (class_declaration
            name: (identifier) @name
        ) @definition.class

        (interface_declaration
            name: (identifier) @name
        ) @definition.interface

        (struct_declaration
            name: (identifier) @name
        ) @definition.struct

        (enum_declaration
            name: (identifier) @name
        ) @definition.enum

        (record_declaration
            name: (identifier) @name
        ) @definition.record

        (delegate_declaration
            name: (identifier) @name
        ) @definition.delegate

        (method_declaration
            name: (identifier) @name
        ) @definition.method

        (constructor_declaration
            name: (identifier) @name
        ) @definition.constructor

        (property_declaration
            name: (identifier) @name
        ) @definition.property
        "#
    }

    fn imports_query(&self) -> &str {
        r#"
        (using_directive
            (identifier) @import.specifier
        )

        (using_directive
            (qualified_name) @import.specifier
        )
        "#
    }

    fn calls_query(&self) -> &str {
        r#"
        (invocation_expression
            function: (identifier) @call.name
        )

        (invocation_expression
            function: (member_access_expression
                name: (identifier) @call.name
            )
        )

        (object_creation_expression
            type: (identifier) @call.name
        )
        "#
    }

    // The base_list mixes base classes and interfaces; the extractor
    // classifies @base.name captures by the I-prefix convention.
    fn heritage_query(&self) -> &str {
        r#"
        (class_declaration
            name: (identifier) @class.name
            (base_list
                (identifier) @base.name
            )
        )
        "#
    }

    fn is_exported(&self, node: &Node, _name: &str, source: &str) -> bool {
        let mut cursor = node.walk();
        let result = node.children(&mut cursor).any(|c| {
            c.kind() == "modifier"
                && c.utf8_text(source.as_bytes())
                    .map(|t| t == "public")
                    .unwrap_or(false)
        });
        result
    }

    fn cached_definitions_query(&self) -> Option<&'static Query> {
        CSHARP_DEFINITIONS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.definitions_query()))
            .ok()
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        CSHARP_IMPORTS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.imports_query()))
            .ok()
    }

    fn cached_calls_query(&self) -> Option<&'static Query> {
        CSHARP_CALLS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.calls_query()))
            .ok()
    }

    fn cached_heritage_query(&self) -> Option<&'static Query> {
        CSHARP_HERITAGE_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.heritage_query()))
            .ok()
    }
}
