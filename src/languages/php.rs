use tree_sitter::Node;

use super::{child_text, LanguageGrammar};

pub struct PhpGrammar;

impl LanguageGrammar for PhpGrammar {
    fn name(&self) -> &'static str {
        "php"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["php", "phtml", "php3", "php4", "php5", "php8"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_php::LANGUAGE_PHP.into()
    }

    fn definitions_query(&self) -> &str {
        r#"
        (function_definition
            name: (name) @name
        ) @definition.function

        (method_declaration
            name: (name) @name
        ) @definition.method

        (class_declaration
            name: (name) @name
        ) @definition.class

        (interface_declaration
            name: (name) @name
        ) @definition.interface

        (trait_declaration
            name: (name) @name
        ) @definition.trait

        (enum_declaration
            name: (name) @name
        ) @definition.enum

        (property_declaration
            (property_element
                (variable_name) @name
            )
        ) @definition.property
        "#
    }

    fn imports_query(&self) -> &str {
        r#"
        (namespace_use_declaration
            (namespace_use_clause
                (qualified_name) @import.specifier
            )
        )

        (namespace_use_declaration
            (namespace_use_clause
                (name) @import.specifier
            )
        )
        "#
    }

    fn calls_query(&self) -> &str {
        r#"
        (function_call_expression
            function: (name) @call.name
        )

        (member_call_expression
            name: (name) @call.name
        )

        (scoped_call_expression
            name: (name) @call.name
        )

        (object_creation_expression
            (name) @call.name
        )
        "#
    }

    fn heritage_query(&self) -> &str {
        r#"
        (class_declaration
            name: (name) @class.name
            (base_clause
                (name) @extends.name
            )
        )

        (class_declaration
            name: (name) @class.name
            (class_interface_clause
                (name) @implements.name
            )
        )
        "#
    }

    /// Top-level functions and type declarations are reachable; members are
    /// exported iff their visibility modifier says `public` (absent counts
    /// as non-public).
    fn is_exported(&self, node: &Node, _name: &str, source: &str) -> bool {
        match node.kind() {
            "function_definition"
            | "class_declaration"
            | "interface_declaration"
            | "trait_declaration"
            | "enum_declaration" => true,
            _ => child_text(node, "visibility_modifier", source)
                .map(|t| t == "public")
                .unwrap_or(false),
        }
    }
}
