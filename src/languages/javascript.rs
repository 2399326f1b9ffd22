use tree_sitter::Node;

use super::{has_ancestor_of_kind, LanguageGrammar};

pub struct JavaScriptGrammar;

impl LanguageGrammar for JavaScriptGrammar {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["js", "jsx"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    fn definitions_query(&self) -> &str {
        r#"
        (function_declaration
            name: (identifier) @name
        ) @definition.function

        (method_definition
            name: (property_identifier) @name
        ) @definition.method

        (class_declaration
            name: (identifier) @name
        ) @definition.class

        (variable_declarator
            name: (identifier) @name
            value: (arrow_function)
        ) @definition.function

        (variable_declarator
            name: (identifier) @name
            value: (function_expression)
        ) @definition.function
        "#
    }

    fn imports_query(&self) -> &str {
        r#"
        (import_statement
            source: (string (string_fragment) @import.specifier)
        )

        (export_statement
            source: (string (string_fragment) @import.specifier)
        )
        "#
    }

    fn calls_query(&self) -> &str {
        r#"
        (call_expression
            function: (identifier) @call.name
        )

        (call_expression
            function: (member_expression
                property: (property_identifier) @call.name
            )
        )

        (new_expression
            constructor: (identifier) @call.name
        )
        "#
    }

    fn heritage_query(&self) -> &str {
        r#"
        (class_declaration
            name: (identifier) @class.name
            (class_heritage
                (identifier) @extends.name
            )
        )
        "#
    }

    fn is_exported(&self, node: &Node, _name: &str, source: &str) -> bool {
        if has_ancestor_of_kind(node, "export_statement") {
            return true;
        }
        node.utf8_text(source.as_bytes())
            .map(|t| t.starts_with("export "))
            .unwrap_or(false)
    }
}
