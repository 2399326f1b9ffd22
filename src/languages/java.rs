use tree_sitter::Node;

use super::{child_text, LanguageGrammar};

pub struct JavaGrammar;

impl LanguageGrammar for JavaGrammar {
    fn name(&self) -> &'static str {
        "java"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["java"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn definitions_query(&self) -> &str {
        r#"
        (class_declaration
            name: (identifier) @name
        ) @definition.class

        (interface_declaration
            name: (identifier) @name
        ) @definition.interface

        (enum_declaration
            name: (identifier) @name
        ) @definition.enum

        (record_declaration
            name: (identifier) @name
        ) @definition.record

        (annotation_type_declaration
            name: (identifier) @name
        ) @definition.annotation

        (method_declaration
            name: (identifier) @name
        ) @definition.method

        (constructor_declaration
            name: (identifier) @name
        ) @definition.constructor
        "#
    }

    fn imports_query(&self) -> &str {
        r#"
        (import_declaration
            (scoped_identifier) @import.specifier
        )
        "#
    }

    fn calls_query(&self) -> &str {
        r#"
        (method_invocation
            name: (identifier) @call.name
        )

        (object_creation_expression
            type: (type_identifier) @call.name
        )
        "#
    }

    fn heritage_query(&self) -> &str {
        r#"
        (class_declaration
            name: (identifier) @class.name
            (superclass
                (type_identifier) @extends.name
            )
        )

        (class_declaration
            name: (identifier) @class.name
            (super_interfaces
                (type_list
                    (type_identifier) @implements.name
                )
            )
        )
        "#
    }

    fn is_exported(&self, node: &Node, _name: &str, source: &str) -> bool {
        child_text(node, "modifiers", source)
            .map(|t| t.contains("public"))
            .unwrap_or(false)
    }
}
