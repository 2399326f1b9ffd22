use tree_sitter::Node;

use super::{modifiers_contain, LanguageGrammar};

pub struct SwiftGrammar;

impl LanguageGrammar for SwiftGrammar {
    fn name(&self) -> &'static str {
        "swift"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["swift"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_swift::LANGUAGE.into()
    }

    fn definitions_query(&self) -> &str {
        r#"
        (function_declaration
            name: (simple_identifier) @name
        ) @definition.function

        (class_declaration
            name: (type_identifier) @name
        ) @definition.class

        (class_declaration
            name: (user_type
                (type_identifier) @name
            )
        ) @definition.class

        (protocol_declaration
            name: (type_identifier) @name
        ) @definition.interface

        (typealias_declaration
            name: (type_identifier) @name
        ) @definition.type
        "#
    }

    fn imports_query(&self) -> &str {
        r#"
        (import_declaration
            (identifier) @import.specifier
        )
        "#
    }

    fn calls_query(&self) -> &str {
        r#"
        (call_expression
            (simple_identifier) @call.name
        )

        (call_expression
            (navigation_expression
                (simple_identifier) @call.name
            )
        )
        "#
    }

    fn is_exported(&self, node: &Node, _name: &str, source: &str) -> bool {
        modifiers_contain(node, source, &["public", "open"])
    }
}
