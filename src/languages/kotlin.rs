use tree_sitter::Node;

use super::{child_text, LanguageGrammar};

pub struct KotlinGrammar;

impl LanguageGrammar for KotlinGrammar {
    fn name(&self) -> &'static str {
        "kotlin"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["kt", "kts"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_kotlin_ng::LANGUAGE.into()
    }

    fn definitions_query(&self) -> &str {
        r#"
        (function_declaration
            name: (identifier) @name
        ) @definition.function

        (class_declaration
            name: (identifier) @name
        ) @definition.class

        (object_declaration
            name: (identifier) @name
        ) @definition.class

        (type_alias
            type: (identifier) @name
        ) @definition.type
        "#
    }

    fn imports_query(&self) -> &str {
        r#"
        (import
            (identifier) @import.specifier
        )

        (import
            (qualified_identifier) @import.specifier
        )
        "#
    }

    fn calls_query(&self) -> &str {
        r#"
        (call_expression
            (identifier) @call.name
        )

        (call_expression
            (navigation_expression
                (identifier) @call.name
            )
        )
        "#
    }

    // Superclass calls carry a constructor invocation; bare types are
    // interface supertypes.
    fn heritage_query(&self) -> &str {
        r#"
        (class_declaration
            name: (identifier) @class.name
            (delegation_specifiers
                (delegation_specifier
                    (constructor_invocation
                        (type
                            (user_type
                                (identifier) @extends.name
                            )
                        )
                    )
                )
            )
        )

        (class_declaration
            name: (identifier) @class.name
            (delegation_specifiers
                (delegation_specifier
                    (type
                        (user_type
                            (identifier) @implements.name
                        )
                    )
                )
            )
        )
        "#
    }

    // Everything without an explicit private/internal modifier is visible.
    fn is_exported(&self, node: &Node, _name: &str, source: &str) -> bool {
        child_text(node, "modifiers", source)
            .map(|t| !t.contains("private") && !t.contains("internal"))
            .unwrap_or(true)
    }
}
