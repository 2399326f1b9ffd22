use tree_sitter::Node;

use super::LanguageGrammar;

pub struct CGrammar;

impl LanguageGrammar for CGrammar {
    fn name(&self) -> &'static str {
        "c"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["c", "h"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_c::LANGUAGE.into()
    }

    fn definitions_query(&self) -> &str {
        r#"
        (function_definition
            declarator: (function_declarator
                declarator: (identifier) @name
            )
        ) @definition.function

        (struct_specifier
            name: (type_identifier) @name
            body: (field_declaration_list)
        ) @definition.struct

        (enum_specifier
            name: (type_identifier) @name
            body: (enumerator_list)
        ) @definition.enum

        (union_specifier
            name: (type_identifier) @name
            body: (field_declaration_list)
        ) @definition.union

        (type_definition
            declarator: (type_identifier) @name
        ) @definition.typedef
        "#
    }

    fn imports_query(&self) -> &str {
        r#"
        (preproc_include
            path: (string_literal) @import.specifier
        )

        (preproc_include
            path: (system_lib_string) @import.specifier
        )
        "#
    }

    fn calls_query(&self) -> &str {
        r#"
        (call_expression
            function: (identifier) @call.name
        )
        "#
    }

    // Module-local visibility only.
    fn is_exported(&self, _node: &Node, _name: &str, _source: &str) -> bool {
        false
    }
}
