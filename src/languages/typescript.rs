use tree_sitter::Node;

use super::{has_ancestor_of_kind, LanguageGrammar};

const DEFINITIONS: &str = r#"
(function_declaration
    name: (identifier) @name
) @definition.function

(method_definition
    name: (property_identifier) @name
) @definition.method

(class_declaration
    name: (type_identifier) @name
) @definition.class

(abstract_class_declaration
    name: (type_identifier) @name
) @definition.class

(interface_declaration
    name: (type_identifier) @name
) @definition.interface

(type_alias_declaration
    name: (type_identifier) @name
) @definition.type

(enum_declaration
    name: (identifier) @name
) @definition.enum

(variable_declarator
    name: (identifier) @name
    value: (arrow_function)
) @definition.function
"#;

const IMPORTS: &str = r#"
(import_statement
    source: (string (string_fragment) @import.specifier)
)

(export_statement
    source: (string (string_fragment) @import.specifier)
)
"#;

const CALLS: &str = r#"
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
"#;

const HERITAGE: &str = r#"
(class_declaration
    name: (type_identifier) @class.name
    (class_heritage
        (extends_clause
            (identifier) @extends.name
        )
    )
)

(class_declaration
    name: (type_identifier) @class.name
    (class_heritage
        (implements_clause
            (type_identifier) @implements.name
        )
    )
)
"#;

/// Exported when wrapped in an `export_statement` or when the declaration
/// text itself begins with `export `.
fn ts_is_exported(node: &Node, source: &str) -> bool {
    if has_ancestor_of_kind(node, "export_statement") {
        return true;
    }
    node.utf8_text(source.as_bytes())
        .map(|t| t.starts_with("export "))
        .unwrap_or(false)
}

pub struct TypeScriptGrammar;

impl LanguageGrammar for TypeScriptGrammar {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["ts"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn definitions_query(&self) -> &str {
        DEFINITIONS
    }

    fn imports_query(&self) -> &str {
        IMPORTS
    }

    fn calls_query(&self) -> &str {
        CALLS
    }

    fn heritage_query(&self) -> &str {
        HERITAGE
    }

    fn is_exported(&self, node: &Node, _name: &str, source: &str) -> bool {
        ts_is_exported(node, source)
    }
}

/// The `.tsx` flavour shares the TypeScript queries but parses with the TSX
/// grammar so JSX expressions are understood.
pub struct TsxGrammar;

impl LanguageGrammar for TsxGrammar {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["tsx"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    }

    fn definitions_query(&self) -> &str {
        DEFINITIONS
    }

    fn imports_query(&self) -> &str {
        IMPORTS
    }

    fn calls_query(&self) -> &str {
        CALLS
    }

    fn heritage_query(&self) -> &str {
        HERITAGE
    }

    fn is_exported(&self, node: &Node, _name: &str, source: &str) -> bool {
        ts_is_exported(node, source)
    }
}
