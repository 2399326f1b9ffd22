use once_cell::sync::OnceCell;
use tree_sitter::{Node, Query};

use super::LanguageGrammar;

pub struct CppGrammar;

// Static query caches for C++
static CPP_DEFINITIONS_QUERY: OnceCell<Query> = OnceCell::new();
static CPP_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();
static CPP_CALLS_QUERY: OnceCell<Query> = OnceCell::new();
static CPP_HERITAGE_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for CppGrammar {
    fn name(&self) -> &'static str {
        "cpp"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["cpp", "cc", "cxx", "hpp", "hxx", "hh"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_cpp::LANGUAGE.into()
    }

    fn definitions_query(&self) -> &str {
        r#"
        (function_definition
            declarator: (function_declarator
                declarator: (identifier) @name
            )
        ) @definition.function

        (function_definition
            declarator: (function_declarator
                declarator: (qualified_identifier
                    name: (identifier) @name
                )
            )
        ) @definition.method

        (function_definition
            declarator: (function_declarator
                declarator: (field_identifier) @name
            )
        ) @definition.method

        (class_specifier
            name: (type_identifier) @name
            body: (field_declaration_list)
        ) @definition.class

        (struct_specifier
            name: (type_identifier) @name
            body: (field_declaration_list)
        ) @definition.struct

        (enum_specifier
            name: (type_identifier) @name
        ) @definition.enum

        (union_specifier
            name: (type_identifier) @name
            body: (field_declaration_list)
        ) @definition.union

        (namespace_definition
            name: (namespace_identifier) @name
        ) @definition.namespace

        (type_definition
            declarator: (type_identifier) @name
        ) @definition.typedef

        (template_declaration
            (class_specifier
                name: (type_identifier) @name
            )
        ) @definition.template
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

        (call_expression
            function: (field_expression
                field: (field_identifier) @call.name
            )
        )

        (call_expression
            function: (qualified_identifier
                name: (identifier) @call.name
            )
        )
        "#
    }

    fn heritage_query(&self) -> &str {
        r#"
        (class_specifier
            name: (type_identifier) @class.name
            (base_class_clause
                (type_identifier) @extends.name
            )
        )

        (struct_specifier
            name: (type_identifier) @class.name
            (base_class_clause
                (type_identifier) @extends.name
            )
        )
        "#
    }

    // Module-local visibility only.
    fn is_exported(&self, _node: &Node, _name: &str, _source: &str) -> bool {
        false
    }

    fn cached_definitions_query(&self) -> Option<&'static Query> {
        CPP_DEFINITIONS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.definitions_query()))
            .ok()
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        CPP_IMPORTS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.imports_query()))
            .ok()
    }

    fn cached_calls_query(&self) -> Option<&'static Query> {
        CPP_CALLS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.calls_query()))
            .ok()
    }

    fn cached_heritage_query(&self) -> Option<&'static Query> {
        CPP_HERITAGE_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.heritage_query()))
            .ok()
    }
}
