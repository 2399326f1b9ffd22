use once_cell::sync::OnceCell;
use tree_sitter::{Node, Query};

use super::LanguageGrammar;

pub struct PythonGrammar;

// Static query caches for Python
static PYTHON_DEFINITIONS_QUERY: OnceCell<Query> = OnceCell::new();
static PYTHON_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();
static PYTHON_CALLS_QUERY: OnceCell<Query> = OnceCell::new();
static PYTHON_HERITAGE_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for PythonGrammar {
    fn name(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["py"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn definitions_query(&self) -> &str {
        r#"
        (class_definition
            body: (block
                (function_definition
                    name: (identifier) @name
                ) @definition.method
            )
        )

        (function_definition
            name: (identifier) @name
        ) @definition.function

        (class_definition
            name: (identifier) @name
        ) @definition.class
        "#
    }

    fn imports_query(&self) -> &str {
        r#"
        (import_statement
            name: (dotted_name) @import.specifier
        )

        (import_statement
            name: (aliased_import
                name: (dotted_name) @import.specifier
            )
        )

        (import_from_statement
            module_name: (dotted_name) @import.specifier
        )

        (import_from_statement
            module_name: (relative_import) @import.specifier
        )
        "#
    }

    fn calls_query(&self) -> &str {
        r#"
        (call
            function: (identifier) @call.name
        )

        (call
            function: (attribute
                attribute: (identifier) @call.name
            )
        )
        "#
    }

    fn heritage_query(&self) -> &str {
        r#"
        (class_definition
            name: (identifier) @class.name
            superclasses: (argument_list
                (identifier) @extends.name
            )
        )
        "#
    }

    // Leading underscore is private by convention.
    fn is_exported(&self, _node: &Node, name: &str, _source: &str) -> bool {
        !name.starts_with('_')
    }

    fn cached_definitions_query(&self) -> Option<&'static Query> {
        PYTHON_DEFINITIONS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.definitions_query()))
            .ok()
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        PYTHON_IMPORTS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.imports_query()))
            .ok()
    }

    fn cached_calls_query(&self) -> Option<&'static Query> {
        PYTHON_CALLS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.calls_query()))
            .ok()
    }

    fn cached_heritage_query(&self) -> Option<&'static Query> {
        PYTHON_HERITAGE_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.heritage_query()))
            .ok()
    }
}
