use serde::{Deserialize, Serialize};

/// Every label a graph node can carry. Code-symbol kinds cover the
/// multi-language surface; `CodeElement` is the catch-all for anything a
/// grammar emits that has no dedicated kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Folder,
    Function,
    Method,
    Class,
    Interface,
    CodeElement,
    Struct,
    Enum,
    Macro,
    Typedef,
    Union,
    Namespace,
    Trait,
    Impl,
    TypeAlias,
    Const,
    Static,
    Property,
    Record,
    Delegate,
    Annotation,
    Constructor,
    Template,
    Module,
    Community,
    Process,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "File",
            NodeKind::Folder => "Folder",
            NodeKind::Function => "Function",
            NodeKind::Method => "Method",
            NodeKind::Class => "Class",
            NodeKind::Interface => "Interface",
            NodeKind::CodeElement => "CodeElement",
            NodeKind::Struct => "Struct",
            NodeKind::Enum => "Enum",
            NodeKind::Macro => "Macro",
            NodeKind::Typedef => "Typedef",
            NodeKind::Union => "Union",
            NodeKind::Namespace => "Namespace",
            NodeKind::Trait => "Trait",
            NodeKind::Impl => "Impl",
            NodeKind::TypeAlias => "TypeAlias",
            NodeKind::Const => "Const",
            NodeKind::Static => "Static",
            NodeKind::Property => "Property",
            NodeKind::Record => "Record",
            NodeKind::Delegate => "Delegate",
            NodeKind::Annotation => "Annotation",
            NodeKind::Constructor => "Constructor",
            NodeKind::Template => "Template",
            NodeKind::Module => "Module",
            NodeKind::Community => "Community",
            NodeKind::Process => "Process",
        }
    }

    /// True for kinds that represent code symbols (not files, folders or
    /// derived nodes).
    pub fn is_symbol(&self) -> bool {
        !matches!(
            self,
            NodeKind::File | NodeKind::Folder | NodeKind::Community | NodeKind::Process
        )
    }

    /// Maps a `definition.<x>` capture suffix from a grammar query to a kind.
    pub fn from_capture_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "function" => Some(NodeKind::Function),
            "method" => Some(NodeKind::Method),
            "class" => Some(NodeKind::Class),
            "interface" => Some(NodeKind::Interface),
            "struct" => Some(NodeKind::Struct),
            "enum" => Some(NodeKind::Enum),
            "macro" => Some(NodeKind::Macro),
            "typedef" => Some(NodeKind::Typedef),
            "union" => Some(NodeKind::Union),
            "namespace" => Some(NodeKind::Namespace),
            "trait" => Some(NodeKind::Trait),
            "impl" => Some(NodeKind::Impl),
            "type" => Some(NodeKind::TypeAlias),
            "const" => Some(NodeKind::Const),
            "static" => Some(NodeKind::Static),
            "property" => Some(NodeKind::Property),
            "record" => Some(NodeKind::Record),
            "delegate" => Some(NodeKind::Delegate),
            "annotation" => Some(NodeKind::Annotation),
            "constructor" => Some(NodeKind::Constructor),
            "template" => Some(NodeKind::Template),
            "module" => Some(NodeKind::Module),
            "element" => Some(NodeKind::CodeElement),
            _ => None,
        }
    }
}

/// Whether an execution flow stays inside one community or crosses
/// community boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessType {
    IntraCommunity,
    CrossCommunity,
}

impl ProcessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessType::IntraCommunity => "intra_community",
            ProcessType::CrossCommunity => "cross_community",
        }
    }
}

/// Label-specific property bag. Each node label has a fixed schema; the
/// storage layer serialises each variant to its own tabular file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "label")]
pub enum NodeProperties {
    File {
        name: String,
        file_path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Folder {
        name: String,
        file_path: String,
    },
    Symbol {
        name: String,
        file_path: String,
        start_line: u32,
        end_line: u32,
        is_exported: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Community {
        name: String,
        heuristic_label: String,
        keywords: Vec<String>,
        description: String,
        enriched_by: String,
        cohesion: f64,
        symbol_count: usize,
        color: String,
    },
    Process {
        heuristic_label: String,
        process_type: ProcessType,
        step_count: usize,
        communities: Vec<String>,
        entry_point_id: String,
        terminal_id: String,
        trace: Vec<String>,
    },
}

impl NodeProperties {
    /// File path this node belongs to, when it has one. Derived nodes
    /// (communities, processes) have none.
    pub fn file_path(&self) -> Option<&str> {
        match self {
            NodeProperties::File { file_path, .. }
            | NodeProperties::Folder { file_path, .. }
            | NodeProperties::Symbol { file_path, .. } => Some(file_path),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NodeProperties::File { name, .. }
            | NodeProperties::Folder { name, .. }
            | NodeProperties::Symbol { name, .. }
            | NodeProperties::Community { name, .. } => name,
            NodeProperties::Process {
                heuristic_label, ..
            } => heuristic_label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub properties: NodeProperties,
}

impl GraphNode {
    pub fn file(file_path: &str, content: Option<String>) -> Self {
        let name = file_path.rsplit('/').next().unwrap_or(file_path).to_string();
        GraphNode {
            id: format!("File:{file_path}"),
            kind: NodeKind::File,
            properties: NodeProperties::File {
                name,
                file_path: file_path.to_string(),
                content,
            },
        }
    }

    pub fn folder(folder_path: &str) -> Self {
        let name = folder_path
            .rsplit('/')
            .next()
            .unwrap_or(folder_path)
            .to_string();
        GraphNode {
            id: format!("Folder:{folder_path}"),
            kind: NodeKind::Folder,
            properties: NodeProperties::Folder {
                name,
                file_path: folder_path.to_string(),
            },
        }
    }

    pub fn file_path(&self) -> Option<&str> {
        self.properties.file_path()
    }

    pub fn name(&self) -> &str {
        self.properties.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_node_id_and_name() {
        let node = GraphNode::file("src/auth/login.ts", None);
        assert_eq!(node.id, "File:src/auth/login.ts");
        assert_eq!(node.name(), "login.ts");
        assert_eq!(node.file_path(), Some("src/auth/login.ts"));
    }

    #[test]
    fn test_folder_node_id() {
        let node = GraphNode::folder("src/auth");
        assert_eq!(node.id, "Folder:src/auth");
        assert_eq!(node.name(), "auth");
    }

    #[test]
    fn test_kind_is_symbol() {
        assert!(NodeKind::Function.is_symbol());
        assert!(NodeKind::Trait.is_symbol());
        assert!(!NodeKind::File.is_symbol());
        assert!(!NodeKind::Community.is_symbol());
        assert!(!NodeKind::Process.is_symbol());
    }

    #[test]
    fn test_capture_suffix_mapping() {
        assert_eq!(
            NodeKind::from_capture_suffix("function"),
            Some(NodeKind::Function)
        );
        assert_eq!(NodeKind::from_capture_suffix("type"), Some(NodeKind::TypeAlias));
        assert_eq!(NodeKind::from_capture_suffix("unknown"), None);
    }

    #[test]
    fn test_process_type_str() {
        assert_eq!(ProcessType::IntraCommunity.as_str(), "intra_community");
        assert_eq!(ProcessType::CrossCommunity.as_str(), "cross_community");
    }
}
