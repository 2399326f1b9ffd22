//! Persistence of a finalised knowledge graph.
//!
//! One directory per repository holds the storage-engine subdirectory
//! (per-label bulk files plus the sqlite catalog) and a metadata file. The
//! pipeline itself writes nothing; callers hand the finished report here.

pub mod csv;
pub mod sqlite;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};
use crate::graph::{GraphNode, KnowledgeGraph, NodeProperties};
use crate::pipeline::AnalysisReport;

pub use csv::CsvBulkWriter;
pub use sqlite::SqliteCatalog;

/// One typed cell of a persisted row. Absent numerics are written as -1,
/// absent booleans as false and absent strings as empty.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row(pub Vec<Field>);

/// Narrow writer interface the pipeline's persistence is delegated to.
pub trait StorageWriter {
    fn write_nodes(&mut self, label: &str, header: &[&str], rows: &[Row]) -> Result<()>;
    fn write_relationships(&mut self, header: &[&str], rows: &[Row]) -> Result<()>;
    fn create_index(&mut self, kind: &str, params: &str) -> Result<()>;
}

pub const FILE_HEADER: &[&str] = &["id", "label", "name", "filePath", "content"];
pub const FOLDER_HEADER: &[&str] = &["id", "label", "name", "filePath"];
pub const SYMBOL_HEADER: &[&str] = &[
    "id",
    "label",
    "name",
    "filePath",
    "startLine",
    "endLine",
    "isExported",
    "content",
    "description",
];
pub const COMMUNITY_HEADER: &[&str] = &[
    "id",
    "label",
    "name",
    "heuristicLabel",
    "keywords",
    "description",
    "enrichedBy",
    "cohesion",
    "symbolCount",
    "color",
];
pub const PROCESS_HEADER: &[&str] = &[
    "id",
    "label",
    "heuristicLabel",
    "processType",
    "stepCount",
    "communities",
    "entryPointId",
    "terminalId",
    "trace",
];
pub const RELATIONSHIP_HEADER: &[&str] = &[
    "id",
    "type",
    "sourceId",
    "targetId",
    "confidence",
    "reason",
    "step",
];

pub fn header_for(node: &GraphNode) -> &'static [&'static str] {
    match &node.properties {
        NodeProperties::File { .. } => FILE_HEADER,
        NodeProperties::Folder { .. } => FOLDER_HEADER,
        NodeProperties::Symbol { .. } => SYMBOL_HEADER,
        NodeProperties::Community { .. } => COMMUNITY_HEADER,
        NodeProperties::Process { .. } => PROCESS_HEADER,
    }
}

pub fn node_to_row(node: &GraphNode) -> Row {
    let label = node.kind.as_str().to_string();
    match &node.properties {
        NodeProperties::File {
            name,
            file_path,
            content,
        } => Row(vec![
            Field::Str(node.id.clone()),
            Field::Str(label),
            Field::Str(name.clone()),
            Field::Str(file_path.clone()),
            Field::Str(content.clone().unwrap_or_default()),
        ]),
        NodeProperties::Folder { name, file_path } => Row(vec![
            Field::Str(node.id.clone()),
            Field::Str(label),
            Field::Str(name.clone()),
            Field::Str(file_path.clone()),
        ]),
        NodeProperties::Symbol {
            name,
            file_path,
            start_line,
            end_line,
            is_exported,
            content,
            description,
        } => Row(vec![
            Field::Str(node.id.clone()),
            Field::Str(label),
            Field::Str(name.clone()),
            Field::Str(file_path.clone()),
            Field::Int(*start_line as i64),
            Field::Int(*end_line as i64),
            Field::Bool(*is_exported),
            Field::Str(content.clone().unwrap_or_default()),
            Field::Str(description.clone().unwrap_or_default()),
        ]),
        NodeProperties::Community {
            name,
            heuristic_label,
            keywords,
            description,
            enriched_by,
            cohesion,
            symbol_count,
            color,
        } => Row(vec![
            Field::Str(node.id.clone()),
            Field::Str(label),
            Field::Str(name.clone()),
            Field::Str(heuristic_label.clone()),
            Field::List(keywords.clone()),
            Field::Str(description.clone()),
            Field::Str(enriched_by.clone()),
            Field::Float(*cohesion),
            Field::Int(*symbol_count as i64),
            Field::Str(color.clone()),
        ]),
        NodeProperties::Process {
            heuristic_label,
            process_type,
            step_count,
            communities,
            entry_point_id,
            terminal_id,
            trace,
        } => Row(vec![
            Field::Str(node.id.clone()),
            Field::Str(label),
            Field::Str(heuristic_label.clone()),
            Field::Str(process_type.as_str().to_string()),
            Field::Int(*step_count as i64),
            Field::List(communities.clone()),
            Field::Str(entry_point_id.clone()),
            Field::Str(terminal_id.clone()),
            Field::List(trace.clone()),
        ]),
    }
}

/// Groups the graph's nodes into per-label row sets, in node insertion
/// order within each label.
pub fn node_rows_by_label(
    graph: &KnowledgeGraph,
) -> Vec<(String, &'static [&'static str], Vec<Row>)> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: std::collections::HashMap<String, (&'static [&'static str], Vec<Row>)> =
        std::collections::HashMap::new();

    for node in graph.iter_nodes() {
        let label = node.kind.as_str().to_string();
        let entry = grouped
            .entry(label.clone())
            .or_insert_with(|| {
                order.push(label.clone());
                (header_for(node), Vec::new())
            });
        entry.1.push(node_to_row(node));
    }

    order
        .into_iter()
        .filter_map(|label| {
            let (header, rows) = grouped.remove(&label)?;
            Some((label, header, rows))
        })
        .collect()
}

pub fn relationship_rows(graph: &KnowledgeGraph) -> Vec<Row> {
    graph
        .iter_relationships()
        .map(|edge| {
            Row(vec![
                Field::Str(edge.id.clone()),
                Field::Str(edge.rel.as_str().to_string()),
                Field::Str(edge.source_id.clone()),
                Field::Str(edge.target_id.clone()),
                Field::Float(edge.confidence),
                Field::Str(edge.reason.clone().unwrap_or_default()),
                match edge.step {
                    Some(step) => Field::Int(step as i64),
                    None => Field::Int(-1),
                },
            ])
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub last_commit_sha: String,
    pub node_count: usize,
    pub relationship_count: usize,
    pub file_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Reads the current commit SHA from `.git`, following one level of ref
/// indirection and falling back to packed refs.
pub fn read_head_sha(repo_root: &Path) -> Result<String> {
    let git_dir = repo_root.join(".git");
    if !git_dir.is_dir() {
        return Err(AtlasError::NotARepository);
    }

    let head = fs::read_to_string(git_dir.join("HEAD"))?;
    let head = head.trim();

    let Some(reference) = head.strip_prefix("ref: ") else {
        // detached HEAD holds the sha directly
        return Ok(head.to_string());
    };

    let ref_file = git_dir.join(reference);
    if ref_file.is_file() {
        return Ok(fs::read_to_string(ref_file)?.trim().to_string());
    }

    let packed = fs::read_to_string(git_dir.join("packed-refs")).unwrap_or_default();
    for line in packed.lines() {
        if line.starts_with('#') {
            continue;
        }
        if let Some((sha, name)) = line.split_once(' ') {
            if name.trim() == reference {
                return Ok(sha.to_string());
            }
        }
    }

    Err(AtlasError::NotARepository)
}

/// Per-repository store directory: bulk files under `graph/`, the sqlite
/// catalog and `metadata.json` beside it.
pub struct RepoStore {
    root: PathBuf,
}

impl RepoStore {
    pub const DIR_NAME: &'static str = ".codeatlas";
    const METADATA_FILE: &'static str = "metadata.json";
    const CATALOG_FILE: &'static str = "catalog.db";
    const GRAPH_DIR: &'static str = "graph";

    pub fn at(repo_root: &Path) -> Self {
        Self {
            root: repo_root.join(Self::DIR_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes the graph through both storage writers and records metadata.
    pub fn persist(&self, report: &AnalysisReport, last_commit_sha: &str) -> Result<RepoMetadata> {
        fs::create_dir_all(&self.root)?;

        let rel_rows = relationship_rows(&report.graph);
        let label_rows = node_rows_by_label(&report.graph);

        let mut bulk = CsvBulkWriter::new(&self.root.join(Self::GRAPH_DIR))?;
        for (label, header, rows) in &label_rows {
            bulk.write_nodes(label, header, rows)?;
        }
        bulk.write_relationships(RELATIONSHIP_HEADER, &rel_rows)?;

        let mut catalog = SqliteCatalog::create(&self.root.join(Self::CATALOG_FILE))?;
        for (label, header, rows) in &label_rows {
            catalog.write_nodes(label, header, rows)?;
        }
        catalog.write_relationships(RELATIONSHIP_HEADER, &rel_rows)?;
        catalog.create_index("nodes", "label")?;
        catalog.create_index("nodes", "file_path")?;
        catalog.create_index("relationships", "source_id")?;
        catalog.create_index("relationships", "target_id")?;

        let metadata = RepoMetadata {
            last_commit_sha: last_commit_sha.to_string(),
            node_count: report.graph.node_count(),
            relationship_count: report.graph.relationship_count(),
            file_count: report.total_file_count,
            created_at: Utc::now(),
        };
        fs::write(
            self.root.join(Self::METADATA_FILE),
            serde_json::to_string_pretty(&metadata)
                .map_err(|e| AtlasError::StorageUnavailable(e.to_string()))?,
        )?;

        Ok(metadata)
    }

    pub fn read_metadata(&self) -> Result<RepoMetadata> {
        let path = self.root.join(Self::METADATA_FILE);
        if !path.is_file() {
            return Err(AtlasError::NoIndex);
        }
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| AtlasError::StorageUnavailable(e.to_string()))
    }

    /// Opens the catalog read-only for query-time consumers.
    pub fn open_catalog(&self) -> Result<SqliteCatalog> {
        SqliteCatalog::open_read_only(&self.root.join(Self::CATALOG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphEdge, NodeKind, RelationType};
    use tempfile::TempDir;

    fn sample_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(GraphNode::file("src/a.ts", None));
        graph.add_node(GraphNode {
            id: "Function:src/a.ts:f".to_string(),
            kind: NodeKind::Function,
            properties: NodeProperties::Symbol {
                name: "f".to_string(),
                file_path: "src/a.ts".to_string(),
                start_line: 1,
                end_line: 3,
                is_exported: true,
                content: Some("function f() {}".to_string()),
                description: None,
            },
        });
        graph.add_relationship(
            GraphEdge::new("File:src/a.ts", RelationType::Defines, "Function:src/a.ts:f"),
        );
        graph
    }

    #[test]
    fn test_node_rows_grouped_by_label() {
        let graph = sample_graph();
        let grouped = node_rows_by_label(&graph);
        let labels: Vec<&str> = grouped.iter().map(|(l, _, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["File", "Function"]);
    }

    #[test]
    fn test_symbol_row_field_order() {
        let graph = sample_graph();
        let grouped = node_rows_by_label(&graph);
        let (_, header, rows) = grouped.iter().find(|(l, _, _)| l == "Function").unwrap();
        assert_eq!(*header, SYMBOL_HEADER);
        assert_eq!(rows[0].0[0], Field::Str("Function:src/a.ts:f".to_string()));
        assert_eq!(rows[0].0[4], Field::Int(1));
        assert_eq!(rows[0].0[6], Field::Bool(true));
        // absent description defaults to the empty string
        assert_eq!(rows[0].0[8], Field::Str(String::new()));
    }

    #[test]
    fn test_relationship_row_defaults() {
        let graph = sample_graph();
        let rows = relationship_rows(&graph);
        assert_eq!(rows.len(), 1);
        // absent reason -> empty string, absent step -> -1
        assert_eq!(rows[0].0[5], Field::Str(String::new()));
        assert_eq!(rows[0].0[6], Field::Int(-1));
    }

    #[test]
    fn test_read_head_sha_direct_ref() {
        let dir = TempDir::new().unwrap();
        let git = dir.path().join(".git");
        fs::create_dir_all(git.join("refs/heads")).unwrap();
        fs::write(git.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(git.join("refs/heads/main"), "abc123def\n").unwrap();

        assert_eq!(read_head_sha(dir.path()).unwrap(), "abc123def");
    }

    #[test]
    fn test_read_head_sha_detached() {
        let dir = TempDir::new().unwrap();
        let git = dir.path().join(".git");
        fs::create_dir_all(&git).unwrap();
        fs::write(git.join("HEAD"), "deadbeef\n").unwrap();

        assert_eq!(read_head_sha(dir.path()).unwrap(), "deadbeef");
    }

    #[test]
    fn test_read_head_sha_packed_refs() {
        let dir = TempDir::new().unwrap();
        let git = dir.path().join(".git");
        fs::create_dir_all(&git).unwrap();
        fs::write(git.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(
            git.join("packed-refs"),
            "# pack-refs with: peeled\ncafe42 refs/heads/main\n",
        )
        .unwrap();

        assert_eq!(read_head_sha(dir.path()).unwrap(), "cafe42");
    }

    #[test]
    fn test_read_head_sha_not_a_repository() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_head_sha(dir.path()),
            Err(AtlasError::NotARepository)
        ));
    }

    #[test]
    fn test_metadata_missing_is_no_index() {
        let dir = TempDir::new().unwrap();
        let store = RepoStore::at(dir.path());
        assert!(matches!(store.read_metadata(), Err(AtlasError::NoIndex)));
    }
}
