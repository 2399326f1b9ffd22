//! Materialises the file/folder hierarchy.

use crate::graph::{GraphEdge, GraphNode, KnowledgeGraph, RelationType};

/// Creates Folder nodes for every directory prefix, File nodes for every
/// indexed file, and CONTAINS edges from each parent to its immediate
/// child. Shared ancestors are de-duplicated by the graph's idempotent add.
pub fn build_structure(graph: &mut KnowledgeGraph, file_paths: &[String]) -> usize {
    let mut edges = 0;

    for path in file_paths {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            continue;
        }

        let mut parent_id: Option<String> = None;
        for depth in 0..segments.len().saturating_sub(1) {
            let folder_path = segments[..=depth].join("/");
            let folder = GraphNode::folder(&folder_path);
            let folder_id = folder.id.clone();
            graph.add_node(folder);
            if let Some(parent) = &parent_id {
                if graph.add_relationship(GraphEdge::new(
                    parent,
                    RelationType::Contains,
                    &folder_id,
                )) {
                    edges += 1;
                }
            }
            parent_id = Some(folder_id);
        }

        let file = GraphNode::file(path, None);
        let file_id = file.id.clone();
        graph.add_node(file);
        if let Some(parent) = &parent_id {
            if graph.add_relationship(GraphEdge::new(parent, RelationType::Contains, &file_id)) {
                edges += 1;
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    #[test]
    fn test_folders_and_files_materialised() {
        let mut graph = KnowledgeGraph::new();
        let files = vec![
            "src/auth/login.ts".to_string(),
            "src/auth/logout.ts".to_string(),
            "src/db.ts".to_string(),
        ];
        build_structure(&mut graph, &files);

        assert!(graph.has_node("Folder:src"));
        assert!(graph.has_node("Folder:src/auth"));
        assert!(graph.has_node("File:src/auth/login.ts"));
        assert!(graph.has_node("File:src/db.ts"));

        // shared ancestors deduplicated
        let folders = graph
            .iter_nodes()
            .filter(|n| n.kind == NodeKind::Folder)
            .count();
        assert_eq!(folders, 2);
    }

    #[test]
    fn test_contains_edges_form_chain() {
        let mut graph = KnowledgeGraph::new();
        build_structure(&mut graph, &["a/b/c.rs".to_string()]);

        let edges = graph.relationships();
        assert!(edges
            .iter()
            .any(|e| e.source_id == "Folder:a" && e.target_id == "Folder:a/b"));
        assert!(edges
            .iter()
            .any(|e| e.source_id == "Folder:a/b" && e.target_id == "File:a/b/c.rs"));
        assert!(edges.iter().all(|e| e.rel == RelationType::Contains));
        assert!(edges.iter().all(|e| e.confidence == 1.0));
    }

    #[test]
    fn test_top_level_file_has_no_parent() {
        let mut graph = KnowledgeGraph::new();
        build_structure(&mut graph, &["main.rs".to_string()]);

        assert!(graph.has_node("File:main.rs"));
        assert_eq!(graph.relationship_count(), 0);
    }

    #[test]
    fn test_contains_is_forest() {
        // every node has at most one CONTAINS parent
        let mut graph = KnowledgeGraph::new();
        build_structure(
            &mut graph,
            &[
                "a/b/x.ts".to_string(),
                "a/b/y.ts".to_string(),
                "a/z.ts".to_string(),
            ],
        );

        let mut parent_count: std::collections::HashMap<&str, usize> =
            std::collections::HashMap::new();
        for edge in graph.iter_relationships() {
            *parent_count.entry(edge.target_id.as_str()).or_default() += 1;
        }
        assert!(parent_count.values().all(|&c| c == 1));
    }
}
