//! Turns heritage records into EXTENDS / IMPLEMENTS edges.

use crate::error::Result;
use crate::graph::{
    GraphEdge, GraphNode, KnowledgeGraph, NodeKind, NodeProperties, RelationType,
};
use crate::indexer::{HeritageKind, RawHeritage, SymbolTable};

pub fn resolve_heritage(
    graph: &mut KnowledgeGraph,
    records: &[RawHeritage],
    table: &SymbolTable,
) -> Result<usize> {
    let mut added = 0;

    for record in records {
        let child_id = resolve_or_synthesize(graph, table, &record.file_path, &record.class_name);
        let parent_id = resolve_or_synthesize(graph, table, &record.file_path, &record.parent_name);

        // self-inheritance is meaningless and usually a resolution artefact
        if child_id == parent_id {
            continue;
        }

        let (rel, reason) = match record.kind {
            HeritageKind::Extends => (RelationType::Extends, None),
            HeritageKind::Implements => (RelationType::Implements, None),
            HeritageKind::TraitImpl => (RelationType::Implements, Some("trait-impl")),
        };

        let mut edge = GraphEdge::new(&child_id, rel, &parent_id);
        if let Some(reason) = reason {
            edge = edge.with_reason(reason);
        }
        if graph.add_relationship(edge) {
            added += 1;
        }
    }

    Ok(added)
}

/// Fuzzy-resolves a name, picking the first hit; unresolved names get a
/// deterministic placeholder node so edge endpoints always exist.
fn resolve_or_synthesize(
    graph: &mut KnowledgeGraph,
    table: &SymbolTable,
    file_path: &str,
    name: &str,
) -> String {
    if let Some(hit) = table.lookup_fuzzy(name).first() {
        return hit.node_id.clone();
    }

    let id = format!("CodeElement:{file_path}:{name}");
    if !graph.has_node(&id) {
        graph.add_node(GraphNode {
            id: id.clone(),
            kind: NodeKind::CodeElement,
            properties: NodeProperties::Symbol {
                name: name.to_string(),
                file_path: file_path.to_string(),
                start_line: 0,
                end_line: 0,
                is_exported: false,
                content: None,
                description: None,
            },
        });
    }
    id
}
