//! In-memory typed knowledge graph.
//!
//! Nodes and relationships keep insertion order so iteration is stable
//! across runs given identical inputs. Adds are idempotent (first write
//! wins); a secondary file-path index supports removing everything a file
//! contributed during re-extraction.

pub mod edge;
pub mod node;

use std::collections::HashMap;

use indexmap::IndexMap;

pub use edge::{GraphEdge, RelationType};
pub use node::{GraphNode, NodeKind, NodeProperties, ProcessType};

#[derive(Debug, Default)]
pub struct KnowledgeGraph {
    nodes: IndexMap<String, GraphNode>,
    relationships: IndexMap<String, GraphEdge>,
    by_file: HashMap<String, Vec<String>>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node. Duplicate ids are a no-op; the first write wins.
    /// Returns true when the node was inserted.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        if let Some(path) = node.file_path() {
            self.by_file
                .entry(path.to_string())
                .or_default()
                .push(node.id.clone());
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Adds a relationship. Duplicate (source, type, target) triples are a
    /// no-op. Returns true when the edge was inserted.
    pub fn add_relationship(&mut self, edge: GraphEdge) -> bool {
        if self.relationships.contains_key(&edge.id) {
            return false;
        }
        self.relationships.insert(edge.id.clone(), edge);
        true
    }

    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Removes a single node and every incident edge. Returns the removed
    /// node, if any.
    pub fn remove_node(&mut self, id: &str) -> Option<GraphNode> {
        let node = self.nodes.shift_remove(id)?;
        if let Some(path) = node.file_path() {
            if let Some(ids) = self.by_file.get_mut(path) {
                ids.retain(|n| n != id);
                if ids.is_empty() {
                    self.by_file.remove(path);
                }
            }
        }
        self.relationships
            .retain(|_, e| e.source_id != id && e.target_id != id);
        Some(node)
    }

    /// Removes every node whose `file_path` equals `path` together with all
    /// incident edges. Returns the number of nodes removed.
    pub fn remove_nodes_by_file(&mut self, path: &str) -> usize {
        let Some(ids) = self.by_file.remove(path) else {
            return 0;
        };
        let removed = ids.len();
        for id in &ids {
            self.nodes.shift_remove(id);
        }
        let gone: std::collections::HashSet<&String> = ids.iter().collect();
        self.relationships
            .retain(|_, e| !gone.contains(&e.source_id) && !gone.contains(&e.target_id));
        removed
    }

    /// Snapshot of all nodes in insertion order (a new Vec on each call).
    pub fn nodes(&self) -> Vec<GraphNode> {
        self.nodes.values().cloned().collect()
    }

    /// Snapshot of all relationships in insertion order.
    pub fn relationships(&self) -> Vec<GraphEdge> {
        self.relationships.values().cloned().collect()
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn iter_relationships(&self) -> impl Iterator<Item = &GraphEdge> {
        self.relationships.values()
    }

    pub fn for_each_node<F: FnMut(&GraphNode)>(&self, mut f: F) {
        for node in self.nodes.values() {
            f(node);
        }
    }

    pub fn for_each_relationship<F: FnMut(&GraphEdge)>(&self, mut f: F) {
        for edge in self.relationships.values() {
            f(edge);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Node ids recorded for a file, in insertion order.
    pub fn nodes_in_file(&self, path: &str) -> &[String] {
        self.by_file.get(path).map(Vec::as_slice).unwrap_or(&[])
    }
}
