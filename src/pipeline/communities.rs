//! Community detection over the CALLS/IMPORTS subgraph.
//!
//! Symbols start in weakly-connected components (union-find over call
//! edges, with import edges tying the involved files' symbols together),
//! then a bounded best-neighbour refinement nudges nodes toward the
//! community holding most of their call edges. The result is a disjoint
//! partition; every symbol belongs to exactly one community.

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;

use crate::error::Result;
use crate::graph::{
    GraphEdge, GraphNode, KnowledgeGraph, NodeKind, NodeProperties, RelationType,
};
use crate::indexer::progress::{ProgressPhase, ProgressReporter};

/// Fixed 12-colour palette; community `i` gets `PALETTE[i % 12]`.
pub const COMMUNITY_COLORS: [&str; 12] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab", "#d37295", "#86bcb6",
];

const MAX_REFINEMENT_SWEEPS: usize = 10;
const MAX_KEYWORDS: usize = 8;
/// Below this many symbols the connected components are kept as-is.
const REFINEMENT_MIN_SYMBOLS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct CommunityStats {
    pub community_count: usize,
    pub largest_community: usize,
    pub mean_cohesion: f64,
}

#[derive(Debug, Default)]
pub struct CommunityOutput {
    pub communities: Vec<GraphNode>,
    /// (symbol id, community id), one entry per symbol.
    pub memberships: Vec<(String, String)>,
    pub stats: CommunityStats,
}

pub fn detect_communities(
    graph: &KnowledgeGraph,
    entry_scores: &HashMap<String, f64>,
    reporter: &ProgressReporter,
) -> Result<CommunityOutput> {
    reporter.report(ProgressPhase::Communities, 0.0, Some("partitioning"))?;

    // symbol ids in insertion order
    let symbols: Vec<&GraphNode> = graph
        .iter_nodes()
        .filter(|n| n.kind.is_symbol())
        .collect();
    if symbols.is_empty() {
        reporter.report(ProgressPhase::Communities, 100.0, Some("0 communities"))?;
        return Ok(CommunityOutput::default());
    }

    let index_of: HashMap<&str, usize> = symbols
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    // call adjacency (undirected view) used for components and refinement
    let mut call_edges: Vec<(usize, usize)> = Vec::new();
    for edge in graph.iter_relationships() {
        if edge.rel != RelationType::Calls {
            continue;
        }
        if let (Some(&a), Some(&b)) = (
            index_of.get(edge.source_id.as_str()),
            index_of.get(edge.target_id.as_str()),
        ) {
            call_edges.push((a, b));
        }
    }

    // first symbol per file, for lifting file-level imports onto symbols
    let mut first_symbol_in_file: HashMap<&str, usize> = HashMap::new();
    for (i, node) in symbols.iter().enumerate() {
        if let Some(path) = node.file_path() {
            first_symbol_in_file.entry(path).or_insert(i);
        }
    }

    let mut uf: UnionFind<usize> = UnionFind::new(symbols.len());
    for &(a, b) in &call_edges {
        uf.union(a, b);
    }
    for edge in graph.iter_relationships() {
        if edge.rel != RelationType::Imports {
            continue;
        }
        let from = edge.source_id.strip_prefix("File:");
        let to = edge.target_id.strip_prefix("File:");
        if let (Some(from), Some(to)) = (from, to) {
            if let (Some(&a), Some(&b)) = (
                first_symbol_in_file.get(from),
                first_symbol_in_file.get(to),
            ) {
                uf.union(a, b);
            }
        }
    }

    // assignment[i] = community index, communities numbered by first occurrence
    let mut root_to_community: HashMap<usize, usize> = HashMap::new();
    let mut assignment: Vec<usize> = Vec::with_capacity(symbols.len());
    for i in 0..symbols.len() {
        let root = uf.find(i);
        let next = root_to_community.len();
        let community = *root_to_community.entry(root).or_insert(next);
        assignment.push(community);
    }

    if symbols.len() >= REFINEMENT_MIN_SYMBOLS {
        refine(&mut assignment, &call_edges);
    }

    reporter.report(ProgressPhase::Communities, 50.0, Some("labelling"))?;

    // renumber after refinement so ids stay dense and first-occurrence ordered
    let mut renumber: HashMap<usize, usize> = HashMap::new();
    for &c in &assignment {
        let next = renumber.len();
        renumber.entry(c).or_insert(next);
    }
    for c in assignment.iter_mut() {
        *c = renumber[c];
    }
    let community_count = renumber.len();

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); community_count];
    for (i, &c) in assignment.iter().enumerate() {
        members[c].push(i);
    }

    // cohesion: intra / (intra + boundary) per community over call edges
    let mut intra = vec![0usize; community_count];
    let mut boundary = vec![0usize; community_count];
    for &(a, b) in &call_edges {
        if assignment[a] == assignment[b] {
            intra[assignment[a]] += 1;
        } else {
            boundary[assignment[a]] += 1;
            boundary[assignment[b]] += 1;
        }
    }

    let mut output = CommunityOutput::default();
    let mut cohesion_sum = 0.0;

    for (c, member_indices) in members.iter().enumerate() {
        let member_nodes: Vec<&GraphNode> = member_indices.iter().map(|&i| symbols[i]).collect();
        let cohesion = if intra[c] + boundary[c] == 0 {
            1.0
        } else {
            intra[c] as f64 / (intra[c] + boundary[c]) as f64
        };
        cohesion_sum += cohesion;

        let heuristic_label = heuristic_label(&member_nodes, entry_scores);
        let keywords = top_keywords(&member_nodes);
        let community_id = format!("Community:{c}");

        output.communities.push(GraphNode {
            id: community_id.clone(),
            kind: NodeKind::Community,
            properties: NodeProperties::Community {
                name: format!("community_{c}"),
                heuristic_label,
                keywords,
                description: String::new(),
                enriched_by: "heuristic".to_string(),
                cohesion,
                symbol_count: member_nodes.len(),
                color: COMMUNITY_COLORS[c % COMMUNITY_COLORS.len()].to_string(),
            },
        });

        for node in &member_nodes {
            output
                .memberships
                .push((node.id.clone(), community_id.clone()));
        }
    }

    output.stats = CommunityStats {
        community_count,
        largest_community: members.iter().map(Vec::len).max().unwrap_or(0),
        mean_cohesion: if community_count == 0 {
            0.0
        } else {
            cohesion_sum / community_count as f64
        },
    };

    reporter.report(
        ProgressPhase::Communities,
        100.0,
        Some(&format!("{community_count} communities")),
    )?;

    Ok(output)
}

/// Applies MEMBER_OF edges and community nodes to the graph.
pub fn materialize(graph: &mut KnowledgeGraph, output: &CommunityOutput) {
    for community in &output.communities {
        graph.add_node(community.clone());
    }
    for (symbol_id, community_id) in &output.memberships {
        graph.add_relationship(GraphEdge::new(
            symbol_id,
            RelationType::MemberOf,
            community_id,
        ));
    }
}

/// Iterative best-neighbour reassignment: each sweep moves a node to the
/// neighbouring community holding strictly more of its call edges than the
/// current one. Deterministic (insertion order); stops early when a sweep
/// makes no move.
fn refine(assignment: &mut [usize], call_edges: &[(usize, usize)]) {
    let n = assignment.len();
    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(a, b) in call_edges {
        neighbours[a].push(b);
        neighbours[b].push(a);
    }

    for _ in 0..MAX_REFINEMENT_SWEEPS {
        let mut moved = false;
        for node in 0..n {
            if neighbours[node].is_empty() {
                continue;
            }
            let current = assignment[node];
            let mut weight: HashMap<usize, usize> = HashMap::new();
            for &nb in &neighbours[node] {
                *weight.entry(assignment[nb]).or_default() += 1;
            }
            let current_weight = weight.get(&current).copied().unwrap_or(0);
            // deterministic choice: max weight, then lowest community index
            let best = weight
                .iter()
                .map(|(&c, &w)| (w, std::cmp::Reverse(c)))
                .max()
                .map(|(w, std::cmp::Reverse(c))| (c, w));
            if let Some((best_community, best_weight)) = best {
                if best_community != current && best_weight > current_weight {
                    assignment[node] = best_community;
                    moved = true;
                }
            }
        }
        if !moved {
            break;
        }
    }
}

/// Longest token shared by at least two member names; otherwise the name
/// of the member with the highest entry-point score.
fn heuristic_label(members: &[&GraphNode], entry_scores: &HashMap<String, f64>) -> String {
    let mut token_members: HashMap<String, usize> = HashMap::new();
    for node in members {
        let mut seen = std::collections::HashSet::new();
        for token in tokenize(node.name()) {
            if seen.insert(token.clone()) {
                *token_members.entry(token).or_default() += 1;
            }
        }
    }

    let shared = token_members
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .max_by(|a, b| {
            a.1.cmp(&b.1)
                .then(a.0.len().cmp(&b.0.len()))
                .then(b.0.cmp(&a.0))
        });

    if let Some((token, _)) = shared {
        return capitalize(&token);
    }

    members
        .iter()
        .max_by(|a, b| {
            let sa = entry_scores.get(&a.id).copied().unwrap_or(0.0);
            let sb = entry_scores.get(&b.id).copied().unwrap_or(0.0);
            sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|n| n.name().to_string())
        .unwrap_or_default()
}

/// Top tokens across member names by term frequency, capped at 8.
fn top_keywords(members: &[&GraphNode]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for node in members {
        for token in tokenize(node.name()) {
            *counts.entry(token).or_default() += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(token, _)| token)
        .collect()
}

/// Splits an identifier on snake/kebab separators and camelCase humps.
fn tokenize(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in name.chars() {
        if c == '_' || c == '-' || c == '$' || !c.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty()
            && current.chars().last().map(|l| l.is_lowercase()).unwrap_or(false)
        {
            tokens.push(std::mem::take(&mut current));
            current.push(c);
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
        .into_iter()
        .map(|t| t.to_lowercase())
        .filter(|t| t.len() >= 3)
        .collect()
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(id: &str, name: &str, path: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind: NodeKind::Function,
            properties: NodeProperties::Symbol {
                name: name.to_string(),
                file_path: path.to_string(),
                start_line: 1,
                end_line: 2,
                is_exported: false,
                content: None,
                description: None,
            },
        }
    }

    fn call_edge(a: &str, b: &str) -> GraphEdge {
        GraphEdge::new(a, RelationType::Calls, b).with_confidence(0.85)
    }

    #[test]
    fn test_connected_symbols_share_community() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(symbol("a", "authLogin", "a.ts"));
        graph.add_node(symbol("b", "authLogout", "a.ts"));
        graph.add_node(symbol("c", "renderChart", "b.ts"));
        graph.add_relationship(call_edge("a", "b"));

        let output =
            detect_communities(&graph, &HashMap::new(), &ProgressReporter::silent()).unwrap();

        assert_eq!(output.stats.community_count, 2);
        let membership: HashMap<&str, &str> = output
            .memberships
            .iter()
            .map(|(s, c)| (s.as_str(), c.as_str()))
            .collect();
        assert_eq!(membership["a"], membership["b"]);
        assert_ne!(membership["a"], membership["c"]);
    }

    #[test]
    fn test_membership_is_functional() {
        let mut graph = KnowledgeGraph::new();
        for i in 0..5 {
            graph.add_node(symbol(&format!("s{i}"), &format!("fn{i}"), "f.ts"));
        }
        graph.add_relationship(call_edge("s0", "s1"));
        graph.add_relationship(call_edge("s1", "s2"));

        let output =
            detect_communities(&graph, &HashMap::new(), &ProgressReporter::silent()).unwrap();

        let mut seen = std::collections::HashSet::new();
        for (symbol_id, _) in &output.memberships {
            assert!(seen.insert(symbol_id.clone()), "symbol in two communities");
        }
        assert_eq!(output.memberships.len(), 5);
    }

    #[test]
    fn test_imports_tie_files_together() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(GraphNode::file("a.ts", None));
        graph.add_node(GraphNode::file("b.ts", None));
        graph.add_node(symbol("a1", "alpha", "a.ts"));
        graph.add_node(symbol("b1", "beta", "b.ts"));
        graph.add_relationship(GraphEdge::new("File:a.ts", RelationType::Imports, "File:b.ts"));

        let output =
            detect_communities(&graph, &HashMap::new(), &ProgressReporter::silent()).unwrap();
        let membership: HashMap<&str, &str> = output
            .memberships
            .iter()
            .map(|(s, c)| (s.as_str(), c.as_str()))
            .collect();
        assert_eq!(membership["a1"], membership["b1"]);
    }

    #[test]
    fn test_cohesion_bounds_and_color_palette() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(symbol("a", "one", "a.ts"));
        graph.add_node(symbol("b", "two", "a.ts"));
        graph.add_relationship(call_edge("a", "b"));

        let output =
            detect_communities(&graph, &HashMap::new(), &ProgressReporter::silent()).unwrap();

        for community in &output.communities {
            if let NodeProperties::Community {
                cohesion, color, ..
            } = &community.properties
            {
                assert!((0.0..=1.0).contains(cohesion));
                assert!(COMMUNITY_COLORS.contains(&color.as_str()));
            } else {
                panic!("not a community node");
            }
        }
    }

    #[test]
    fn test_heuristic_label_common_token() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(symbol("a", "authLogin", "a.ts"));
        graph.add_node(symbol("b", "authLogout", "a.ts"));
        graph.add_relationship(call_edge("a", "b"));

        let output =
            detect_communities(&graph, &HashMap::new(), &ProgressReporter::silent()).unwrap();

        let community = output
            .communities
            .iter()
            .find(|c| {
                matches!(&c.properties, NodeProperties::Community { symbol_count, .. } if *symbol_count == 2)
            })
            .unwrap();
        if let NodeProperties::Community {
            heuristic_label,
            keywords,
            ..
        } = &community.properties
        {
            assert_eq!(heuristic_label, "Auth");
            assert!(keywords.contains(&"auth".to_string()));
            assert!(keywords.len() <= 8);
        }
    }

    #[test]
    fn test_singleton_label_falls_back_to_best_member() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(symbol("a", "orchestrate", "a.ts"));

        let mut scores = HashMap::new();
        scores.insert("a".to_string(), 5.0);
        let output = detect_communities(&graph, &scores, &ProgressReporter::silent()).unwrap();

        if let NodeProperties::Community {
            heuristic_label, ..
        } = &output.communities[0].properties
        {
            assert_eq!(heuristic_label, "orchestrate");
        }
    }

    #[test]
    fn test_empty_graph_yields_no_communities() {
        let graph = KnowledgeGraph::new();
        let output =
            detect_communities(&graph, &HashMap::new(), &ProgressReporter::silent()).unwrap();
        assert!(output.communities.is_empty());
        assert!(output.memberships.is_empty());
    }

    #[test]
    fn test_materialize_adds_member_of_edges() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(symbol("a", "one", "a.ts"));
        graph.add_node(symbol("b", "two", "a.ts"));
        graph.add_relationship(call_edge("a", "b"));

        let output =
            detect_communities(&graph, &HashMap::new(), &ProgressReporter::silent()).unwrap();
        materialize(&mut graph, &output);

        let member_edges: Vec<&GraphEdge> = graph
            .iter_relationships()
            .filter(|e| e.rel == RelationType::MemberOf)
            .collect();
        assert_eq!(member_edges.len(), 2);
        for edge in member_edges {
            assert!(graph.has_node(&edge.source_id));
            assert!(graph.has_node(&edge.target_id));
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("authLogin"), vec!["auth", "login"]);
        assert_eq!(tokenize("save_to_db"), vec!["save"]);
        assert_eq!(tokenize("HTTPServer"), vec!["httpserver"]);
        assert!(tokenize("ab").is_empty());
    }

    #[test]
    fn test_deterministic_output() {
        let build = || {
            let mut graph = KnowledgeGraph::new();
            for i in 0..6 {
                graph.add_node(symbol(&format!("s{i}"), &format!("name{i}"), "f.ts"));
            }
            graph.add_relationship(call_edge("s0", "s1"));
            graph.add_relationship(call_edge("s2", "s3"));
            graph.add_relationship(call_edge("s4", "s5"));
            detect_communities(&graph, &HashMap::new(), &ProgressReporter::silent()).unwrap()
        };
        let a = build();
        let b = build();
        assert_eq!(a.memberships, b.memberships);
    }
}
