//! Execution-flow detection.
//!
//! From each high-scoring entry point a single greedy chain is walked over
//! CALLS edges: at a branch the highest-confidence edge wins, ties broken
//! by the callee's entry score and then edge insertion order. Chains are
//! acyclic, depth-capped and only kept when long enough to be interesting.

use std::collections::{HashMap, HashSet};

use crate::analysis::entry_points::is_test_file;
use crate::error::Result;
use crate::graph::{
    GraphEdge, GraphNode, KnowledgeGraph, NodeKind, NodeProperties, ProcessType, RelationType,
};
use crate::indexer::progress::{ProgressPhase, ProgressReporter};

pub const MIN_TRACE_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct ProcessConfig {
    pub max_processes: usize,
    pub max_trace_depth: usize,
    pub min_steps: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            max_processes: 50,
            max_trace_depth: 8,
            min_steps: 3,
        }
    }
}

#[derive(Debug)]
struct TraceCandidate {
    trace: Vec<String>,
    confidences: Vec<f64>,
}

impl TraceCandidate {
    fn mean_confidence(&self) -> f64 {
        if self.confidences.is_empty() {
            0.0
        } else {
            self.confidences.iter().sum::<f64>() / self.confidences.len() as f64
        }
    }
}

#[derive(Debug, Default)]
pub struct ProcessOutput {
    pub processes: Vec<GraphNode>,
    /// (symbol id, process id, step) triples, step in 1..=step_count.
    pub steps: Vec<(String, String, u32)>,
}

pub fn detect_processes(
    graph: &KnowledgeGraph,
    memberships: &HashMap<String, String>,
    entry_scores: &HashMap<String, f64>,
    config: &ProcessConfig,
    reporter: &ProgressReporter,
) -> Result<ProcessOutput> {
    reporter.report(ProgressPhase::Processes, 0.0, Some("selecting entry points"))?;

    // outgoing CALLS adjacency above the trace confidence floor, in edge
    // insertion order
    let mut outgoing: HashMap<&str, Vec<(&str, f64)>> = HashMap::new();
    for edge in graph.iter_relationships() {
        if edge.rel == RelationType::Calls && edge.confidence >= MIN_TRACE_CONFIDENCE {
            outgoing
                .entry(edge.source_id.as_str())
                .or_default()
                .push((edge.target_id.as_str(), edge.confidence));
        }
    }

    let entries = select_entries(graph, memberships, entry_scores, config);
    reporter.report(
        ProgressPhase::Processes,
        25.0,
        Some(&format!("{} candidate entries", entries.len())),
    )?;

    let mut candidates: Vec<TraceCandidate> = Vec::new();
    for entry_id in &entries {
        let candidate = walk_chain(entry_id, &outgoing, entry_scores, config);
        if candidate.trace.len() >= config.min_steps {
            candidates.push(candidate);
        }
    }

    reporter.report(
        ProgressPhase::Processes,
        60.0,
        Some(&format!("{} traces", candidates.len())),
    )?;

    // keep the longest, most confident traces
    candidates.sort_by(|a, b| {
        b.trace
            .len()
            .cmp(&a.trace.len())
            .then(
                b.mean_confidence()
                    .partial_cmp(&a.mean_confidence())
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.trace[0].cmp(&b.trace[0]))
    });
    candidates.truncate(config.max_processes);

    let mut output = ProcessOutput::default();
    for candidate in &candidates {
        let (Some(entry_id), Some(terminal_id)) =
            (candidate.trace.first(), candidate.trace.last())
        else {
            continue;
        };

        let mut communities: Vec<String> = Vec::new();
        for node_id in &candidate.trace {
            if let Some(community) = memberships.get(node_id) {
                if !communities.contains(community) {
                    communities.push(community.clone());
                }
            }
        }
        let process_type = if communities.len() <= 1 {
            ProcessType::IntraCommunity
        } else {
            ProcessType::CrossCommunity
        };

        let label = format!(
            "{} → {}",
            pascal_case(symbol_name(graph, entry_id)),
            pascal_case(symbol_name(graph, terminal_id)),
        );

        let process_id = format!("Process:{entry_id}");
        output.processes.push(GraphNode {
            id: process_id.clone(),
            kind: NodeKind::Process,
            properties: NodeProperties::Process {
                heuristic_label: label,
                process_type,
                step_count: candidate.trace.len(),
                communities,
                entry_point_id: entry_id.clone(),
                terminal_id: terminal_id.clone(),
                trace: candidate.trace.clone(),
            },
        });

        for (index, node_id) in candidate.trace.iter().enumerate() {
            output
                .steps
                .push((node_id.clone(), process_id.clone(), index as u32 + 1));
        }
    }

    reporter.report(
        ProgressPhase::Processes,
        100.0,
        Some(&format!("{} processes", output.processes.len())),
    )?;

    Ok(output)
}

/// Applies Process nodes and STEP_IN_PROCESS edges to the graph.
pub fn materialize(graph: &mut KnowledgeGraph, output: &ProcessOutput) {
    for process in &output.processes {
        graph.add_node(process.clone());
    }
    for (symbol_id, process_id, step) in &output.steps {
        graph.add_relationship(
            GraphEdge::new(symbol_id, RelationType::StepInProcess, process_id).with_step(*step),
        );
    }
}

/// Top-N scored symbols per community, excluding test files. N scales with
/// the process cap so small repositories still yield flows.
fn select_entries(
    graph: &KnowledgeGraph,
    memberships: &HashMap<String, String>,
    entry_scores: &HashMap<String, f64>,
    config: &ProcessConfig,
) -> Vec<String> {
    let mut per_community: HashMap<&str, Vec<(&str, f64)>> = HashMap::new();

    for node in graph.iter_nodes() {
        if !node.kind.is_symbol() {
            continue;
        }
        let score = entry_scores.get(&node.id).copied().unwrap_or(0.0);
        if score <= 0.0 {
            continue;
        }
        if node.file_path().map(is_test_file).unwrap_or(false) {
            continue;
        }
        let community = memberships
            .get(&node.id)
            .map(String::as_str)
            .unwrap_or("");
        per_community
            .entry(community)
            .or_default()
            .push((node.id.as_str(), score));
    }

    let community_count = per_community.len().max(1);
    let top_n = config.max_processes.div_ceil(community_count).max(1);

    let mut selected: Vec<(String, f64)> = Vec::new();
    let mut community_keys: Vec<&&str> = per_community.keys().collect();
    community_keys.sort();
    for key in community_keys {
        let mut ranked = per_community[*key].clone();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(b.0))
        });
        for (id, score) in ranked.into_iter().take(top_n) {
            selected.push((id.to_string(), score));
        }
    }

    selected.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    selected.into_iter().map(|(id, _)| id).collect()
}

/// Depth-first walk with a per-trace visited set. The trace is the visit
/// order: at a branch the highest-confidence edge is taken first, ties
/// broken by the callee's entry score and then edge insertion order.
/// Recursion depth is capped and the whole trace is bounded so one hub
/// cannot absorb the graph.
fn walk_chain(
    entry_id: &str,
    outgoing: &HashMap<&str, Vec<(&str, f64)>>,
    entry_scores: &HashMap<String, f64>,
    config: &ProcessConfig,
) -> TraceCandidate {
    let trace_cap = config.max_trace_depth * 4;
    let mut candidate = TraceCandidate {
        trace: Vec::new(),
        confidences: Vec::new(),
    };
    let mut visited: HashSet<&str> = HashSet::new();

    fn visit<'a>(
        node: &'a str,
        depth: usize,
        outgoing: &HashMap<&'a str, Vec<(&'a str, f64)>>,
        entry_scores: &HashMap<String, f64>,
        visited: &mut HashSet<&'a str>,
        candidate: &mut TraceCandidate,
        max_depth: usize,
        trace_cap: usize,
    ) {
        visited.insert(node);
        candidate.trace.push(node.to_string());
        if depth + 1 >= max_depth {
            return;
        }

        let Some(edges) = outgoing.get(node) else {
            return;
        };
        let mut children: Vec<(usize, &str, f64)> = edges
            .iter()
            .enumerate()
            .map(|(i, &(target, confidence))| (i, target, confidence))
            .collect();
        children.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let score_a = entry_scores.get(a.1).copied().unwrap_or(0.0);
                    let score_b = entry_scores.get(b.1).copied().unwrap_or(0.0);
                    score_b
                        .partial_cmp(&score_a)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then(a.0.cmp(&b.0))
        });

        for (_, target, confidence) in children {
            if visited.contains(target) || candidate.trace.len() >= trace_cap {
                continue;
            }
            candidate.confidences.push(confidence);
            visit(
                target,
                depth + 1,
                outgoing,
                entry_scores,
                visited,
                candidate,
                max_depth,
                trace_cap,
            );
        }
    }

    // the entry id borrows from the graph through `outgoing` keys
    let entry_key = outgoing
        .keys()
        .copied()
        .find(|&k| k == entry_id)
        .unwrap_or(entry_id);
    visit(
        entry_key,
        0,
        outgoing,
        entry_scores,
        &mut visited,
        &mut candidate,
        config.max_trace_depth,
        trace_cap,
    );

    candidate
}

fn symbol_name<'a>(graph: &'a KnowledgeGraph, id: &'a str) -> &'a str {
    graph.get_node(id).map(|n| n.name()).unwrap_or(id)
}

fn pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for c in name.chars() {
        if c == '_' || c == '-' || c == ' ' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
