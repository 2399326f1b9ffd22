//! Turns raw call sites into CALLS edges.
//!
//! Resolution ladder, first match wins: same-file lookup, then the
//! caller's resolved imports in insertion order, then the global fuzzy
//! index. Unresolvable calls are dropped silently.

use crate::error::Result;
use crate::graph::{GraphEdge, KnowledgeGraph, RelationType};
use crate::indexer::import_resolver::ImportMap;
use crate::indexer::progress::{ProgressPhase, ProgressReporter};
use crate::indexer::{RawCall, SymbolTable};

pub const CONFIDENCE_SAME_FILE: f64 = 0.85;
pub const CONFIDENCE_IMPORT_RESOLVED: f64 = 0.90;
pub const CONFIDENCE_FUZZY_UNIQUE: f64 = 0.50;
pub const CONFIDENCE_FUZZY_AMBIGUOUS: f64 = 0.30;

const PROGRESS_STRIDE: usize = 500;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallResolutionStats {
    pub same_file: usize,
    pub import_resolved: usize,
    pub fuzzy_unique: usize,
    pub fuzzy_ambiguous: usize,
    pub dropped: usize,
}

impl CallResolutionStats {
    pub fn resolved(&self) -> usize {
        self.same_file + self.import_resolved + self.fuzzy_unique + self.fuzzy_ambiguous
    }
}

pub fn resolve_calls(
    graph: &mut KnowledgeGraph,
    calls: &[RawCall],
    table: &SymbolTable,
    imports: &ImportMap,
    reporter: &ProgressReporter,
) -> Result<CallResolutionStats> {
    let mut stats = CallResolutionStats::default();
    let total = calls.len();

    for (processed, call) in calls.iter().enumerate() {
        if processed % PROGRESS_STRIDE == 0 {
            let percent = if total == 0 {
                100.0
            } else {
                processed as f64 / total as f64 * 100.0
            };
            reporter.report(
                ProgressPhase::Parsing,
                percent,
                Some(&format!("{processed}/{total} calls")),
            )?;
        }

        let resolution = resolve_one(call, table, imports);
        match resolution {
            Some((target_id, confidence, reason)) => {
                match reason {
                    "same-file" => stats.same_file += 1,
                    "import-resolved" => stats.import_resolved += 1,
                    _ => {
                        if confidence == CONFIDENCE_FUZZY_UNIQUE {
                            stats.fuzzy_unique += 1;
                        } else {
                            stats.fuzzy_ambiguous += 1;
                        }
                    }
                }
                graph.add_relationship(
                    GraphEdge::new(&call.source_id, RelationType::Calls, &target_id)
                        .with_confidence(confidence)
                        .with_reason(reason),
                );
            }
            None => stats.dropped += 1,
        }
    }

    Ok(stats)
}

fn resolve_one(
    call: &RawCall,
    table: &SymbolTable,
    imports: &ImportMap,
) -> Option<(String, f64, &'static str)> {
    // 1. same file
    if let Some(target) = table.lookup_exact(&call.file_path, &call.called_name) {
        return Some((target.to_string(), CONFIDENCE_SAME_FILE, "same-file"));
    }

    // 2. resolved imports of the calling file, first match in insertion order
    if let Some(targets) = imports.get(&call.file_path) {
        for target_file in targets {
            if let Some(target) = table.lookup_exact(target_file, &call.called_name) {
                return Some((
                    target.to_string(),
                    CONFIDENCE_IMPORT_RESOLVED,
                    "import-resolved",
                ));
            }
        }
    }

    // 3. global name lookup
    let hits = table.lookup_fuzzy(&call.called_name);
    match hits.len() {
        0 => None,
        1 => Some((
            hits[0].node_id.clone(),
            CONFIDENCE_FUZZY_UNIQUE,
            "fuzzy-global",
        )),
        _ => Some((
            hits[0].node_id.clone(),
            CONFIDENCE_FUZZY_AMBIGUOUS,
            "fuzzy-global",
        )),
    }
}
