//! Pipeline driver.
//!
//! Runs the stages in strict order: walk, parallel per-file extraction,
//! structure, symbol table, import resolution, calls and heritage, entry
//! scoring, communities, processes, finalisation. Everything after
//! extraction is an in-memory transformation over the graph on the driver
//! thread.

pub mod calls;
pub mod communities;
pub mod heritage;
pub mod processes;
pub mod structure;

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;

use crate::analysis::entry_points::{score_entry_point, EntryPointSignal};
use crate::error::{AtlasError, Result};
use crate::graph::{GraphEdge, GraphNode, KnowledgeGraph, NodeProperties, RelationType};
use crate::indexer::{
    FileExtraction, FileWalker, ResolutionContext, SourceParser, SymbolExtractor, SymbolTable,
};
use crate::languages::LanguageRegistry;

pub use crate::indexer::progress::{
    CancelToken, ProgressCallback, ProgressEvent, ProgressPhase, ProgressReporter,
};
pub use calls::CallResolutionStats;
pub use communities::{CommunityOutput, CommunityStats};
pub use processes::ProcessConfig;

/// Files handed to one rayon batch between progress ticks.
const EXTRACTION_BATCH: usize = 64;

/// Stored symbol content is capped; full text still feeds AST hints.
const MAX_SYMBOL_CONTENT: usize = 2000;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_processes: usize,
    pub max_trace_depth: usize,
    pub min_steps: usize,
    pub include_content: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        let process_defaults = ProcessConfig::default();
        Self {
            max_processes: process_defaults.max_processes,
            max_trace_depth: process_defaults.max_trace_depth,
            min_steps: process_defaults.min_steps,
            include_content: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FailedFile {
    pub path: String,
    pub error: String,
}

#[derive(Debug)]
pub struct AnalysisReport {
    pub graph: KnowledgeGraph,
    /// Supported files that were successfully extracted.
    pub total_file_count: usize,
    /// Everything the walker surfaced, supported or not.
    pub walked_file_count: usize,
    pub failed_files: Vec<FailedFile>,
    pub definition_count: usize,
    pub import_edge_count: usize,
    pub heritage_edge_count: usize,
    pub call_stats: CallResolutionStats,
    pub community_stats: CommunityStats,
    pub process_count: usize,
    pub file_count_by_language: Vec<(String, usize)>,
}

pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn with_defaults() -> Self {
        Self::new(PipelineOptions::default())
    }

    pub fn run(
        &self,
        root: &Path,
        progress: Option<ProgressCallback>,
        cancel: CancelToken,
    ) -> Result<AnalysisReport> {
        let reporter = ProgressReporter::new(progress, cancel);

        // --- walk + classify ---
        let walker = FileWalker::new();
        let walked = walker.walk(root)?;
        let walked_file_count = walked.len();

        let supported: Vec<String> = walked
            .iter()
            .filter(|f| crate::REGISTRY.language_tag(Path::new(&f.relative_path)).is_some())
            .map(|f| f.relative_path.clone())
            .collect();

        // --- parallel extraction ---
        reporter.report(
            ProgressPhase::Extracting,
            0.0,
            Some(&format!("0/{} files", supported.len())),
        )?;

        let mut extractions: Vec<FileExtraction> = Vec::with_capacity(supported.len());
        let mut failed_files: Vec<FailedFile> = Vec::new();
        let mut done = 0usize;

        for batch in supported.chunks(EXTRACTION_BATCH) {
            let results: Vec<std::result::Result<FileExtraction, FailedFile>> = batch
                .par_iter()
                .map(|relative_path| {
                    // workers own their parser; no shared mutable state
                    let parser = SourceParser::new(LanguageRegistry::new());
                    let extractor = SymbolExtractor::new();
                    parser
                        .parse_file(root, relative_path)
                        .and_then(|parsed| extractor.extract(&parsed, relative_path))
                        .map_err(|e| FailedFile {
                            path: relative_path.clone(),
                            error: e.to_string(),
                        })
                })
                .collect();

            for result in results {
                match result {
                    Ok(extraction) => extractions.push(extraction),
                    Err(failure) => {
                        tracing::warn!(file = %failure.path, error = %failure.error, "extraction failed");
                        failed_files.push(failure);
                    }
                }
            }

            done += batch.len();
            let percent = done as f64 / supported.len().max(1) as f64 * 100.0;
            reporter.report(
                ProgressPhase::Extracting,
                percent,
                Some(&format!("{done}/{} files", supported.len())),
            )?;
        }

        if extractions.is_empty() && !supported.is_empty() {
            return Err(AtlasError::Parse(
                "no files could be parsed in this repository".to_string(),
            ));
        }

        // deterministic downstream order
        extractions.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        let indexed_files: Vec<String> =
            extractions.iter().map(|e| e.file_path.clone()).collect();

        // --- structure ---
        reporter.report(ProgressPhase::Structure, 0.0, None)?;
        let mut graph = KnowledgeGraph::new();
        structure::build_structure(&mut graph, &indexed_files);

        let mut definition_count = 0;
        for extraction in &extractions {
            let file_id = format!("File:{}", extraction.file_path);
            for def in &extraction.definitions {
                definition_count += 1;
                let content = if self.options.include_content {
                    Some(truncate(&def.text, MAX_SYMBOL_CONTENT))
                } else {
                    None
                };
                graph.add_node(GraphNode {
                    id: def.id.clone(),
                    kind: def.kind,
                    properties: NodeProperties::Symbol {
                        name: def.name.clone(),
                        file_path: def.file_path.clone(),
                        start_line: def.start_line,
                        end_line: def.end_line,
                        is_exported: def.is_exported,
                        content,
                        description: None,
                    },
                });
                graph.add_relationship(GraphEdge::new(
                    &file_id,
                    RelationType::Contains,
                    &def.id,
                ));
                graph.add_relationship(GraphEdge::new(&file_id, RelationType::Defines, &def.id));
            }
        }
        reporter.report(ProgressPhase::Structure, 100.0, None)?;

        // --- symbol table ---
        let mut table = SymbolTable::new();
        for extraction in &extractions {
            for def in &extraction.definitions {
                table.add(&def.file_path, &def.name, &def.id, def.kind);
            }
        }

        // --- import resolution ---
        let mut context = ResolutionContext::build(&indexed_files);
        let mut import_map: crate::indexer::ImportMap = Default::default();
        let mut import_edge_count = 0;
        for extraction in &extractions {
            for import in &extraction.imports {
                let Some(target) = context.resolve(&extraction.file_path, &import.specifier)
                else {
                    continue;
                };
                if target == extraction.file_path {
                    continue;
                }
                let targets = import_map
                    .entry(extraction.file_path.clone())
                    .or_default();
                if !targets.contains(&target) {
                    targets.push(target.clone());
                }
                let from_id = format!("File:{}", extraction.file_path);
                let to_id = format!("File:{target}");
                if graph.add_relationship(GraphEdge::new(
                    &from_id,
                    RelationType::Imports,
                    &to_id,
                )) {
                    import_edge_count += 1;
                }
            }
        }

        // --- calls + heritage ---
        reporter.report(ProgressPhase::Parsing, 0.0, None)?;
        let all_calls: Vec<crate::indexer::RawCall> = extractions
            .iter()
            .flat_map(|e| e.calls.iter().cloned())
            .collect();
        let call_stats =
            calls::resolve_calls(&mut graph, &all_calls, &table, &import_map, &reporter)?;

        let all_heritage: Vec<crate::indexer::RawHeritage> = extractions
            .iter()
            .flat_map(|e| e.heritage.iter().cloned())
            .collect();
        let heritage_edge_count = heritage::resolve_heritage(&mut graph, &all_heritage, &table)?;
        reporter.report(ProgressPhase::Parsing, 100.0, None)?;

        // --- entry-point scoring ---
        let entry_scores = self.score_symbols(&graph, &extractions);

        // --- communities ---
        let community_output = communities::detect_communities(&graph, &entry_scores, &reporter)?;
        communities::materialize(&mut graph, &community_output);
        let memberships: HashMap<String, String> = community_output
            .memberships
            .iter()
            .cloned()
            .collect();

        // --- processes ---
        let process_config = ProcessConfig {
            max_processes: self.options.max_processes,
            max_trace_depth: self.options.max_trace_depth,
            min_steps: self.options.min_steps,
        };
        let process_output = processes::detect_processes(
            &graph,
            &memberships,
            &entry_scores,
            &process_config,
            &reporter,
        )?;
        processes::materialize(&mut graph, &process_output);

        // --- finalise ---
        let mut by_language: HashMap<String, usize> = HashMap::new();
        for extraction in &extractions {
            *by_language.entry(extraction.language.clone()).or_default() += 1;
        }
        let mut file_count_by_language: Vec<(String, usize)> = by_language.into_iter().collect();
        file_count_by_language.sort();

        reporter.report(ProgressPhase::Complete, 100.0, None)?;

        Ok(AnalysisReport {
            total_file_count: extractions.len(),
            walked_file_count,
            failed_files,
            definition_count,
            import_edge_count,
            heritage_edge_count,
            call_stats,
            community_stats: community_output.stats,
            process_count: process_output.processes.len(),
            file_count_by_language,
            graph,
        })
    }

    /// Entry-point score per symbol id, fed by call-graph fan counts.
    fn score_symbols(
        &self,
        graph: &KnowledgeGraph,
        extractions: &[FileExtraction],
    ) -> HashMap<String, f64> {
        let mut caller_counts: HashMap<&str, usize> = HashMap::new();
        let mut callee_counts: HashMap<&str, usize> = HashMap::new();
        for edge in graph.iter_relationships() {
            if edge.rel == RelationType::Calls {
                *callee_counts.entry(edge.source_id.as_str()).or_default() += 1;
                *caller_counts.entry(edge.target_id.as_str()).or_default() += 1;
            }
        }

        let mut scores = HashMap::new();
        for extraction in extractions {
            for def in &extraction.definitions {
                let signal = EntryPointSignal {
                    name: &def.name,
                    language: &extraction.language,
                    is_exported: def.is_exported,
                    caller_count: caller_counts.get(def.id.as_str()).copied().unwrap_or(0),
                    callee_count: callee_counts.get(def.id.as_str()).copied().unwrap_or(0),
                    file_path: Some(&def.file_path),
                    ast_text: Some(&def.text),
                };
                scores.insert(def.id.clone(), score_entry_point(&signal).score);
            }
        }
        scores
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
