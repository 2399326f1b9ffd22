pub mod analysis;
pub mod error;
pub mod graph;
pub mod indexer;
pub mod languages;
pub mod pipeline;
pub mod storage;

use once_cell::sync::Lazy;

pub use error::{AtlasError, Result};
pub use graph::{GraphEdge, GraphNode, KnowledgeGraph, NodeKind, NodeProperties, RelationType};
pub use indexer::{
    AstCache, FileExtraction, FileWalker, ImportMap, ResolutionContext, SourceParser, SymbolTable,
};
pub use pipeline::{
    AnalysisReport, CancelToken, Pipeline, PipelineOptions, ProgressEvent, ProgressPhase,
};
pub use storage::{RepoStore, StorageWriter};

/// Global language registry instance (lazily initialized)
pub static REGISTRY: Lazy<languages::LanguageRegistry> =
    Lazy::new(languages::LanguageRegistry::new);
