use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use codeatlas::error::Result;
use codeatlas::pipeline::{
    CancelToken, Pipeline, PipelineOptions, ProgressCallback, ProgressPhase,
};
use codeatlas::storage::{read_head_sha, RepoStore};

#[derive(Parser)]
#[command(name = "codeatlas")]
#[command(about = "Extract a knowledge graph of code entities, communities and execution flows")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Analyze the current repository
    codeatlas analyze

    # Analyze a specific repository with a higher process cap
    codeatlas analyze ../service --max-processes 100

    # Show what the last analysis produced
    codeatlas stats
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a repository and persist its knowledge graph
    Analyze {
        /// Path to the repository root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Cap on detected execution-flow processes
        #[arg(long)]
        max_processes: Option<usize>,

        /// Skip storing symbol source text in the graph
        #[arg(long)]
        no_content: bool,
    },

    /// Show statistics from the persisted index
    Stats {
        /// Path to the repository root
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

pub fn analyze(path: &Path, max_processes: Option<usize>, no_content: bool) -> Result<()> {
    let root = path.canonicalize()?;
    let sha = read_head_sha(&root)?;

    let mut options = PipelineOptions::default();
    if let Some(max) = max_processes {
        options.max_processes = max;
    }
    options.include_content = !no_content;

    let progress: ProgressCallback = Box::new(|event: &codeatlas::pipeline::ProgressEvent| {
        // one line per phase boundary keeps the output readable
        if event.percent == 0.0 || event.percent == 100.0 {
            match &event.detail {
                Some(detail) => {
                    println!("[{}] {:>3.0}% {detail}", event.phase.as_str(), event.percent)
                }
                None => println!("[{}] {:>3.0}%", event.phase.as_str(), event.percent),
            }
        }
        if event.phase == ProgressPhase::Complete {
            println!("analysis complete");
        }
    });

    let pipeline = Pipeline::new(options);
    let report = pipeline.run(&root, Some(progress), CancelToken::new())?;

    println!(
        "Indexed {} files ({} definitions, {} calls resolved, {} communities, {} processes)",
        report.total_file_count,
        report.definition_count,
        report.call_stats.resolved(),
        report.community_stats.community_count,
        report.process_count,
    );
    if !report.failed_files.is_empty() {
        println!("{} files failed to parse:", report.failed_files.len());
        for failure in &report.failed_files {
            println!("  {}: {}", failure.path, failure.error);
        }
    }

    let store = RepoStore::at(&root);
    let metadata = store.persist(&report, &sha)?;
    println!(
        "Wrote {} nodes and {} relationships to {}",
        metadata.node_count,
        metadata.relationship_count,
        store.path().display(),
    );

    Ok(())
}

pub fn stats(path: &Path) -> Result<()> {
    let root = path.canonicalize()?;
    let store = RepoStore::at(&root);
    let metadata = store.read_metadata()?;

    println!("commit:        {}", metadata.last_commit_sha);
    println!("indexed at:    {}", metadata.created_at);
    println!("files:         {}", metadata.file_count);
    println!("nodes:         {}", metadata.node_count);
    println!("relationships: {}", metadata.relationship_count);

    Ok(())
}
