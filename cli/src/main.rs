use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use content_mapping_kernel::adapters::memory::{copy_fields, MemoryStore};
use content_mapping_kernel::worker::{RunLog, RunStats};
use content_mapping_kernel::{Indexer, Synchronizer, WorkerConfig};

/// Content Mapping CLI
#[derive(Parser, Debug)]
#[command(name = "content-mapping")]
#[command(about = "Reconcile the records of a destination store with a source store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full synchronization: merge both stores by ID
    Synchronize(SyncArgs),

    /// Apply the source change queue to the destination
    Index(IndexArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Path to the source store JSON
    #[arg(long)]
    source: PathBuf,

    /// Path to the destination store JSON (created if missing)
    #[arg(long)]
    destination: PathBuf,

    /// Type of records to process
    #[arg(long = "type")]
    object_type: String,
}

#[derive(Args, Debug)]
struct SyncArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Path to worker config JSON
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct IndexArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Remove the processed queue entries from the source store
    #[arg(long)]
    consume_queue: bool,
}

/// Wrapper for JSON output
#[derive(Debug, Serialize)]
struct CliOutput {
    stats: RunStats,
    processed: usize,
    log: RunLog,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output = match cli.command {
        Command::Synchronize(args) => synchronize(&args)?,
        Command::Index(args) => index(&args)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn synchronize(args: &SyncArgs) -> Result<CliOutput> {
    let run = &args.run;
    let (source, destination) = load_stores(run)?;
    let config = load_config(args.config.as_deref())?;

    let mut synchronizer = Synchronizer::with_config(source, destination, config);
    let log = synchronizer
        .synchronize(&run.object_type, copy_fields)
        .with_context(|| format!("synchronization of `{}` failed", run.object_type))?;

    let (_, destination) = synchronizer.into_parts();
    save(&destination, &run.destination)?;

    Ok(CliOutput {
        stats: log.stats(),
        processed: destination.processed(),
        log,
    })
}

fn index(args: &IndexArgs) -> Result<CliOutput> {
    let run = &args.run;
    let (source, destination) = load_stores(run)?;

    let mut indexer = Indexer::new(source, destination);
    let log = indexer
        .index(&run.object_type, copy_fields)
        .with_context(|| format!("indexing of `{}` failed", run.object_type))?;

    let (mut source, destination) = indexer.into_parts();
    save(&destination, &run.destination)?;

    if args.consume_queue {
        source.clear_queue(&run.object_type);
        save(&source, &run.source)?;
    }

    Ok(CliOutput {
        stats: log.stats(),
        processed: destination.processed(),
        log,
    })
}

fn load_stores(args: &RunArgs) -> Result<(MemoryStore, MemoryStore)> {
    let source = MemoryStore::load(&args.source)
        .with_context(|| format!("loading source store {}", args.source.display()))?;
    let destination = MemoryStore::load_or_default(&args.destination)
        .with_context(|| format!("loading destination store {}", args.destination.display()))?;

    Ok((source, destination))
}

fn load_config(path: Option<&Path>) -> Result<WorkerConfig> {
    let Some(path) = path else {
        return Ok(WorkerConfig::default());
    };

    let data =
        fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str::<WorkerConfig>(&data)
        .with_context(|| format!("parsing config {}", path.display()))
}

fn save(store: &MemoryStore, path: &Path) -> Result<()> {
    store
        .save(path)
        .with_context(|| format!("writing store {}", path.display()))
}
