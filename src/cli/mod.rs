//! Command-line interface
//!
//! `run` executes a job configuration; `validate` loads the job and every
//! document it references and reports configuration errors without
//! executing anything.

use crate::adapter::AdapterRegistry;
use crate::coordinator::ExecutionCoordinator;
use crate::mapping::MappingCache;
use crate::partition::{load_job_config, Partitioner};
use crate::writer::FlatFileWriter;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Batch ETL engine mapping heterogeneous sources onto fixed-width records
#[derive(Parser, Debug)]
#[command(name = "recast", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a job configuration
    Run {
        /// Path to the job YAML
        job: PathBuf,
        /// Root directory for mapping documents (defaults to the job
        /// file's directory)
        #[arg(long)]
        mappings: Option<PathBuf>,
        /// Worker-pool size bounding concurrent partitions
        #[arg(long)]
        grid_size: Option<usize>,
        /// Records per write commit
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Retry attempts for transient record-level failures
        #[arg(long)]
        retry_limit: Option<usize>,
        /// Records that may be skipped before a partition fails
        #[arg(long)]
        skip_limit: Option<usize>,
        /// Run partitions sequentially for deterministic diagnosis
        #[arg(long)]
        synchronous: bool,
    },
    /// Check a job configuration and its mapping documents without running
    Validate {
        /// Path to the job YAML
        job: PathBuf,
        /// Root directory for mapping documents (defaults to the job
        /// file's directory)
        #[arg(long)]
        mappings: Option<PathBuf>,
    },
}

/// Entry point invoked by the binary
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run {
            job,
            mappings,
            grid_size,
            chunk_size,
            retry_limit,
            skip_limit,
            synchronous,
        } => {
            let config = load_job_config(&job)
                .with_context(|| format!("loading job config '{}'", job.display()))?;
            let cache = Arc::new(MappingCache::new(mapping_root(&job, mappings)));
            let registry = Arc::new(AdapterRegistry::with_builtin_adapters());

            let mut coordinator = ExecutionCoordinator::new(registry, cache)
                .synchronous(synchronous);
            if let Some(n) = grid_size {
                coordinator = coordinator.with_grid_size(n);
            }
            if let Some(n) = chunk_size {
                coordinator = coordinator.with_chunk_size(n);
            }
            if let Some(n) = retry_limit {
                coordinator = coordinator.with_retry_limit(n);
            }
            if let Some(n) = skip_limit {
                coordinator = coordinator.with_skip_limit(n);
            }

            let summary = coordinator.run_job(&config).await?;
            for outcome in &summary.partitions {
                match &outcome.error {
                    None => println!(
                        "{}: read {} written {} skipped {} retries {}",
                        outcome.partition_key,
                        outcome.records_read,
                        outcome.records_written,
                        outcome.records_skipped,
                        outcome.retries
                    ),
                    Some(error) => {
                        println!("{}: FAILED: {error}", outcome.partition_key)
                    }
                }
            }
            if !summary.is_success() {
                anyhow::bail!(
                    "{} of {} partitions failed",
                    summary.failed_partitions().len(),
                    summary.partitions.len()
                );
            }
            Ok(())
        }
        Command::Validate { job, mappings } => {
            let config = load_job_config(&job)
                .with_context(|| format!("loading job config '{}'", job.display()))?;
            let cache = MappingCache::new(mapping_root(&job, mappings));
            let registry = AdapterRegistry::with_builtin_adapters();

            let units = Partitioner::new().partition(&config)?;
            let mut failures = 0;
            let mut keys: Vec<&String> = units.keys().collect();
            keys.sort();
            for key in keys {
                let unit = &units[key];
                let result = registry
                    .create_reader(&unit.file_config)
                    .map(drop)
                    .and_then(|()| FlatFileWriter::new(&unit.file_config).map(drop))
                    .and_then(|()| {
                        if let Some(target_name) = unit.file_config.param("targetName") {
                            cache
                                .source_mapping(&unit.source_system, target_name)
                                .map(drop)
                                .and_then(|()| cache.target_definition(target_name).map(drop))
                        } else {
                            cache
                                .document(unit.template(), &unit.transaction_type)
                                .map(drop)
                        }
                    });
                match result {
                    Ok(()) => println!("{key}: ok"),
                    Err(e) => {
                        failures += 1;
                        println!("{key}: {e}");
                    }
                }
            }
            if failures > 0 {
                anyhow::bail!("{failures} of {} partitions invalid", units.len());
            }
            println!("{} partitions valid", units.len());
            Ok(())
        }
    }
}

fn mapping_root(job: &Path, mappings: Option<PathBuf>) -> PathBuf {
    mappings.unwrap_or_else(|| {
        job.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    })
}
