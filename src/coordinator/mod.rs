//! Parallel partition execution
//!
//! Runs one reader/processor/writer pipeline per partition under a bounded
//! worker pool. Fault tolerance is chunked: transient record-level failures
//! are retried up to a limit, then skipped up to a separate limit; exceeding
//! the skip limit fails the partition. A failed partition never cancels its
//! siblings.

mod types;

pub use types::{ChunkPolicy, JobSummary, PartitionOutcome};

use crate::adapter::AdapterRegistry;
use crate::error::{Error, Result};
use crate::mapping::MappingCache;
use crate::partition::{JobConfig, PartitionUnit, Partitioner};
use crate::processor::RecordProcessor;
use crate::reader::{ReadContext, RecordReader};
use crate::types::Record;
use crate::writer::FlatFileWriter;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs a job's partitions in parallel with bounded fault tolerance
pub struct ExecutionCoordinator {
    registry: Arc<AdapterRegistry>,
    cache: Arc<MappingCache>,
    grid_size: usize,
    policy: ChunkPolicy,
    synchronous: bool,
}

impl ExecutionCoordinator {
    /// Create a coordinator over a shared adapter registry and mapping cache
    pub fn new(registry: Arc<AdapterRegistry>, cache: Arc<MappingCache>) -> Self {
        Self {
            registry,
            cache,
            grid_size: 4,
            policy: ChunkPolicy::default(),
            synchronous: false,
        }
    }

    /// Set the worker-pool size bounding concurrent partitions
    #[must_use]
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size.max(1);
        self
    }

    /// Set the number of records per write commit
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.policy.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the transient-failure retry limit
    #[must_use]
    pub fn with_retry_limit(mut self, retry_limit: usize) -> Self {
        self.policy.retry_limit = retry_limit;
        self
    }

    /// Set the number of records that may be skipped per partition
    #[must_use]
    pub fn with_skip_limit(mut self, skip_limit: usize) -> Self {
        self.policy.skip_limit = skip_limit;
        self
    }

    /// Run partitions sequentially on the caller's task for deterministic
    /// diagnosis
    #[must_use]
    pub fn synchronous(mut self, synchronous: bool) -> Self {
        self.synchronous = synchronous;
        self
    }

    /// Execute every partition of a job and aggregate the outcomes.
    ///
    /// Returns `Err` only for job-level configuration failures
    /// (partitioning); per-partition failures are reported in the summary.
    pub async fn run_job(&self, job: &JobConfig) -> Result<JobSummary> {
        let units = Partitioner::new().partition(job)?;
        let mut keys: Vec<String> = units.keys().cloned().collect();
        keys.sort();

        tracing::info!(
            job = %job.job_name,
            partitions = keys.len(),
            grid_size = self.grid_size,
            synchronous = self.synchronous,
            "job started"
        );

        let mut units = units;
        let outcomes = if self.synchronous {
            let mut outcomes = Vec::with_capacity(keys.len());
            for key in &keys {
                let unit = units.remove(key).ok_or_else(|| {
                    Error::partition(format!("partition '{key}' vanished"))
                })?;
                outcomes.push(
                    run_partition(&self.registry, &self.cache, unit, self.policy).await,
                );
            }
            outcomes
        } else {
            let semaphore = Arc::new(Semaphore::new(self.grid_size));
            let mut handles = Vec::with_capacity(keys.len());
            for key in &keys {
                let unit = units.remove(key).ok_or_else(|| {
                    Error::partition(format!("partition '{key}' vanished"))
                })?;
                let registry = Arc::clone(&self.registry);
                let cache = Arc::clone(&self.cache);
                let semaphore = Arc::clone(&semaphore);
                let policy = self.policy;
                handles.push(tokio::spawn(async move {
                    // Closed only if the semaphore is dropped, which cannot
                    // happen while this task holds a clone.
                    let _permit = semaphore.acquire_owned().await;
                    run_partition(&registry, &cache, unit, policy).await
                }));
            }

            let mut outcomes = Vec::with_capacity(handles.len());
            let joined = futures::future::join_all(handles).await;
            for (key, result) in keys.iter().zip(joined) {
                match result {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => outcomes.push(PartitionOutcome {
                        partition_key: key.clone(),
                        transaction_type: String::new(),
                        records_read: 0,
                        records_written: 0,
                        records_skipped: 0,
                        retries: 0,
                        error: Some(format!("partition task panicked: {e}")),
                    }),
                }
            }
            outcomes
        };

        let summary = JobSummary {
            job_name: job.job_name.clone(),
            partitions: outcomes,
        };
        tracing::info!(
            job = %job.job_name,
            written = summary.records_written(),
            skipped = summary.records_skipped(),
            failed = summary.failed_partitions().len(),
            "job finished"
        );
        Ok(summary)
    }
}

// ============================================================================
// Partition Execution
// ============================================================================

#[derive(Debug, Default)]
struct PartitionStats {
    records_read: u64,
    records_written: u64,
    records_skipped: u64,
    retries: u64,
}

/// Run one partition end to end, capturing any failure in the outcome
/// instead of propagating it to sibling partitions.
async fn run_partition(
    registry: &AdapterRegistry,
    cache: &MappingCache,
    unit: PartitionUnit,
    policy: ChunkPolicy,
) -> PartitionOutcome {
    let mut stats = PartitionStats::default();
    let error = match execute_partition(registry, cache, &unit, policy, &mut stats).await {
        Ok(()) => None,
        Err(e) => {
            tracing::error!(
                partition = %unit.partition_key,
                job = %unit.job_name,
                transaction_type = %unit.transaction_type,
                error = %e,
                "partition failed"
            );
            Some(e.to_string())
        }
    };

    PartitionOutcome {
        partition_key: unit.partition_key,
        transaction_type: unit.transaction_type,
        records_read: stats.records_read,
        records_written: stats.records_written,
        records_skipped: stats.records_skipped,
        retries: stats.retries,
        error,
    }
}

async fn execute_partition(
    registry: &AdapterRegistry,
    cache: &MappingCache,
    unit: &PartitionUnit,
    policy: ChunkPolicy,
    stats: &mut PartitionStats,
) -> Result<()> {
    // Per-partition object graph: nothing here outlives the partition.
    let mut reader = registry.create_reader(&unit.file_config)?;
    let processor = build_processor(cache, unit)?;
    let mut writer = FlatFileWriter::new(&unit.file_config)?;

    let mut ctx = ReadContext::default();
    reader.open(&ctx).await?;
    writer.open()?;

    let mut chunk = Vec::with_capacity(policy.chunk_size);
    while let Some(record) = next_record(reader.as_mut(), unit, policy, stats).await? {
        stats.records_read += 1;
        match process_record(&processor, &record, policy, stats) {
            Ok(output) => chunk.push(output),
            Err(e) => skip_record(unit, policy, stats, &e)?,
        }
        if chunk.len() >= policy.chunk_size {
            writer.write_chunk(&chunk)?;
            stats.records_written += chunk.len() as u64;
            chunk.clear();
        }
    }
    if !chunk.is_empty() {
        writer.write_chunk(&chunk)?;
        stats.records_written += chunk.len() as u64;
    }

    reader.update(&mut ctx);
    reader.close().await?;
    writer.close()?;

    tracing::info!(
        partition = %unit.partition_key,
        read = stats.records_read,
        written = stats.records_written,
        skipped = stats.records_skipped,
        "partition complete"
    );
    Ok(())
}

/// Select the processor mode for a partition: a `targetName` parameter
/// switches to source→target resolution against a shared target definition;
/// otherwise the partition's positional mapping document drives the output.
fn build_processor(cache: &MappingCache, unit: &PartitionUnit) -> Result<RecordProcessor> {
    if let Some(target_name) = unit.file_config.param("targetName") {
        let mapping = cache.source_mapping(&unit.source_system, target_name)?;
        let definition = cache.target_definition(target_name)?;
        return Ok(RecordProcessor::for_target(
            mapping,
            definition,
            unit.transaction_type.clone(),
        ));
    }
    let document = cache.document(unit.template(), &unit.transaction_type)?;
    Ok(RecordProcessor::new(document))
}

/// Read the next record, retrying transient failures and skipping poison
/// records under the partition's skip budget.
async fn next_record(
    reader: &mut dyn RecordReader,
    unit: &PartitionUnit,
    policy: ChunkPolicy,
    stats: &mut PartitionStats,
) -> Result<Option<Record>> {
    let mut attempts = 0;
    loop {
        match reader.read().await {
            Ok(record) => return Ok(record),
            Err(e) if e.is_transient() && attempts < policy.retry_limit => {
                attempts += 1;
                stats.retries += 1;
                tracing::debug!(
                    partition = %unit.partition_key,
                    attempt = attempts,
                    error = %e,
                    "transient read failure, retrying"
                );
            }
            Err(e) => {
                skip_record(unit, policy, stats, &e)?;
                attempts = 0;
            }
        }
    }
}

/// Process one record, retrying transient failures
fn process_record(
    processor: &RecordProcessor,
    record: &Record,
    policy: ChunkPolicy,
    stats: &mut PartitionStats,
) -> Result<crate::types::OrderedRecord> {
    let mut attempts = 0;
    loop {
        match processor.process(record) {
            Ok(output) => return Ok(output),
            Err(e) if e.is_transient() && attempts < policy.retry_limit => {
                attempts += 1;
                stats.retries += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Account one skipped record, failing the partition when the budget is
/// exhausted.
fn skip_record(
    unit: &PartitionUnit,
    policy: ChunkPolicy,
    stats: &mut PartitionStats,
    cause: &Error,
) -> Result<()> {
    stats.records_skipped += 1;
    tracing::warn!(
        partition = %unit.partition_key,
        skipped = stats.records_skipped,
        error = %cause,
        "record skipped"
    );
    if stats.records_skipped > policy.skip_limit as u64 {
        return Err(Error::SkipLimitExceeded {
            limit: policy.skip_limit,
        });
    }
    Ok(())
}
