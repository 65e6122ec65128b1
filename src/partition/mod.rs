//! Job partitioning
//!
//! Expands a job's declared file list into independent partition units, one
//! per configured output file. Partitions never share state; each carries
//! its own [`FileConfig`] copy.

mod types;

pub use types::{FileConfig, JobConfig, PartitionUnit};

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Load a job configuration from a YAML file
pub fn load_job_config(path: impl AsRef<Path>) -> Result<JobConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("cannot read job config '{}': {e}", path.display())))?;
    load_job_config_from_str(&raw)
}

/// Parse a job configuration from YAML text
pub fn load_job_config_from_str(raw: &str) -> Result<JobConfig> {
    let config: JobConfig = serde_yaml::from_str(raw)?;
    if config.job_name.trim().is_empty() {
        return Err(Error::config("job config is missing jobName"));
    }
    if config.source_system.trim().is_empty() {
        return Err(Error::config("job config is missing sourceSystem"));
    }
    Ok(config)
}

// ============================================================================
// Partitioner
// ============================================================================

/// Splits one job into independent execution units
#[derive(Debug, Clone, Copy, Default)]
pub struct Partitioner;

impl Partitioner {
    /// Create a new partitioner
    pub fn new() -> Self {
        Self
    }

    /// Expand the job's file list into partition units keyed by
    /// `partition_{index}_{jobName}_{transactionType}`.
    ///
    /// Fails when the file list is empty; a job with nothing to produce is a
    /// configuration error, not an empty success.
    pub fn partition(&self, job: &JobConfig) -> Result<HashMap<String, PartitionUnit>> {
        if job.files.is_empty() {
            return Err(Error::partition(format!(
                "job '{}' declares no files",
                job.job_name
            )));
        }

        let mut units = HashMap::with_capacity(job.files.len());
        for (index, file_config) in job.files.iter().enumerate() {
            let transaction_type = file_config.transaction_type().to_string();
            let partition_key =
                format!("partition_{index}_{}_{transaction_type}", job.job_name);

            tracing::debug!(
                partition = %partition_key,
                source_system = %job.source_system,
                "created partition"
            );

            units.insert(
                partition_key.clone(),
                PartitionUnit {
                    partition_key,
                    file_config: file_config.clone(),
                    source_system: job.source_system.clone(),
                    job_name: job.job_name.clone(),
                    transaction_type,
                },
            );
        }
        Ok(units)
    }
}
