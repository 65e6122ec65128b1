//! Execution outcome types

/// Retry/skip/chunk policy applied to every partition
#[derive(Debug, Clone, Copy)]
pub struct ChunkPolicy {
    /// Records per write commit
    pub chunk_size: usize,
    /// Retry attempts for transient record-level failures
    pub retry_limit: usize,
    /// Records that may be skipped before the partition fails
    pub skip_limit: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            retry_limit: 3,
            skip_limit: 0,
        }
    }
}

/// What happened to one partition
#[derive(Debug, Clone)]
pub struct PartitionOutcome {
    /// Partition key from the partitioner
    pub partition_key: String,
    /// Transaction type the partition executed
    pub transaction_type: String,
    /// Records produced by the reader
    pub records_read: u64,
    /// Records committed to the output file
    pub records_written: u64,
    /// Records abandoned under the skip policy
    pub records_skipped: u64,
    /// Transient-failure retries performed
    pub retries: u64,
    /// Failure message when the partition did not complete
    pub error: Option<String>,
}

impl PartitionOutcome {
    /// Whether the partition ran to completion
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated result of one job run
#[derive(Debug, Clone, Default)]
pub struct JobSummary {
    /// Job name from the configuration
    pub job_name: String,
    /// One outcome per partition, in partition-key order
    pub partitions: Vec<PartitionOutcome>,
}

impl JobSummary {
    /// Whether every partition completed
    pub fn is_success(&self) -> bool {
        self.partitions.iter().all(PartitionOutcome::is_success)
    }

    /// Total records committed across partitions
    pub fn records_written(&self) -> u64 {
        self.partitions.iter().map(|p| p.records_written).sum()
    }

    /// Total records skipped across partitions
    pub fn records_skipped(&self) -> u64 {
        self.partitions.iter().map(|p| p.records_skipped).sum()
    }

    /// Outcomes of partitions that failed
    pub fn failed_partitions(&self) -> Vec<&PartitionOutcome> {
        self.partitions.iter().filter(|p| !p.is_success()).collect()
    }
}
