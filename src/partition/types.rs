//! Job and partition configuration types

use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::HashMap;

// ============================================================================
// Job Configuration
// ============================================================================

/// One batch job: a source system and its declared output files.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfig {
    /// Job name, also the first segment of derived template paths
    pub job_name: String,
    /// Source system identifier stamped into every partition
    pub source_system: String,
    /// Files to produce, one partition each
    #[serde(default)]
    pub files: Vec<FileConfig>,
}

/// One unit-of-work descriptor: where to read, what to produce, and the
/// free-form parameters its adapter, reader, and writer consume.
///
/// Immutable after construction except for the memoized template path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    /// Input file path for file-based formats
    #[serde(default)]
    pub input_path: Option<String>,
    /// Table or resource name for query-based formats
    #[serde(default)]
    pub target: Option<String>,
    /// Mapping-document key; derived from the job when unset
    #[serde(default)]
    pub template: Option<String>,
    /// Transaction type; treated as `"default"` when absent or empty
    #[serde(default)]
    pub transaction_type: Option<String>,
    /// Format, connection, pagination, and output parameters
    #[serde(default)]
    pub params: HashMap<String, String>,

    #[serde(skip)]
    pub(crate) resolved_template: OnceCell<String>,
}

impl FileConfig {
    /// Look up a parameter by key
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Look up a required parameter, failing with format context
    pub fn require_param(&self, format: &str, key: &str) -> Result<&str> {
        self.param(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::missing_parameter(format, key))
    }

    /// The source format token, required on every file entry
    pub fn format(&self) -> Result<&str> {
        self.param("format")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::config("file entry is missing the 'format' parameter"))
    }

    /// The effective transaction type
    pub fn transaction_type(&self) -> &str {
        match self.transaction_type.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => "default",
        }
    }

    /// The mapping-document key: the explicit `template` when set, otherwise
    /// `{jobName}/{sourceSystem}/{jobName}.yml`, memoized on first use.
    pub fn template(&self, job_name: &str, source_system: &str) -> &str {
        if let Some(template) = self.template.as_deref() {
            return template;
        }
        self.resolved_template
            .get_or_init(|| format!("{job_name}/{source_system}/{job_name}.yml"))
    }
}

// ============================================================================
// Partition Unit
// ============================================================================

/// One independently processable slice of a job, bound to a single
/// (transaction type, output file) pair.
#[derive(Debug, Clone)]
pub struct PartitionUnit {
    /// Stable key identifying this partition in logs and outcomes
    pub partition_key: String,
    /// The file entry this partition executes
    pub file_config: FileConfig,
    /// Owning job's source system
    pub source_system: String,
    /// Owning job's name
    pub job_name: String,
    /// Effective transaction type (never empty)
    pub transaction_type: String,
}

impl PartitionUnit {
    /// The mapping-document key for this partition
    pub fn template(&self) -> &str {
        self.file_config.template(&self.job_name, &self.source_system)
    }
}
