//! Source adapter registry
//!
//! Adapters bind format tokens to reader constructors. The registry probes
//! a fixed catalog of known tokens at registration time and resolves
//! conflicts by adapter priority, producing an immutable lookup map that is
//! safe for concurrent reads.

use crate::error::{Error, Result};
use crate::partition::FileConfig;
use crate::reader::{
    DelimitedReader, ExcelReader, FixedWidthReader, RecordReader, RestReader, SqlReader,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Known format tokens probed at registration time.
///
/// Tokens without a registered adapter (message queues, object stores,
/// structured documents) fail lookup with the supported-format list.
pub const FORMAT_CATALOG: &[&str] = &[
    "jdbc", "database", "sql", "rest", "api", "http", "https", "kafka", "stream", "s3", "aws",
    "csv", "excel", "json", "xml", "delimited", "fixed",
];

/// A pluggable source format: recognizes tokens, validates configuration,
/// and constructs streaming readers.
pub trait SourceAdapter: Send + Sync {
    /// Adapter name for logs and error context
    fn name(&self) -> &'static str;

    /// Whether this adapter handles the given format token
    /// (case-insensitive)
    fn supports(&self, format: &str) -> bool;

    /// Conflict-resolution weight; the higher priority wins a token
    fn priority(&self) -> i32 {
        0
    }

    /// Validate adapter-specific required parameters
    fn validate(&self, config: &FileConfig) -> Result<()>;

    /// Construct a reader for a validated configuration
    fn create_reader(&self, config: &FileConfig) -> Result<Box<dyn RecordReader>>;
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable-after-construction adapter lookup, shared across partitions
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    index: HashMap<String, usize>,
}

impl AdapterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Create a registry with the built-in adapters registered
    pub fn with_builtin_adapters() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SqlAdapter));
        registry.register(Arc::new(RestAdapter));
        registry.register(Arc::new(FlatFileAdapter));
        registry.register(Arc::new(ExcelAdapter));
        registry
    }

    /// Register an adapter, probing the format catalog and resolving token
    /// conflicts by priority.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        let position = self.adapters.len();
        for token in FORMAT_CATALOG {
            if !adapter.supports(token) {
                continue;
            }
            match self.index.get(*token) {
                Some(&existing) if self.adapters[existing].priority() >= adapter.priority() => {
                    tracing::debug!(
                        format = token,
                        kept = self.adapters[existing].name(),
                        rejected = adapter.name(),
                        "format token already claimed by higher priority"
                    );
                }
                _ => {
                    self.index.insert((*token).to_string(), position);
                }
            }
        }
        self.adapters.push(adapter);
    }

    /// Look up the adapter for a format token (case-insensitive)
    pub fn get_adapter(&self, format: &str) -> Result<&dyn SourceAdapter> {
        self.index
            .get(&format.to_ascii_lowercase())
            .map(|&position| self.adapters[position].as_ref())
            .ok_or_else(|| Error::NoAdapterFound {
                format: format.to_string(),
                supported: self.supported_formats().join(", "),
            })
    }

    /// All format tokens with a registered adapter, sorted
    pub fn supported_formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self.index.keys().cloned().collect();
        formats.sort();
        formats
    }

    /// Resolve the adapter for a file entry, validate the configuration
    /// against it, and construct a reader.
    pub fn create_reader(&self, config: &FileConfig) -> Result<Box<dyn RecordReader>> {
        let format = config.format()?;
        let adapter = self.get_adapter(format)?;
        adapter.validate(config).map_err(|e| Error::AdapterValidation {
            format: format.to_string(),
            source: Box::new(e),
        })?;
        tracing::debug!(format = format, adapter = adapter.name(), "reader created");
        adapter.create_reader(config)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtin_adapters()
    }
}

// ============================================================================
// Built-in Adapters
// ============================================================================

/// Embedded-database sources (jdbc/database/sql)
pub struct SqlAdapter;

impl SourceAdapter for SqlAdapter {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn supports(&self, format: &str) -> bool {
        matches!(
            format.to_ascii_lowercase().as_str(),
            "jdbc" | "database" | "sql"
        )
    }

    fn validate(&self, config: &FileConfig) -> Result<()> {
        SqlReader::new(config).map(drop)
    }

    fn create_reader(&self, config: &FileConfig) -> Result<Box<dyn RecordReader>> {
        Ok(Box::new(SqlReader::new(config)?))
    }
}

/// HTTP endpoint sources (rest/api/http/https)
pub struct RestAdapter;

impl SourceAdapter for RestAdapter {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn supports(&self, format: &str) -> bool {
        matches!(
            format.to_ascii_lowercase().as_str(),
            "rest" | "api" | "http" | "https"
        )
    }

    fn validate(&self, config: &FileConfig) -> Result<()> {
        RestReader::new(config).map(drop)
    }

    fn create_reader(&self, config: &FileConfig) -> Result<Box<dyn RecordReader>> {
        Ok(Box::new(RestReader::new(config)?))
    }
}

/// Line-oriented file sources (csv/delimited/fixed)
pub struct FlatFileAdapter;

impl SourceAdapter for FlatFileAdapter {
    fn name(&self) -> &'static str {
        "flat-file"
    }

    fn supports(&self, format: &str) -> bool {
        matches!(
            format.to_ascii_lowercase().as_str(),
            "csv" | "delimited" | "fixed"
        )
    }

    fn validate(&self, config: &FileConfig) -> Result<()> {
        self.create_reader(config).map(drop)
    }

    fn create_reader(&self, config: &FileConfig) -> Result<Box<dyn RecordReader>> {
        let format = config.format()?.to_ascii_lowercase();
        if format == "fixed" {
            Ok(Box::new(FixedWidthReader::new(config)?))
        } else {
            Ok(Box::new(DelimitedReader::new(config)?))
        }
    }
}

/// Workbook sources (excel)
pub struct ExcelAdapter;

impl SourceAdapter for ExcelAdapter {
    fn name(&self) -> &'static str {
        "excel"
    }

    fn supports(&self, format: &str) -> bool {
        format.eq_ignore_ascii_case("excel")
    }

    fn validate(&self, config: &FileConfig) -> Result<()> {
        ExcelReader::new(config).map(drop)
    }

    fn create_reader(&self, config: &FileConfig) -> Result<Box<dyn RecordReader>> {
        Ok(Box::new(ExcelReader::new(config)?))
    }
}

#[cfg(test)]
mod tests;
