//! Error types for recast
//!
//! This module defines the error hierarchy for the whole engine.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for recast
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required parameter '{param}' for format '{format}'")]
    MissingParameter { format: String, param: String },

    #[error("Invalid value for parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Mapping Errors
    // ============================================================================
    #[error("Mapping document not found: {template}")]
    MappingNotFound { template: String },

    #[error("Invalid mapping document '{template}': {message}")]
    InvalidMapping { template: String, message: String },

    #[error("Invalid picture format '{picture}': {message}")]
    InvalidPicture { picture: String, message: String },

    // ============================================================================
    // Adapter / Reader Errors
    // ============================================================================
    #[error("No adapter found for format '{format}'. Supported formats: {supported}")]
    NoAdapterFound { format: String, supported: String },

    #[error("Adapter '{format}' rejected configuration: {source}")]
    AdapterValidation {
        format: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to open source: {message}")]
    SourceOpen { message: String },

    #[error("Source read failed: {message}")]
    SourceRead { message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Database error: {message}")]
    Database { message: String },

    // ============================================================================
    // Transformation Errors
    // ============================================================================
    #[error("Transformation failed for field '{field}': {message}")]
    Transform { field: String, message: String },

    #[error("Expression parse error: {message}")]
    Expression { message: String },

    // ============================================================================
    // Partition / Execution Errors
    // ============================================================================
    #[error("Partitioning failed: {message}")]
    Partition { message: String },

    #[error("Partition '{partition}' failed: {message}")]
    PartitionFailed { partition: String, message: String },

    #[error("Record processing failed: {message}")]
    RecordProcessing { message: String },

    #[error("Skip limit ({limit}) exceeded")]
    SkipLimitExceeded { limit: usize },

    // ============================================================================
    // Writer / I/O Errors
    // ============================================================================
    #[error("Output error: {message}")]
    Output { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing-parameter error
    pub fn missing_parameter(format: impl Into<String>, param: impl Into<String>) -> Self {
        Self::MissingParameter {
            format: format.into(),
            param: param.into(),
        }
    }

    /// Create an invalid-parameter error
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-mapping error
    pub fn invalid_mapping(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMapping {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create a source-open error
    pub fn source_open(message: impl Into<String>) -> Self {
        Self::SourceOpen {
            message: message.into(),
        }
    }

    /// Create a source-read error
    pub fn source_read(message: impl Into<String>) -> Self {
        Self::SourceRead {
            message: message.into(),
        }
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a transformation error
    pub fn transform(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an expression parse error
    pub fn expression(message: impl Into<String>) -> Self {
        Self::Expression {
            message: message.into(),
        }
    }

    /// Create a partitioning error
    pub fn partition(message: impl Into<String>) -> Self {
        Self::Partition {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Check if this error is a transient condition worth retrying.
    ///
    /// Configuration and mapping errors are deterministic and never retried;
    /// network and I/O failures may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) | Error::Io(_) | Error::SourceRead { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for recast
pub type Result<T> = std::result::Result<T, Error>;
