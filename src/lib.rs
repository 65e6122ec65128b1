//! # recast
//!
//! A configurable batch ETL engine: reads records from heterogeneous
//! sources (tables, REST endpoints, flat files, spreadsheets), applies a
//! declarative per-field transformation rule set, and emits fixed-width or
//! delimited output records, processing independent partitions in parallel
//! with bounded retry/skip fault tolerance.
//!
//! ## Pipeline
//!
//! The [`partition::Partitioner`] expands a job's file list into
//! independent units. For each unit the [`coordinator::ExecutionCoordinator`]
//! builds a reader from the [`adapter::AdapterRegistry`], a
//! [`processor::RecordProcessor`] over the unit's mapping document, and a
//! [`writer::FlatFileWriter`], then drives them in commit-sized chunks.
//! Field values are produced by the [`transform::TransformEngine`] from
//! declarative rules in the [`mapping`] model.
//!
//! ## Example
//!
//! ```no_run
//! use recast::adapter::AdapterRegistry;
//! use recast::coordinator::ExecutionCoordinator;
//! use recast::mapping::MappingCache;
//! use recast::partition::load_job_config;
//! use std::sync::Arc;
//!
//! # async fn example() -> recast::Result<()> {
//! let job = load_job_config("jobs/delinq-extract.yml")?;
//! let registry = Arc::new(AdapterRegistry::with_builtin_adapters());
//! let cache = Arc::new(MappingCache::new("jobs"));
//!
//! let summary = ExecutionCoordinator::new(registry, cache)
//!     .with_grid_size(4)
//!     .with_skip_limit(10)
//!     .run_job(&job)
//!     .await?;
//! assert!(summary.is_success());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod cli;
pub mod coordinator;
pub mod error;
pub mod format;
pub mod mapping;
pub mod partition;
pub mod processor;
pub mod reader;
pub mod transform;
pub mod types;
pub mod writer;

pub use error::{Error, Result};
pub use types::{JsonValue, OrderedRecord, Record};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
