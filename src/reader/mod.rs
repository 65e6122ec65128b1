//! Streaming record readers
//!
//! Format-specific sources behind one open/read/update/close contract. A
//! reader is owned by exactly one partition; no reader instance is shared.

mod excel;
mod file;
mod rest;
mod sql;

pub use excel::ExcelReader;
pub use file::{DelimitedReader, FixedWidthReader};
pub use rest::RestReader;
pub use sql::SqlReader;

use crate::error::Result;
use crate::types::Record;
use async_trait::async_trait;

/// Per-stream checkpoint state, updated by the reader and owned by the
/// partition's execution context.
#[derive(Debug, Clone, Default)]
pub struct ReadContext {
    /// Records handed out so far
    pub records_read: u64,
}

/// A streaming record source.
///
/// `read` returns `Ok(None)` on normal exhaustion; readers never error on
/// EOF. `open` performs all connection and validation work so read-time
/// failures are genuine I/O conditions.
#[async_trait]
pub trait RecordReader: Send {
    /// Open the source and prepare for reading
    async fn open(&mut self, ctx: &ReadContext) -> Result<()>;

    /// Produce the next record, or `None` when exhausted
    async fn read(&mut self) -> Result<Option<Record>>;

    /// Write checkpoint state back into the context
    fn update(&self, _ctx: &mut ReadContext) {}

    /// Release resources
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests;
