//! Flat-file output writer
//!
//! Serializes chunks of ordered records to one output file per partition.
//! Fixed-width concatenation by default; delimited lines when the file
//! entry carries an `outputDelimiter` parameter. Append is disabled: each
//! partition owns a fresh file.

use crate::error::{Error, Result};
use crate::partition::FileConfig;
use crate::types::OrderedRecord;
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writer for fixed-width and delimited flat files
pub struct FlatFileWriter {
    output_path: PathBuf,
    delimiter: Option<String>,
    file: Option<BufWriter<File>>,
    records_written: u64,
}

impl FlatFileWriter {
    /// Build a writer from file configuration, resolving `${DATE}` and
    /// `${TIMESTAMP}` placeholders in the output path.
    pub fn new(config: &FileConfig) -> Result<Self> {
        let raw = config
            .param("outputPath")
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::config("file entry is missing the 'outputPath' parameter"))?;

        Ok(Self {
            output_path: PathBuf::from(resolve_placeholders(raw)),
            delimiter: config.param("outputDelimiter").map(str::to_string),
            file: None,
            records_written: 0,
        })
    }

    /// The resolved output path
    pub fn path(&self) -> &Path {
        &self.output_path
    }

    /// Create the output file, refusing to clobber an existing one
    pub fn open(&mut self) -> Result<()> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create_new(&self.output_path).map_err(|e| {
            Error::output(format!(
                "cannot create output '{}': {e}",
                self.output_path.display()
            ))
        })?;
        self.file = Some(BufWriter::new(file));
        tracing::debug!(path = %self.output_path.display(), "output file created");
        Ok(())
    }

    /// Serialize one chunk of records, one line each, in field order
    pub fn write_chunk(&mut self, chunk: &[OrderedRecord]) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| Error::output("writer not opened"))?;
        for record in chunk {
            let line = match &self.delimiter {
                Some(delimiter) => record.values().collect::<Vec<_>>().join(delimiter),
                None => record.values().collect::<String>(),
            };
            writeln!(file, "{line}")?;
        }
        self.records_written += chunk.len() as u64;
        Ok(())
    }

    /// Records written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flush and release the output file
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Substitute `${DATE}` and `${TIMESTAMP}` with the current local time
fn resolve_placeholders(path: &str) -> String {
    let now = Local::now();
    path.replace("${DATE}", &now.format("%Y%m%d").to_string())
        .replace("${TIMESTAMP}", &now.format("%Y%m%d%H%M%S").to_string())
}
