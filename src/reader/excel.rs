//! Excel source reader
//!
//! Loads the first worksheet at open time. The first row supplies column
//! names; each following row becomes one record with cell-type coercion
//! (numbers stay numeric, booleans stay boolean).

use super::{ReadContext, RecordReader};
use crate::error::{Error, Result};
use crate::partition::FileConfig;
use crate::types::{JsonValue, Record};
use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::VecDeque;

/// Reader for `.xlsx`/`.xls` workbooks
pub struct ExcelReader {
    path: String,
    rows: VecDeque<Record>,
    records_read: u64,
}

impl ExcelReader {
    /// Build a reader from file configuration
    pub fn new(config: &FileConfig) -> Result<Self> {
        let path = config
            .input_path
            .clone()
            .ok_or_else(|| Error::missing_parameter("excel", "inputPath"))?;
        Ok(Self {
            path,
            rows: VecDeque::new(),
            records_read: 0,
        })
    }
}

#[async_trait]
impl RecordReader for ExcelReader {
    async fn open(&mut self, _ctx: &ReadContext) -> Result<()> {
        let path = self.path.clone();
        let mut workbook = open_workbook_auto(&path)
            .map_err(|e| Error::source_open(format!("cannot open workbook '{path}': {e}")))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::source_open(format!("workbook '{path}' has no sheets")))?
            .map_err(|e| Error::source_open(format!("cannot read sheet in '{path}': {e}")))?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Ok(());
        };
        let headers: Vec<String> = header_row.iter().map(cell_to_header).collect();

        for row in rows {
            let mut record = Record::new();
            for (header, cell) in headers.iter().zip(row) {
                if header.is_empty() || matches!(cell, Data::Empty) {
                    continue;
                }
                record.insert(header.clone(), cell_to_json(cell));
            }
            if !record.is_empty() {
                self.rows.push_back(record);
            }
        }
        tracing::debug!(path = %path, records = self.rows.len(), "excel source loaded");
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<Record>> {
        let record = self.rows.pop_front();
        if record.is_some() {
            self.records_read += 1;
        }
        Ok(record)
    }

    fn update(&self, ctx: &mut ReadContext) {
        ctx.records_read = self.records_read;
    }
}

fn cell_to_header(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_to_json(cell: &Data) -> JsonValue {
    match cell {
        Data::String(s) => JsonValue::String(s.clone()),
        Data::Float(f) => JsonValue::from(*f),
        Data::Int(i) => JsonValue::from(*i),
        Data::Bool(b) => JsonValue::Bool(*b),
        Data::Empty => JsonValue::Null,
        other => JsonValue::String(other.to_string()),
    }
}
