//! Flat-file readers
//!
//! Line-oriented sources: delimiter-tokenized and fixed-width column-range
//! layouts, both producing string-keyed records from a configured column
//! name list.

use super::{ReadContext, RecordReader};
use crate::error::{Error, Result};
use crate::partition::FileConfig;
use crate::types::{JsonValue, Record};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};

type LineSource = Lines<BufReader<File>>;

fn parse_column_names(config: &FileConfig, format: &str) -> Result<Vec<String>> {
    let raw = config.require_param(format, "columnNames")?;
    let names: Vec<String> = raw
        .split(',')
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return Err(Error::invalid_parameter(
            "columnNames",
            "no column names configured",
        ));
    }
    Ok(names)
}

fn open_lines(path: &str) -> Result<LineSource> {
    let file = File::open(path)
        .map_err(|e| Error::source_open(format!("cannot open input '{path}': {e}")))?;
    Ok(BufReader::new(file).lines())
}

fn next_line(lines: &mut Option<LineSource>) -> Result<Option<String>> {
    let lines = lines
        .as_mut()
        .ok_or_else(|| Error::source_read("reader not opened"))?;
    loop {
        match lines.next() {
            Some(Ok(line)) if line.trim().is_empty() => continue,
            Some(Ok(line)) => return Ok(Some(line)),
            Some(Err(e)) => return Err(Error::source_read(format!("line read failed: {e}"))),
            None => return Ok(None),
        }
    }
}

// ============================================================================
// Delimited
// ============================================================================

/// Reader for delimiter-separated files (csv/delimited formats)
pub struct DelimitedReader {
    path: String,
    delimiter: char,
    column_names: Vec<String>,
    lines: Option<LineSource>,
    records_read: u64,
}

impl DelimitedReader {
    /// Build a reader from file configuration
    pub fn new(config: &FileConfig) -> Result<Self> {
        let path = config
            .input_path
            .clone()
            .ok_or_else(|| Error::missing_parameter("delimited", "inputPath"))?;
        let delimiter = match config.param("delimiter") {
            Some(d) if d.chars().count() == 1 => d.chars().next().unwrap_or(','),
            Some(d) => {
                return Err(Error::invalid_parameter(
                    "delimiter",
                    format!("'{d}' must be a single character"),
                ))
            }
            None => ',',
        };
        Ok(Self {
            path,
            delimiter,
            column_names: parse_column_names(config, "delimited")?,
            lines: None,
            records_read: 0,
        })
    }

    fn tokenize(&self, line: &str) -> Vec<String> {
        // Double quotes group fields containing the delimiter; a doubled
        // quote inside a quoted field is a literal quote.
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '"' if in_quotes && chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = !in_quotes,
                c if c == self.delimiter && !in_quotes => {
                    tokens.push(std::mem::take(&mut current));
                }
                c => current.push(c),
            }
        }
        tokens.push(current);
        tokens
    }
}

#[async_trait]
impl RecordReader for DelimitedReader {
    async fn open(&mut self, _ctx: &ReadContext) -> Result<()> {
        self.lines = Some(open_lines(&self.path)?);
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<Record>> {
        let Some(line) = next_line(&mut self.lines)? else {
            return Ok(None);
        };
        let tokens = self.tokenize(&line);
        let record: Record = self
            .column_names
            .iter()
            .zip(tokens)
            .map(|(name, token)| (name.clone(), JsonValue::String(token)))
            .collect();
        self.records_read += 1;
        Ok(Some(record))
    }

    fn update(&self, ctx: &mut ReadContext) {
        ctx.records_read = self.records_read;
    }

    async fn close(&mut self) -> Result<()> {
        self.lines = None;
        Ok(())
    }
}

// ============================================================================
// Fixed-width
// ============================================================================

/// Reader for fixed-width files sliced by 1-based inclusive column ranges
pub struct FixedWidthReader {
    path: String,
    ranges: Vec<(usize, usize)>,
    column_names: Vec<String>,
    lines: Option<LineSource>,
    records_read: u64,
}

impl FixedWidthReader {
    /// Build a reader from file configuration.
    ///
    /// `columnRanges` is a comma-separated list of `start-end` pairs, one
    /// per configured column name.
    pub fn new(config: &FileConfig) -> Result<Self> {
        let path = config
            .input_path
            .clone()
            .ok_or_else(|| Error::missing_parameter("fixed", "inputPath"))?;
        let column_names = parse_column_names(config, "fixed")?;

        let raw_ranges = config.require_param("fixed", "columnRanges")?;
        let ranges = parse_ranges(raw_ranges)?;
        if ranges.len() != column_names.len() {
            return Err(Error::invalid_parameter(
                "columnRanges",
                format!(
                    "{} ranges configured for {} column names",
                    ranges.len(),
                    column_names.len()
                ),
            ));
        }

        Ok(Self {
            path,
            ranges,
            column_names,
            lines: None,
            records_read: 0,
        })
    }

    fn slice(&self, line: &str, start: usize, end: usize) -> String {
        line.chars()
            .skip(start - 1)
            .take(end - start + 1)
            .collect::<String>()
            .trim()
            .to_string()
    }
}

fn parse_ranges(raw: &str) -> Result<Vec<(usize, usize)>> {
    raw.split(',')
        .map(|pair| {
            let pair = pair.trim();
            let (start, end) = pair.split_once('-').ok_or_else(|| {
                Error::invalid_parameter("columnRanges", format!("'{pair}' is not start-end"))
            })?;
            let start: usize = start.trim().parse().map_err(|_| {
                Error::invalid_parameter("columnRanges", format!("bad start in '{pair}'"))
            })?;
            let end: usize = end.trim().parse().map_err(|_| {
                Error::invalid_parameter("columnRanges", format!("bad end in '{pair}'"))
            })?;
            if start == 0 || end < start {
                return Err(Error::invalid_parameter(
                    "columnRanges",
                    format!("'{pair}' must satisfy 1 <= start <= end"),
                ));
            }
            Ok((start, end))
        })
        .collect()
}

#[async_trait]
impl RecordReader for FixedWidthReader {
    async fn open(&mut self, _ctx: &ReadContext) -> Result<()> {
        self.lines = Some(open_lines(&self.path)?);
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<Record>> {
        let Some(line) = next_line(&mut self.lines)? else {
            return Ok(None);
        };
        let mut record = Record::new();
        for (name, &(start, end)) in self.column_names.iter().zip(&self.ranges) {
            record.insert(
                name.clone(),
                JsonValue::String(self.slice(&line, start, end)),
            );
        }
        self.records_read += 1;
        Ok(Some(record))
    }

    fn update(&self, ctx: &mut ReadContext) {
        ctx.records_read = self.records_read;
    }

    async fn close(&mut self) -> Result<()> {
        self.lines = None;
        Ok(())
    }
}
