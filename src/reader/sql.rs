//! SQL source reader
//!
//! Reads from an embedded database file over a forward-only page loop.
//! A custom `query` parameter runs verbatim; otherwise the reader builds an
//! offset-paging query over `target` with an optional batch-date predicate
//! and a configurable sort key.

use super::{ReadContext, RecordReader};
use crate::error::{Error, Result};
use crate::partition::FileConfig;
use crate::types::{JsonValue, Record};
use async_trait::async_trait;
use std::collections::VecDeque;

const DEFAULT_SORT_KEY: &str = "ACCT_NUM";
const DEFAULT_PAGE_SIZE: usize = 1000;

/// Reader over the jdbc/database/sql format family
pub struct SqlReader {
    connection_path: Option<String>,
    target: Option<String>,
    custom_query: Option<String>,
    sort_key: String,
    page_size: usize,
    batch_date: Option<(String, String)>,

    conn: Option<duckdb::Connection>,
    buffer: VecDeque<Record>,
    offset: usize,
    exhausted: bool,
    records_read: u64,
}

impl SqlReader {
    /// Build a reader from file configuration, validating pagination
    /// parameters eagerly.
    pub fn new(config: &FileConfig) -> Result<Self> {
        let custom_query = config.param("query").map(str::to_string);
        let target = config.target.clone();
        if custom_query.is_none() {
            let name = target
                .as_deref()
                .ok_or_else(|| Error::missing_parameter("jdbc", "target"))?;
            validate_identifier("target", name)?;
        }

        let sort_key = config
            .param("sortKey")
            .unwrap_or(DEFAULT_SORT_KEY)
            .to_string();
        validate_identifier("sortKey", &sort_key)?;

        // fetchSize is accepted for parity with driver-level tuning but the
        // page size is what bounds each round trip.
        if let Some(raw) = config.param("fetchSize") {
            parse_positive("fetchSize", raw)?;
        }
        let page_size = match config.param("pageSize") {
            Some(raw) => parse_positive("pageSize", raw)?,
            None => DEFAULT_PAGE_SIZE,
        };

        let batch_date = match (config.param("batchDateParam"), config.param("batchDateValue")) {
            (Some(column), Some(value)) => {
                validate_identifier("batchDateParam", column)?;
                Some((column.to_string(), value.to_string()))
            }
            _ => None,
        };

        Ok(Self {
            connection_path: config.param("connection").map(str::to_string),
            target,
            custom_query,
            sort_key,
            page_size,
            batch_date,
            conn: None,
            buffer: VecDeque::new(),
            offset: 0,
            exhausted: false,
            records_read: 0,
        })
    }

    fn paging_query(&self) -> String {
        // target presence is validated in new().
        let target = self.target.as_deref().unwrap_or_default();
        let mut sql = format!("SELECT * FROM {target}");
        if let Some((column, value)) = &self.batch_date {
            let escaped = value.replace('\'', "''");
            sql.push_str(&format!(" WHERE {column} = '{escaped}'"));
        }
        sql.push_str(&format!(
            " ORDER BY {} LIMIT {} OFFSET {}",
            self.sort_key, self.page_size, self.offset
        ));
        sql
    }

    fn fetch(&mut self, sql: &str) -> Result<usize> {
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| Error::source_read("reader not opened"))?;

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| Error::database(format!("prepare failed: {e}")))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| Error::database(format!("query failed: {e}")))?;

        let mut fetched = 0;
        while let Some(row) = rows
            .next()
            .map_err(|e| Error::database(format!("row fetch failed: {e}")))?
        {
            let stmt = row.as_ref();
            let mut record = Record::new();
            for index in 0..stmt.column_count() {
                let name = stmt
                    .column_name(index)
                    .map_err(|e| Error::database(format!("column name: {e}")))?
                    .to_string();
                let value: duckdb::types::Value = row
                    .get(index)
                    .map_err(|e| Error::database(format!("column read: {e}")))?;
                record.insert(name, sql_value_to_json(value));
            }
            self.buffer.push_back(record);
            fetched += 1;
        }
        Ok(fetched)
    }

    fn fill_buffer(&mut self) -> Result<()> {
        if self.exhausted || !self.buffer.is_empty() {
            return Ok(());
        }
        if let Some(query) = self.custom_query.clone() {
            // Custom queries run once, forward-only.
            self.fetch(&query)?;
            self.exhausted = true;
            return Ok(());
        }
        let sql = self.paging_query();
        let fetched = self.fetch(&sql)?;
        self.offset += fetched;
        if fetched < self.page_size {
            self.exhausted = true;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordReader for SqlReader {
    async fn open(&mut self, _ctx: &ReadContext) -> Result<()> {
        let conn = match self.connection_path.as_deref() {
            Some(path) => duckdb::Connection::open(path)
                .map_err(|e| Error::source_open(format!("cannot open database '{path}': {e}")))?,
            None => duckdb::Connection::open_in_memory()
                .map_err(|e| Error::source_open(format!("cannot open database: {e}")))?,
        };
        self.conn = Some(conn);
        tracing::debug!(
            target = self.target.as_deref().unwrap_or("<custom query>"),
            page_size = self.page_size,
            "sql source opened"
        );
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<Record>> {
        self.fill_buffer()?;
        let record = self.buffer.pop_front();
        if record.is_some() {
            self.records_read += 1;
        }
        Ok(record)
    }

    fn update(&self, ctx: &mut ReadContext) {
        ctx.records_read = self.records_read;
    }

    async fn close(&mut self) -> Result<()> {
        self.conn = None;
        Ok(())
    }
}

/// Convert one database cell into a JSON record value
fn sql_value_to_json(value: duckdb::types::Value) -> JsonValue {
    use duckdb::types::Value;
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(n) => JsonValue::from(n),
        Value::SmallInt(n) => JsonValue::from(n),
        Value::Int(n) => JsonValue::from(n),
        Value::BigInt(n) => JsonValue::from(n),
        Value::UTinyInt(n) => JsonValue::from(n),
        Value::USmallInt(n) => JsonValue::from(n),
        Value::UInt(n) => JsonValue::from(n),
        Value::UBigInt(n) => JsonValue::from(n),
        Value::Float(n) => JsonValue::from(f64::from(n)),
        Value::Double(n) => JsonValue::from(n),
        Value::Decimal(d) => JsonValue::String(d.to_string()),
        Value::Text(s) => JsonValue::String(s),
        other => {
            tracing::debug!(?other, "unsupported column type stringified");
            JsonValue::String(format!("{other:?}"))
        }
    }
}

/// Identifiers are interpolated into SQL text; restrict them to plain
/// table/column characters.
fn validate_identifier(param: &str, value: &str) -> Result<()> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if ok {
        Ok(())
    } else {
        Err(Error::invalid_parameter(
            param,
            format!("'{value}' is not a valid identifier"),
        ))
    }
}

fn parse_positive(param: &str, raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::invalid_parameter(
            param,
            format!("'{raw}' must be a positive integer"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(params: &[(&str, &str)]) -> FileConfig {
        FileConfig {
            target: Some("ACCOUNTS".to_string()),
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..FileConfig::default()
        }
    }

    #[test]
    fn test_rejects_non_positive_page_sizes() {
        let err = SqlReader::new(&config_with(&[("pageSize", "0")]))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));

        let err = SqlReader::new(&config_with(&[("fetchSize", "ten")]))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_requires_target_without_custom_query() {
        let config = FileConfig::default();
        assert!(matches!(
            SqlReader::new(&config).map(|_| ()).unwrap_err(),
            Error::MissingParameter { .. }
        ));
    }

    #[test]
    fn test_paging_query_shape() {
        let reader = SqlReader::new(&config_with(&[
            ("pageSize", "50"),
            ("batchDateParam", "BATCH_DT"),
            ("batchDateValue", "2026-08-23"),
        ]))
        .unwrap();
        assert_eq!(
            reader.paging_query(),
            "SELECT * FROM ACCOUNTS WHERE BATCH_DT = '2026-08-23' \
             ORDER BY ACCT_NUM LIMIT 50 OFFSET 0"
        );
    }

    #[test]
    fn test_rejects_hostile_identifiers() {
        let err = SqlReader::new(&config_with(&[("sortKey", "a; DROP TABLE x")]))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }
}
