//! REST source reader
//!
//! Fetches the endpoint once at open time and iterates the response in
//! memory. A JSON array becomes one record per element; a single JSON
//! object becomes a one-element stream.

use super::{ReadContext, RecordReader};
use crate::error::{Error, Result};
use crate::partition::FileConfig;
use crate::types::{JsonValue, Record};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Reader over the rest/api/http/https format family
pub struct RestReader {
    url: url::Url,
    auth_token: Option<String>,
    timeout: Duration,
    buffer: VecDeque<Record>,
    records_read: u64,
}

impl RestReader {
    /// Build a reader from file configuration, validating the endpoint URL
    /// eagerly.
    pub fn new(config: &FileConfig) -> Result<Self> {
        let base_url = config.require_param("rest", "baseUrl")?;
        let endpoint = config.require_param("rest", "endpoint")?;

        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        let url = url::Url::parse(&joined)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_parameter(
                "baseUrl",
                format!("'{joined}' must start with http:// or https://"),
            ));
        }

        let timeout = match config.param("timeout") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    Error::invalid_parameter("timeout", format!("'{raw}' must be seconds"))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            url,
            auth_token: config.param("authToken").map(str::to_string),
            timeout,
            buffer: VecDeque::new(),
            records_read: 0,
        })
    }

    fn buffer_response(&mut self, body: JsonValue) -> Result<()> {
        let elements = match body {
            JsonValue::Array(items) => items,
            object @ JsonValue::Object(_) => vec![object],
            other => {
                return Err(Error::source_read(format!(
                    "expected JSON array or object, got {other}"
                )))
            }
        };
        for element in elements {
            match element {
                JsonValue::Object(record) => self.buffer.push_back(record),
                other => {
                    return Err(Error::source_read(format!(
                        "expected JSON object element, got {other}"
                    )))
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordReader for RestReader {
    async fn open(&mut self, _ctx: &ReadContext) -> Result<()> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        let mut request = client.get(self.url.clone());
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body: JsonValue = response.json().await?;
        self.buffer_response(body)?;
        tracing::debug!(url = %self.url, records = self.buffer.len(), "rest source fetched");
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<Record>> {
        let record = self.buffer.pop_front();
        if record.is_some() {
            self.records_read += 1;
        }
        Ok(record)
    }

    fn update(&self, ctx: &mut ReadContext) {
        ctx.records_read = self.records_read;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(params: &[(&str, &str)]) -> FileConfig {
        FileConfig {
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..FileConfig::default()
        }
    }

    #[test]
    fn test_requires_base_url_and_endpoint() {
        let err = RestReader::new(&config_with(&[("endpoint", "/accounts")]))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter { .. }));

        let err = RestReader::new(&config_with(&[("baseUrl", "http://api.example.com")]))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter { .. }));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = RestReader::new(&config_with(&[
            ("baseUrl", "ftp://api.example.com"),
            ("endpoint", "/accounts"),
        ]))
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_joins_base_and_endpoint() {
        let reader = RestReader::new(&config_with(&[
            ("baseUrl", "http://api.example.com/"),
            ("endpoint", "accounts"),
        ]))
        .unwrap();
        assert_eq!(reader.url.as_str(), "http://api.example.com/accounts");
    }

    #[test]
    fn test_single_object_normalized_to_one_element() {
        let mut reader = RestReader::new(&config_with(&[
            ("baseUrl", "http://api.example.com"),
            ("endpoint", "/one"),
        ]))
        .unwrap();
        reader
            .buffer_response(serde_json::json!({"ACCT_NUM": "1"}))
            .unwrap();
        assert_eq!(reader.buffer.len(), 1);
    }
}
