//! HTTP client for the E-utilities `esearch` endpoint.
//!
//! Only the match count is requested (`retmax=0`); the JSON response
//! is reduced to a single non-negative integer.

use crate::config::EntrezConfig;
use crate::entrez::EntrezQuery;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failure of a single count query.
#[derive(Debug, Error)]
pub enum EntrezError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("E-utilities returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("E-utilities reported an error: {0}")]
    Service(String),

    #[error("malformed esearch response: {0}")]
    Malformed(String),
}

/// Anything that can answer "how many entries match this query".
#[allow(async_fn_in_trait)]
pub trait CountService {
    async fn count(&self, query: &EntrezQuery) -> Result<u64, EntrezError>;
}

/// Count service backed by NCBI E-utilities.
pub struct EntrezClient {
    config: EntrezConfig,
    http_client: reqwest::Client,
}

impl EntrezClient {
    pub fn new(config: EntrezConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(format!("{}/{}", config.tool, env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn esearch_url(&self) -> String {
        format!("{}/esearch.fcgi", self.config.base_url.trim_end_matches('/'))
    }

    fn query_params<'a>(&'a self, query: &'a EntrezQuery) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("db", query.db.as_str()),
            ("term", query.expression.as_str()),
            ("retmax", "0"),
            ("retmode", "json"),
            ("tool", self.config.tool.as_str()),
        ];
        if !self.config.email.is_empty() {
            params.push(("email", self.config.email.as_str()));
        }
        params
    }
}

impl CountService for EntrezClient {
    async fn count(&self, query: &EntrezQuery) -> Result<u64, EntrezError> {
        debug!("esearch {}", query);

        let response = self
            .http_client
            .get(self.esearch_url())
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EntrezError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    EntrezError::Connect(self.config.base_url.clone())
                } else {
                    EntrezError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EntrezError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_count(&body)
    }
}

/// Extract the match count from an `esearch` JSON body.
pub fn parse_count(body: &str) -> Result<u64, EntrezError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| EntrezError::Malformed(e.to_string()))?;

    // Rate limiting and bad parameters come back as a top-level "error".
    if let Some(message) = json.get("error").and_then(Value::as_str) {
        return Err(EntrezError::Service(message.to_string()));
    }

    let result = json
        .get("esearchresult")
        .ok_or_else(|| EntrezError::Malformed("missing esearchresult".to_string()))?;

    if let Some(message) = result.get("ERROR").and_then(Value::as_str) {
        return Err(EntrezError::Service(message.to_string()));
    }

    match result.get("count") {
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| EntrezError::Malformed(format!("count is not a number: {s:?}"))),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| EntrezError::Malformed(format!("count is not a non-negative integer: {n}"))),
        Some(other) => Err(EntrezError::Malformed(format!(
            "unexpected count value: {other}"
        ))),
        None => Err(EntrezError::Malformed("missing count".to_string())),
    }
}
