use crate::config;
use crate::error::{AppError, AppResult};
use crate::logging::{log, LogLevel};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT_VAL: &str = concat!("catalog_harvest/", env!("CARGO_PKG_VERSION"));

/// Plain GET-and-decode transport. A failed request is reported once and never retried.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new() -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VAL));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config::HTTP_TIMEOUT_SECONDS))
            .connect_timeout(Duration::from_secs(config::HTTP_CONNECT_TIMEOUT))
            .build()
            .map_err(|e| AppError::ConfigError(format!("HTTP client: {}", e)))?;
        Ok(ApiClient { client })
    }

    pub async fn fetch_json(&self, url: &str) -> AppResult<Value> {
        let bytes = self.fetch_bytes(url).await?;

        serde_json::from_slice(&bytes).map_err(|e| {
            let snippet_len = bytes.len().min(200);
            let snippet = String::from_utf8_lossy(&bytes[..snippet_len]);
            log(
                LogLevel::Warning,
                &format!("Fail parse JSON from {}: {}. Snippet: '{}'", url, e, snippet),
            );
            AppError::decode(url, e.to_string())
        })
    }

    async fn fetch_bytes(&self, url: &str) -> AppResult<Bytes> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            let context_str = if e.is_timeout() {
                "Timeout"
            } else if e.is_connect() {
                "Connection"
            } else {
                "Request"
            };
            AppError::transport(url, format!("{} error: {}", context_str, e))
        })?;

        let status = resp.status();
        if !status.is_success() {
            let resp_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(AppError::transport(
                url,
                format!(
                    "HTTP {} ({}). Body: {}...",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown Status"),
                    resp_text.chars().take(150).collect::<String>()
                ),
            ));
        }

        resp.bytes()
            .await
            .map_err(|e| AppError::transport(url, format!("Error reading body: {}", e)))
    }
}
