//! HTTP webhook sink.

use std::time::Duration;

use thiserror::Error;

use crate::payload::OrderNotification;
use crate::sink::NotificationSink;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Endpoint configuration for the webhook sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSinkConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl HttpSinkConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read `DUKKAN_WEBHOOK_URL` (+ optional `DUKKAN_WEBHOOK_TIMEOUT_SECS`).
    ///
    /// Returns `None` when no endpoint is configured, in which case the
    /// caller should wire a no-op or in-memory sink instead.
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("DUKKAN_WEBHOOK_URL").ok()?;
        if endpoint.trim().is_empty() {
            return None;
        }

        let timeout = std::env::var("DUKKAN_WEBHOOK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Some(Self { endpoint, timeout })
    }
}

#[derive(Debug, Error)]
pub enum HttpSinkError {
    #[error("failed to construct http client: {0}")]
    Build(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("endpoint returned status {0}")]
    Status(u16),
}

/// Fire-and-forget webhook delivery: one JSON POST per order, response body
/// ignored, non-2xx treated as failure.
#[derive(Debug)]
pub struct HttpSink {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(config: HttpSinkConfig) -> Result<Self, HttpSinkError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| HttpSinkError::Build(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl NotificationSink for HttpSink {
    type Error = HttpSinkError;

    fn deliver(&self, notification: &OrderNotification) -> Result<(), Self::Error> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(notification)
            .send()
            .map_err(|e| HttpSinkError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpSinkError::Status(status.as_u16()));
        }

        Ok(())
    }
}
