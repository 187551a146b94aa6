// src/transport/http_client.rs
//! HTTP transport to the collector
//!
//! One `reqwest::Client` per transport, so connections are pooled and
//! reused across registration and every batch.

use crate::transport::protocol::{GAMES_PATH, TRACK_PATH};
use crate::transport::Transport;
use crate::utils::config::SdkConfig;
use crate::utils::errors::{Result, TokebiError};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Collector transport over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Create a transport for `base_url`
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            TokebiError::ConfigError(format!("Failed to build HTTP client: {}", e))
        })?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &SdkConfig) -> Result<Self> {
        Self::new(&config.base_url, &config.api_key, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: String) -> std::result::Result<Response, reqwest::Error> {
        let url = self.url(path);
        debug!("POST {} ({} bytes)", url, body.len());

        self.client
            .post(url)
            .header(AUTHORIZATION, self.api_key.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
    }

    async fn register(&self, body: String) -> Result<String> {
        let response = self
            .post(GAMES_PATH, body)
            .await
            .map_err(|e| TokebiError::RegistrationFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TokebiError::RegistrationFailed(format!("Body read error: {}", e)))?;

        if !status.is_success() {
            return Err(TokebiError::RegistrationFailed(format!("HTTP {}: {}", status, text)));
        }
        Ok(text)
    }

    async fn deliver(&self, body: String) -> Result<()> {
        let response = self
            .post(TRACK_PATH, body)
            .await
            .map_err(|e| TokebiError::DeliveryFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TokebiError::DeliveryFailed(format!("HTTP {}", status)));
        }
        Ok(())
    }
}

impl Transport for HttpTransport {
    fn register_game(&self, body: String) -> BoxFuture<'_, Result<String>> {
        self.register(body).boxed()
    }

    fn send_batch(&self, body: String) -> BoxFuture<'_, Result<()>> {
        self.deliver(body).boxed()
    }
}
