//! HTTP client for the service desk backend.
//!
//! Every endpoint is a POST with a JSON body (or a multipart form for file
//! uploads) relative to the configured base URL.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;

use super::{ApiResponse, TransportError};
use crate::config::SdkConfig;

/// HTTP client wrapper for service desk API communication.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client with the given base URL and timeouts.
    pub fn new(base_url: &str, connect_timeout: Duration, request_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &SdkConfig) -> Self {
        Self::new(&config.base_url, config.connect_timeout, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body to a relative API path.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.url(path);
        log::debug!("POST {}", url);
        let resp = self.client.post(&url).json(body).send().await?;
        Ok(into_api_response(resp).await)
    }

    /// POST a multipart form to a relative API path (used for file uploads).
    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.url(path);
        log::debug!("POST (multipart) {}", url);
        let resp = self.client.post(&url).multipart(form).send().await?;
        Ok(into_api_response(resp).await)
    }
}

/// Capture status and body. A body that cannot be read counts as absent.
async fn into_api_response(resp: Response) -> ApiResponse {
    let status = resp.status();
    let message = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string());
    let body = match resp.text().await {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => None,
        Err(e) => {
            log::warn!("Failed to read response body ({}): {}", status, e);
            None
        }
    };
    ApiResponse {
        status: status.as_u16(),
        message,
        body,
    }
}
