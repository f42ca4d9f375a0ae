use crate::error::{AscentError, Result};
use crate::index::{IndexClient, IndexResponse, REQUEST_TIMEOUT};
use reqwest::blocking::Client;
use std::io::Read;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("pip-ascent/", env!("CARGO_PKG_VERSION"));
const MAX_RESPONSE_BYTES: u64 = 32 * 1024 * 1024;

/// Blocking HTTP client for package indexes
pub struct HttpIndexClient {
    client: Client,
    max_response_bytes: u64,
}

impl HttpIndexClient {
    pub fn new() -> Result<Self> {
        Self::with_response_limit(MAX_RESPONSE_BYTES)
    }

    fn with_response_limit(max_response_bytes: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AscentError::Network(e.to_string()))?;

        Ok(Self {
            client,
            max_response_bytes,
        })
    }
}

impl IndexClient for HttpIndexClient {
    fn get(&self, url: &str, timeout: Duration) -> Result<IndexResponse> {
        debug!("Fetching: {}", url);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| {
                debug!("Request failed: {}", e);
                AscentError::Network(e.to_string())
            })?;

        let status = response.status();
        let reason = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_str().to_string());

        if !status.is_success() {
            debug!("HTTP {}: {}", status, url);
            return Ok(IndexResponse {
                status_ok: false,
                reason,
                body: Vec::new(),
            });
        }

        let too_large = || {
            AscentError::Network(format!(
                "response from {url} exceeded the {} byte limit",
                self.max_response_bytes
            ))
        };

        if response
            .content_length()
            .is_some_and(|length| length > self.max_response_bytes)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        response
            .take(self.max_response_bytes + 1)
            .read_to_end(&mut body)
            .map_err(|e| AscentError::Network(e.to_string()))?;

        if body.len() as u64 > self.max_response_bytes {
            return Err(too_large());
        }

        Ok(IndexResponse {
            status_ok: true,
            reason,
            body,
        })
    }
}
