//! HTTP transport for the Stalker portal
//!
//! Thin wrapper over `reqwest` that sends one [`PortalRequest`] and hands
//! back status, encoding and raw body. There is no retry and no rate
//! limiting; timeouts come from [`ClientConfig::timeout_secs`].

use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_ENCODING};
use tracing::debug;

use crate::error::{Operation, Result, StalkerError};
use crate::request::{PortalRequest, STB_USER_AGENT};

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for a portal client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Portal base URL, e.g. `http://portal.example.com:8080`
    pub portal_url: String,
    /// Device MAC address used as identity
    pub mac: String,
    /// IANA timezone sent to the portal and used for EPG stamps
    pub timezone: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// User-Agent for actions that require a set-top box identity
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration with default timeout and User-Agent
    pub fn new(
        portal_url: impl Into<String>,
        mac: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            portal_url: portal_url.into(),
            mac: mac.into(),
            timezone: timezone.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: STB_USER_AGENT.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Raw portal response
#[derive(Debug, Clone)]
pub struct PortalResponse {
    pub operation: Operation,
    pub status: u16,
    /// Value of the `Content-Encoding` header, if present
    pub content_encoding: Option<String>,
    pub body: Vec<u8>,
}

impl PortalResponse {
    /// Whether the server says the body is gzip-compressed
    pub fn is_gzip(&self) -> bool {
        self.content_encoding
            .as_deref()
            .map(|encoding| encoding.trim().eq_ignore_ascii_case("gzip"))
            .unwrap_or(false)
    }

    /// Fail on 401/403 and other non-success statuses
    pub fn ensure_success(&self) -> Result<()> {
        match self.status {
            200..=299 => Ok(()),
            401 | 403 => Err(StalkerError::Unauthorized {
                operation: self.operation,
                status: self.status,
            }),
            status => Err(StalkerError::Status {
                operation: self.operation,
                status,
            }),
        }
    }

    /// Body bytes, inflated when the response header announces gzip
    pub fn into_decoded_body(self) -> Result<Vec<u8>> {
        if !self.is_gzip() {
            return Ok(self.body);
        }
        let mut inflated = Vec::with_capacity(self.body.len() * 4);
        GzDecoder::new(self.body.as_slice())
            .read_to_end(&mut inflated)
            .map_err(|e| {
                StalkerError::decode(self.operation, format!("invalid gzip body: {}", e))
            })?;
        Ok(inflated)
    }
}

/// Byte stream handed to logo storage
pub type ByteStream = BoxStream<'static, std::io::Result<Vec<u8>>>;

/// HTTP client for a Stalker portal
pub struct PortalClient {
    /// Underlying HTTP client
    client: reqwest::Client,
}

impl PortalClient {
    /// Create a transport honouring the configured timeout
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: &ClientConfig) -> Result<Self> {
        // No automatic decompression: probing must see Content-Encoding
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StalkerError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Send one request and read the whole body
    pub async fn send(&self, request: &PortalRequest) -> Result<PortalResponse> {
        let operation = request.operation;
        debug!(%operation, url = %request.url, "Portal request");

        let transport = |source: reqwest::Error| StalkerError::Transport { operation, source };

        let response = self
            .client
            .get(&request.url)
            .headers(header_map(request)?)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status().as_u16();
        let content_encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(transport)?.to_vec();

        debug!(%operation, status, bytes = body.len(), "Portal response");

        Ok(PortalResponse {
            operation,
            status,
            content_encoding,
            body,
        })
    }

    /// Open a streaming GET, used for logo images
    pub async fn stream(&self, url: &str, operation: Operation) -> Result<ByteStream> {
        debug!(%operation, url, "Streaming download");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| StalkerError::Transport { operation, source })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(StalkerError::Status { operation, status });
        }

        Ok(response
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(std::io::Error::other)
            .boxed())
    }
}

fn header_map(request: &PortalRequest) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &request.headers {
        let invalid = || StalkerError::Config(format!("{} header contains invalid characters", name));
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        headers.insert(name, value);
    }
    Ok(headers)
}
