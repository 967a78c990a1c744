use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Invalid response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl NetworkError {
    /// Client errors (4xx) will not change on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Request { .. } => true,
            Self::Decode { .. } => false,
        }
    }
}

/// Minimal HTTP surface the fetcher needs.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Downloads the full response body, following redirects.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError>;

    /// Fetches and decodes a JSON document.
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, NetworkError>;
}
