//! Network capability consumed by the worker.

use async_trait::async_trait;

use crate::http::{Request, Response};

/// Reasons no response could be obtained.
///
/// An HTTP error status is not a `NetworkError`: it is a response.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    #[error("offline: {0}")]
    Offline(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("response too large: {0}")]
    TooLarge(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<NetworkError> for crate::Error {
    fn from(err: NetworkError) -> Self {
        crate::Error::Network(err.to_string())
    }
}

/// Issues real requests on behalf of the worker.
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetch `request`, buffering the whole body.
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}
