//! HTTP network backend for the offline worker.
//!
//! ### Request forwarding
//! - Method and headers are forwarded as intercepted (minus `Host`).
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//!
//! ### Failure mapping
//! - Any status code is a response, including 4xx/5xx.
//! - Connect/transport failures map to `NetworkError::Offline`.
//! - Timeouts map to `NetworkError::Timeout`.
//! - Oversized bodies map to `NetworkError::TooLarge` and are never
//!   returned truncated.

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

use offline_core::{AppConfig, Error, Network, NetworkError, Request, Response};

/// Headers owned by the connection rather than the request.
const SKIPPED_REQUEST_HEADERS: &[&str] = &["host", "content-length", "connection"];

/// Configuration for the HTTP network backend.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "offline-sw/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "offline-sw/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// [`Network`] implementation over reqwest.
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new network backend with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn too_large(&self, len: usize) -> NetworkError {
        NetworkError::TooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes))
    }
}

fn classify(err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout(err.to_string())
    } else if err.is_builder() {
        NetworkError::InvalidRequest(err.to_string())
    } else {
        NetworkError::Offline(err.to_string())
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            if SKIPPED_REQUEST_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h)) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(classify)?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(self.too_large(len as usize));
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();

        let body = response.bytes().await.map_err(classify)?;

        if body.len() > self.config.max_bytes {
            return Err(self.too_large(body.len()));
        }

        tracing::debug!(
            url = %request.url,
            status = status.as_u16(),
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "network fetch complete"
        );

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

/// Content type of a response, if present.
pub fn content_type(response: &Response) -> Option<&str> {
    response.header(header::CONTENT_TYPE.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request text.
    async fn serve_once(raw_response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(raw_response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "offline-sw/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "poker/2".into(), max_bytes: 1024, timeout_ms: 500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "poker/2");
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_http_network_new() {
        assert!(HttpNetwork::new(FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_success_response_is_buffered() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 11\r\nConnection: close\r\n\r\n<h1>hi</h1>",
        )
        .await;
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();

        let request = Request::get(format!("{base}/poker/index.html")).with_header("X-Table", "7");
        let response = network.fetch(&request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(content_type(&response), Some("text/html"));
        assert_eq!(&response.body[..], b"<h1>hi</h1>");

        let raw_request = server.await.unwrap();
        assert!(raw_request.starts_with("GET /poker/index.html"));
        assert!(raw_request.to_ascii_lowercase().contains("x-table: 7"));
    }

    #[tokio::test]
    async fn test_error_status_is_a_response() {
        let (base, _server) =
            serve_once("HTTP/1.1 503 Service Unavailable\r\nContent-Length: 4\r\nConnection: close\r\n\r\nbusy").await;
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();

        let response = network.fetch(&Request::get(format!("{base}/"))).await.unwrap();

        assert_eq!(response.status, 503);
        assert!(!response.ok());
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let (base, _server) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 10\r\nConnection: close\r\n\r\n0123456789").await;
        let network = HttpNetwork::new(FetchConfig { max_bytes: 4, ..Default::default() }).unwrap();

        let result = network.fetch(&Request::get(format!("{base}/big"))).await;

        assert!(matches!(result, Err(NetworkError::TooLarge(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_offline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();

        let result = network.fetch(&Request::get(format!("http://{addr}/"))).await;

        assert!(matches!(result, Err(NetworkError::Offline(_))));
    }

    #[tokio::test]
    async fn test_invalid_method() {
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();
        let result = network.fetch(&Request::new("BAD METHOD", "http://127.0.0.1/")).await;
        assert!(matches!(result, Err(NetworkError::InvalidRequest(_))));
    }
}
