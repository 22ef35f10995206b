//! Request and response values exchanged between the host, the network and the store.
//!
//! Bodies are always fully buffered [`Bytes`], so cloning a response for the
//! store never observes a partially read stream.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Header name/value pairs in wire order.
pub type Headers = Vec<(String, String)>;

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Headers,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into(), url: url.into(), headers: Vec::new() }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Lowercased URL scheme, if the URL has one.
    pub fn scheme(&self) -> Option<String> {
        let (scheme, _) = self.url.split_once(':')?;
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
            return None;
        }
        Some(scheme.to_ascii_lowercase())
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: status_text.into(), headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// The page served when the network is down and nothing is cached.
    pub fn service_unavailable() -> Self {
        Self::new(503, "Service Unavailable", OFFLINE_PAGE).with_header("Content-Type", "text/html")
    }
}

const OFFLINE_PAGE: &str = "<!DOCTYPE html>\
<html><head><title>Service Unavailable</title></head>\
<body><h1>Service Unavailable</h1><p>You appear to be offline and this page has not been cached yet.</p></body></html>";

fn find_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = Request::get("https://example.com/").with_header("upgrade", "websocket");
        assert_eq!(req.header("Upgrade"), Some("websocket"));
        assert_eq!(req.header("connection"), None);
    }

    #[test]
    fn test_scheme() {
        assert_eq!(Request::get("chrome-extension://abc/page").scheme().as_deref(), Some("chrome-extension"));
        assert_eq!(Request::get("HTTPS://example.com").scheme().as_deref(), Some("https"));
        assert_eq!(Request::get("/poker/index.html").scheme(), None);
    }

    #[test]
    fn test_is_get() {
        assert!(Request::get("https://example.com").is_get());
        assert!(Request::new("get", "https://example.com").is_get());
        assert!(!Request::new("POST", "https://example.com").is_get());
    }

    #[test]
    fn test_ok_range() {
        assert!(Response::new(200, "OK", "").ok());
        assert!(Response::new(204, "No Content", "").ok());
        assert!(!Response::new(304, "Not Modified", "").ok());
        assert!(!Response::new(404, "Not Found", "").ok());
        assert!(!Response::new(500, "Internal Server Error", "").ok());
    }

    #[test]
    fn test_service_unavailable() {
        let resp = Response::service_unavailable();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.status_text, "Service Unavailable");
        assert_eq!(resp.header("content-type"), Some("text/html"));
        assert!(String::from_utf8_lossy(&resp.body).contains("Service Unavailable"));
    }
}
