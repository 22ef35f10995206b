//! worker_fetch tool implementation.
//!
//! Runs one request through the active worker exactly as a controlled page
//! would issue it, and reports how it was handled.

use offline_core::{Error, FetchDisposition, FetchOutcome, PassThroughReason, Registration, Request};
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// The URL the page requests.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers.
    #[serde(default)]
    pub headers: Vec<HeaderParam>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HeaderParam {
    pub name: String,
    pub value: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    /// Set when the worker left the request to default handling.
    pub pass_through: Option<PassThroughReason>,
    /// How the response was produced.
    pub outcome: Option<FetchOutcome>,
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub headers: Vec<HeaderParam>,
    /// Response body, lossily decoded as UTF-8.
    pub body: Option<String>,
    pub body_len: usize,
}

impl From<FetchDisposition> for WorkerFetchOutput {
    fn from(disposition: FetchDisposition) -> Self {
        match disposition {
            FetchDisposition::PassThrough(reason) => Self {
                pass_through: Some(reason),
                outcome: None,
                status: None,
                status_text: None,
                headers: Vec::new(),
                body: None,
                body_len: 0,
            },
            FetchDisposition::Respond { response, outcome } => Self {
                pass_through: None,
                outcome: Some(outcome),
                status: Some(response.status),
                status_text: Some(response.status_text),
                headers: response
                    .headers
                    .into_iter()
                    .map(|(name, value)| HeaderParam { name, value })
                    .collect(),
                body_len: response.body.len(),
                body: Some(String::from_utf8_lossy(&response.body).to_string()),
            },
        }
    }
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(registration: &Registration, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let request = params
        .headers
        .into_iter()
        .fold(Request::new(params.method.trim(), params.url.trim()), |req, h| req.with_header(h.name, h.value));

    let output = WorkerFetchOutput::from(registration.fetch(&request).await);

    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&output).unwrap_or_default(),
    )]))
}
