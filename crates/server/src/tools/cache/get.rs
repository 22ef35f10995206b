//! cache_get tool implementation.
//!
//! Looks up a request in the active worker's store without touching the network.

use offline_core::{Error, Registration, Request, Store};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::worker_fetch::HeaderParam;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The request URL to look up.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    /// Store the entry was found in.
    pub cache: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<HeaderParam>,
    /// Stored body, lossily decoded as UTF-8.
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(registration: &Registration, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let worker = registration
        .active()
        .await
        .ok_or_else(|| Error::InvalidState("no active worker".into()))?;
    let cache = worker.cache_name().as_str();

    let response = worker
        .store()
        .lookup(cache, &Request::get(params.url.as_str()))
        .await?
        .ok_or_else(|| Error::CacheMiss(params.url.clone()))?;

    let output = CacheGetOutput {
        cache: cache.to_string(),
        status: response.status,
        status_text: response.status_text,
        headers: response
            .headers
            .into_iter()
            .map(|(name, value)| HeaderParam { name, value })
            .collect(),
        body: String::from_utf8_lossy(&response.body).to_string(),
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize entry: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
