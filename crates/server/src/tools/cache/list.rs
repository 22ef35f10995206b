//! cache_list tool implementation.
//!
//! Lists every store present and the entries each one holds.

use offline_core::{Error, Registration, Store, StoredEntry};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One store in the cache_list output.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListing {
    pub name: String,
    /// Whether this is the active worker's store.
    pub current: bool,
    pub entries: Vec<StoredEntry>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub caches: Vec<CacheListing>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(registration: &Registration) -> Result<CallToolResult, McpError> {
    let worker = registration
        .active()
        .await
        .ok_or_else(|| Error::InvalidState("no active worker".into()))?;
    let store = worker.store();

    let mut caches = Vec::new();
    for name in store.names().await? {
        let entries = store.entries(&name).await?;
        caches.push(CacheListing { current: !worker.cache_name().is_stale(&name), name, entries });
    }

    let output = CacheListOutput { caches };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
