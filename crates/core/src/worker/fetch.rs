//! Fetch interceptor: network first, store second, synthetic 503 last.
//!
//! ### Scope filter
//! - Only GET requests are intercepted.
//! - Browser-extension schemes and `ws`/`wss` URLs pass through.
//! - Requests asking to upgrade to a websocket pass through.
//!
//! ### Per-request states
//! ```text
//! Dispatched -> NetworkAttempted -> ServedFromNetworkAndCached
//!                                -> ServedFromNetworkUncached
//!                                -> NetworkFailed -> ServedFromCache
//!                                                 -> ServedSynthetic503
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Worker;
use crate::http::{Request, Response};

/// URL schemes owned by browser extensions. Never intercepted.
pub const EXTENSION_SCHEMES: &[&str] = &["chrome-extension", "moz-extension", "safari-web-extension", "ms-browser-extension"];

/// Streaming connection schemes. Never intercepted.
pub const STREAMING_SCHEMES: &[&str] = &["ws", "wss"];

/// Why a request was left to default handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PassThroughReason {
    NonGet,
    ExtensionScheme,
    StreamingUpgrade,
    /// No activated worker controls the request.
    NoController,
}

/// Terminal outcome of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    ServedFromNetworkAndCached,
    ServedFromNetworkUncached,
    ServedFromCache,
    ServedSynthetic503,
}

/// Per-request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Dispatched,
    NetworkAttempted,
    NetworkFailed,
    Done(FetchOutcome),
}

impl FetchState {
    /// Whether `next` is a legal transition from this state.
    pub fn can_advance_to(self, next: FetchState) -> bool {
        use FetchOutcome::*;
        use FetchState::*;

        matches!(
            (self, next),
            (Dispatched, NetworkAttempted)
                | (NetworkAttempted, NetworkFailed)
                | (NetworkAttempted, Done(ServedFromNetworkAndCached | ServedFromNetworkUncached))
                | (NetworkFailed, Done(ServedFromCache | ServedSynthetic503))
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FetchState::Done(_))
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchState::Dispatched => write!(f, "dispatched"),
            FetchState::NetworkAttempted => write!(f, "network-attempted"),
            FetchState::NetworkFailed => write!(f, "network-failed"),
            FetchState::Done(outcome) => write!(f, "{outcome:?}"),
        }
    }
}

/// What the host should do with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDisposition {
    /// Let the host handle the request as if no worker were installed.
    PassThrough(PassThroughReason),
    /// Answer the page with `response`.
    Respond { response: Response, outcome: FetchOutcome },
}

impl FetchDisposition {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchDisposition::Respond { response, .. } => Some(response),
            FetchDisposition::PassThrough(_) => None,
        }
    }

    pub fn outcome(&self) -> Option<FetchOutcome> {
        match self {
            FetchDisposition::Respond { outcome, .. } => Some(*outcome),
            FetchDisposition::PassThrough(_) => None,
        }
    }
}

/// Decide whether a request is out of scope for the interceptor.
pub fn scope_filter(request: &Request) -> Option<PassThroughReason> {
    if !request.is_get() {
        return Some(PassThroughReason::NonGet);
    }

    if let Some(scheme) = request.scheme() {
        if EXTENSION_SCHEMES.contains(&scheme.as_str()) {
            return Some(PassThroughReason::ExtensionScheme);
        }
        if STREAMING_SCHEMES.contains(&scheme.as_str()) {
            return Some(PassThroughReason::StreamingUpgrade);
        }
    }

    if request
        .header("upgrade")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("websocket"))
    {
        return Some(PassThroughReason::StreamingUpgrade);
    }

    None
}

/// Tracks one request through its states.
struct FetchTask<'a> {
    url: &'a str,
    state: FetchState,
}

impl<'a> FetchTask<'a> {
    fn new(url: &'a str) -> Self {
        Self { url, state: FetchState::Dispatched }
    }

    fn advance(&mut self, next: FetchState) {
        debug_assert!(self.state.can_advance_to(next), "illegal fetch transition {} -> {}", self.state, next);
        tracing::trace!(url = self.url, from = %self.state, to = %next, "fetch transition");
        self.state = next;
    }

    fn finish(mut self, response: Response, outcome: FetchOutcome) -> FetchDisposition {
        self.advance(FetchState::Done(outcome));
        tracing::debug!(url = self.url, status = response.status, outcome = ?outcome, "fetch handled");
        FetchDisposition::Respond { response, outcome }
    }
}

impl Worker {
    /// Handle one fetch event.
    ///
    /// Never fails: every intercepted request resolves to a response.
    pub async fn fetch(&self, request: &Request) -> FetchDisposition {
        if let Some(reason) = scope_filter(request) {
            tracing::trace!(url = %request.url, method = %request.method, ?reason, "passing through");
            return FetchDisposition::PassThrough(reason);
        }

        let mut task = FetchTask::new(&request.url);
        task.advance(FetchState::NetworkAttempted);

        match self.network.fetch(request).await {
            Ok(response) if response.ok() => {
                if self.cache_in_background(request.clone(), response.clone()).await {
                    task.finish(response, FetchOutcome::ServedFromNetworkAndCached)
                } else {
                    task.finish(response, FetchOutcome::ServedFromNetworkUncached)
                }
            }
            Ok(response) => task.finish(response, FetchOutcome::ServedFromNetworkUncached),
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "network failed, falling back to store");
                task.advance(FetchState::NetworkFailed);

                match self.store.lookup(self.cache_name.as_str(), request).await {
                    Ok(Some(cached)) => task.finish(cached, FetchOutcome::ServedFromCache),
                    Ok(None) => task.finish(Response::service_unavailable(), FetchOutcome::ServedSynthetic503),
                    Err(e) => {
                        tracing::warn!(url = %request.url, error = %e, "store lookup failed");
                        task.finish(Response::service_unavailable(), FetchOutcome::ServedSynthetic503)
                    }
                }
            }
        }
    }

    /// Write a buffered copy of a successful response without delaying it.
    ///
    /// Returns false when the worker is retired and nothing was spawned.
    async fn cache_in_background(&self, request: Request, response: Response) -> bool {
        let store = Arc::clone(&self.store);
        let cache = self.cache_name.as_str().to_string();

        let mut pending = self.pending.lock().await;
        if self.is_retired() {
            tracing::debug!(cache = %cache, url = %request.url, "worker retired, response not cached");
            return false;
        }
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            match store.put(&cache, &request, &response).await {
                Ok(()) => tracing::trace!(cache = %cache, url = %request.url, "cached response"),
                Err(e) => tracing::warn!(cache = %cache, url = %request.url, error = %e, "failed to cache response"),
            }
        });
        true
    }
}
