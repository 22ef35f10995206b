//! The offline worker: install, activate and fetch handlers over one
//! versioned store.
//!
//! A [`Worker`] is built from injected configuration and capabilities, so a
//! host (or a test) drives its handlers directly:
//!
//! - [`Worker::install`] seeds the current store with the precache manifest
//! - [`Worker::activate`] deletes every other store and claims open pages
//! - [`Worker::fetch`] applies the network-first policy to one request
//!
//! [`Registration`] sequences those events the way a browser host does.

pub mod activate;
pub mod control;
pub mod fetch;
pub mod install;
pub mod lifecycle;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::Error;
use crate::network::Network;
use crate::store::{CacheName, Store};

pub use activate::ActivateReport;
pub use control::{ControlSignals, Controller};
pub use fetch::{FetchDisposition, FetchOutcome, FetchState, PassThroughReason, scope_filter};
pub use install::InstallReport;
pub use lifecycle::{Registration, RegistrationStatus, WorkerState, WorkerSummary};

/// Per-deployment configuration injected into a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub namespace: String,
    pub version: String,
    pub precache: Vec<String>,
    /// Origin precache paths are resolved against, e.g. `https://example.com`.
    pub origin: String,
}

impl WorkerConfig {
    pub fn cache_name(&self) -> CacheName {
        CacheName::new(&self.namespace, &self.version)
    }

    /// Absolute URL of a manifest path.
    pub fn resolve(&self, path: &str) -> Result<String, Error> {
        let origin = url::Url::parse(&self.origin)
            .map_err(|e| Error::InvalidInput(format!("invalid origin {}: {e}", self.origin)))?;
        let resolved = origin
            .join(path)
            .map_err(|e| Error::InvalidInput(format!("invalid precache path {path}: {e}")))?;
        Ok(resolved.to_string())
    }
}

/// One version of the offline worker.
pub struct Worker {
    config: WorkerConfig,
    cache_name: CacheName,
    store: Arc<dyn Store>,
    network: Arc<dyn Network>,
    /// Background cache writes that keep the worker alive until they finish.
    pending: Mutex<JoinSet<()>>,
    /// Set once a newer version replaces this one; no further writes are spawned.
    retired: AtomicBool,
}

impl Worker {
    pub fn new(config: WorkerConfig, store: Arc<dyn Store>, network: Arc<dyn Network>) -> Self {
        let cache_name = config.cache_name();
        Self { config, cache_name, store, network, pending: Mutex::new(JoinSet::new()), retired: AtomicBool::new(false) }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Name of the store this version owns.
    pub fn cache_name(&self) -> &CacheName {
        &self.cache_name
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Number of background writes not yet awaited by [`Worker::settle`].
    pub async fn pending_writes(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Wait for every background cache write spawned so far.
    ///
    /// Returns the number of writes that settled.
    pub async fn settle(&self) -> usize {
        let mut pending = std::mem::take(&mut *self.pending.lock().await);
        let mut settled = 0;
        while let Some(result) = pending.join_next().await {
            settled += 1;
            if let Err(e) = result {
                tracing::warn!(cache = %self.cache_name, error = %e, "background cache write did not complete");
            }
        }
        settled
    }

    /// Stop spawning background writes and wait for those already spawned.
    ///
    /// Requests still in flight keep being answered, but nothing they fetch
    /// is written once this returns.
    pub async fn retire(&self) -> usize {
        self.retired.store(true, Ordering::SeqCst);
        self.settle().await
    }

    /// Undo [`Worker::retire`] when the replacement failed to activate.
    pub(crate) fn reinstate(&self) {
        self.retired.store(false, Ordering::SeqCst);
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("cache_name", &self.cache_name.as_str())
            .field("precache", &self.config.precache)
            .finish_non_exhaustive()
    }
}
