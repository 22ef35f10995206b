//! Host-side lifecycle: sequences install, activate and fetch events.
//!
//! A [`Registration`] holds at most one active and one waiting worker.
//! Install always completes before activate starts, and fetches are only
//! routed to an activated worker. Activation retires the outgoing worker
//! and settles its writes before any stale store is deleted.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use super::{ControlSignals, FetchDisposition, PassThroughReason, Worker};
use crate::Error;
use crate::http::Request;

/// Lifecycle states of a worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Redundant)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Parsed => write!(f, "parsed"),
            WorkerState::Installing => write!(f, "installing"),
            WorkerState::Installed => write!(f, "installed"),
            WorkerState::Activating => write!(f, "activating"),
            WorkerState::Activated => write!(f, "activated"),
            WorkerState::Redundant => write!(f, "redundant"),
        }
    }
}

/// Public view of one worker slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WorkerSummary {
    pub version: String,
    pub cache: String,
    pub state: WorkerState,
}

impl WorkerSummary {
    fn of(worker: &Worker, state: WorkerState) -> Self {
        Self { version: worker.config().version.clone(), cache: worker.cache_name().to_string(), state }
    }
}

/// Snapshot of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RegistrationStatus {
    pub active: Option<WorkerSummary>,
    pub waiting: Option<WorkerSummary>,
    /// Whether the active worker claimed pages opened before it activated.
    pub clients_claimed: bool,
}

#[derive(Default)]
struct Slots {
    active: Option<Arc<Worker>>,
    waiting: Option<Arc<Worker>>,
    clients_claimed: bool,
}

/// Registration of the offline worker with its host.
#[derive(Default)]
pub struct Registration {
    slots: RwLock<Slots>,
    /// Serializes updates so two installs never interleave.
    updating: Mutex<()>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `worker` and, if it asks to skip waiting or nothing is
    /// active yet, activate it.
    ///
    /// A version whose store already holds its whole manifest (from an
    /// earlier run of the host) is not installed again; it activates
    /// straight away so its entries serve even while the network is down.
    ///
    /// Returns the state the worker ended in. On error the worker is
    /// redundant and the previously active worker keeps serving.
    pub async fn register(&self, worker: Worker) -> Result<WorkerState, Error> {
        let _updating = self.updating.lock().await;
        let worker = Arc::new(worker);
        let signals = ControlSignals::default();

        let resumed = worker.is_installed().await;
        if resumed {
            tracing::info!(cache = %worker.cache_name(), state = %WorkerState::Installed, "resuming installed version");
        } else {
            tracing::debug!(cache = %worker.cache_name(), state = %WorkerState::Installing, "worker state");
            if let Err(e) = worker.install(&signals).await {
                tracing::warn!(cache = %worker.cache_name(), state = %WorkerState::Redundant, error = %e, "install failed");
                return Err(e);
            }
        }

        let activate_now = {
            let mut slots = self.slots.write().await;
            if let Some(replaced) = slots.waiting.take() {
                tracing::debug!(cache = %replaced.cache_name(), state = %WorkerState::Redundant, "waiting worker replaced");
            }
            let activate_now = resumed || signals.skip_waiting_requested() || slots.active.is_none();
            if !activate_now {
                slots.waiting = Some(Arc::clone(&worker));
            }
            activate_now
        };

        if !activate_now {
            tracing::info!(cache = %worker.cache_name(), state = %WorkerState::Installed, "worker waiting");
            return Ok(WorkerState::Installed);
        }

        self.activate(worker).await
    }

    /// Activate the waiting worker, as a host does once every page of the
    /// previous version has closed.
    pub async fn promote_waiting(&self) -> Result<WorkerState, Error> {
        let _updating = self.updating.lock().await;
        let waiting = self.slots.write().await.waiting.take();
        match waiting {
            Some(worker) => self.activate(worker).await,
            None => Err(Error::InvalidState("no waiting worker".into())),
        }
    }

    async fn activate(&self, worker: Arc<Worker>) -> Result<WorkerState, Error> {
        let mut slots = self.slots.write().await;

        // Writes still in flight from the outgoing version would recreate its store.
        if let Some(previous) = slots.active.as_ref() {
            previous.retire().await;
        }

        tracing::debug!(cache = %worker.cache_name(), state = %WorkerState::Activating, "worker state");
        let signals = ControlSignals::default();
        match worker.activate(&signals).await {
            Ok(report) => {
                tracing::info!(
                    cache = %report.cache,
                    deleted = report.deleted.len(),
                    failed = report.failed.len(),
                    state = %WorkerState::Activated,
                    "worker activated"
                );
                slots.active = Some(worker);
                slots.clients_claimed = signals.claim_requested();
                Ok(WorkerState::Activated)
            }
            Err(e) => {
                tracing::warn!(cache = %worker.cache_name(), error = %e, "activation failed");
                if let Some(previous) = slots.active.as_ref() {
                    previous.reinstate();
                }
                slots.waiting = Some(worker);
                Err(e)
            }
        }
    }

    /// Route a page request through the active worker.
    ///
    /// The slot lock is released before the network is awaited. A worker
    /// retired mid-request still answers it but no longer caches the response.
    pub async fn fetch(&self, request: &Request) -> FetchDisposition {
        match self.active().await {
            Some(worker) => worker.fetch(request).await,
            None => FetchDisposition::PassThrough(PassThroughReason::NoController),
        }
    }

    /// The active worker, if any.
    pub async fn active(&self) -> Option<Arc<Worker>> {
        self.slots.read().await.active.clone()
    }

    pub async fn status(&self) -> RegistrationStatus {
        let slots = self.slots.read().await;
        RegistrationStatus {
            active: slots
                .active
                .as_deref()
                .map(|w| WorkerSummary::of(w, WorkerState::Activated)),
            waiting: slots
                .waiting
                .as_deref()
                .map(|w| WorkerSummary::of(w, WorkerState::Installed)),
            clients_claimed: slots.clients_claimed,
        }
    }

    /// Wait for the active worker's background writes.
    pub async fn settle(&self) -> usize {
        match self.active().await {
            Some(worker) => worker.settle().await,
            None => 0,
        }
    }
}
