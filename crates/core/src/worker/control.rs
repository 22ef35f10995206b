//! Control capability: signals a lifecycle handler sends back to its host.

use std::sync::atomic::{AtomicBool, Ordering};

/// Host operations a handler may request.
pub trait Controller: Send + Sync {
    /// Become active as soon as install finishes instead of waiting for
    /// every page controlled by the previous version to close.
    fn skip_waiting(&self);

    /// Take control of pages that were opened before this worker activated.
    fn claim_clients(&self);
}

/// Records which signals a handler raised during one lifecycle event.
#[derive(Debug, Default)]
pub struct ControlSignals {
    skip_waiting: AtomicBool,
    claim_clients: AtomicBool,
}

impl ControlSignals {
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    pub fn claim_requested(&self) -> bool {
        self.claim_clients.load(Ordering::Acquire)
    }
}

impl Controller for ControlSignals {
    fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::Release);
    }

    fn claim_clients(&self) {
        self.claim_clients.store(true, Ordering::Release);
    }
}
