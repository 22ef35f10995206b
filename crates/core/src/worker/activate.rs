//! Activate handler: garbage-collect stores from previous versions.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use super::{Controller, Worker};
use crate::Error;

/// Outcome of an activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub cache: String,
    /// Stale stores removed.
    pub deleted: Vec<String>,
    /// Stale stores whose deletion failed, with the error message.
    pub failed: Vec<(String, String)>,
}

impl Worker {
    /// Handle the activate event.
    ///
    /// Deletions run concurrently and are independent: a failed one is
    /// recorded in the report and does not stop the others. Returns only
    /// after every deletion has settled.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store names cannot be listed.
    pub async fn activate(&self, control: &dyn Controller) -> Result<ActivateReport, Error> {
        let current = &self.cache_name;
        let stale: Vec<String> = self
            .store
            .names()
            .await?
            .into_iter()
            .filter(|name| current.is_stale(name))
            .collect();

        tracing::info!(cache = %current, stale = stale.len(), "activating");

        let results = join_all(stale.iter().map(|name| async move { (name, self.store.delete(name).await) })).await;

        let mut report = ActivateReport { cache: current.to_string(), ..Default::default() };
        for (name, result) in results {
            match result {
                Ok(_) => {
                    tracing::debug!(cache = %name, "deleted stale store");
                    report.deleted.push(name.clone());
                }
                Err(e) => {
                    tracing::warn!(cache = %name, error = %e, "failed to delete stale store");
                    report.failed.push((name.clone(), e.to_string()));
                }
            }
        }

        control.claim_clients();

        Ok(report)
    }
}
