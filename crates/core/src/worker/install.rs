//! Install handler: seed the current store with the precache manifest.
//!
//! All or nothing. Every manifest entry is fetched before anything is
//! written; one failed fetch or non-success status aborts the install and
//! leaves the store without any of the batch.

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use super::{Controller, Worker};
use crate::Error;
use crate::http::{Request, Response};

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub cache: String,
    pub precached: Vec<String>,
}

impl Worker {
    /// Handle the install event.
    ///
    /// # Errors
    ///
    /// Returns `Error::PrecacheFailed` naming the first manifest path that
    /// could not be fetched, or a store error if the batch write fails.
    pub async fn install(&self, control: &dyn Controller) -> Result<InstallReport, Error> {
        let cache = self.cache_name.as_str();
        tracing::info!(cache, entries = self.config.precache.len(), "installing");

        self.store.open(cache).await?;

        let requests = self
            .config
            .precache
            .iter()
            .map(|path| Ok((path.as_str(), Request::get(self.config.resolve(path)?))))
            .collect::<Result<Vec<_>, Error>>()?;

        let entries = try_join_all(requests.into_iter().map(|(path, request)| self.precache_one(path, request))).await?;

        self.store.put_all(cache, &entries).await?;

        control.skip_waiting();

        tracing::info!(cache, entries = entries.len(), "install complete");

        Ok(InstallReport { cache: cache.to_string(), precached: entries.into_iter().map(|(req, _)| req.url).collect() })
    }

    /// Whether the current store already holds every manifest entry, as it
    /// does after an earlier install of this version completed.
    ///
    /// Store read failures count as not installed.
    pub async fn is_installed(&self) -> bool {
        let cache = self.cache_name.as_str();
        match self.store.names().await {
            Ok(names) if names.iter().any(|n| n == cache) => {}
            Ok(_) => return false,
            Err(e) => {
                tracing::warn!(cache, error = %e, "could not list stores");
                return false;
            }
        }

        for path in &self.config.precache {
            let Ok(url) = self.config.resolve(path) else {
                return false;
            };
            match self.store.lookup(cache, &Request::get(url)).await {
                Ok(Some(_)) => {}
                Ok(None) => return false,
                Err(e) => {
                    tracing::warn!(cache, path = path.as_str(), error = %e, "could not read precached entry");
                    return false;
                }
            }
        }
        true
    }

    async fn precache_one(&self, path: &str, request: Request) -> Result<(Request, Response), Error> {
        let response = self.network.fetch(&request).await.map_err(|e| {
            tracing::warn!(path, error = %e, "precache fetch failed");
            Error::PrecacheFailed { path: path.to_string(), reason: e.to_string() }
        })?;

        if !response.ok() {
            tracing::warn!(path, status = response.status, "precache fetch returned error status");
            return Err(Error::PrecacheFailed { path: path.to_string(), reason: format!("status {}", response.status) });
        }

        Ok((request, response))
    }
}
