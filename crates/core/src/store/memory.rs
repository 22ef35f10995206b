//! In-memory store backend.
//!
//! Uses a HashMap per store behind a tokio RwLock. Nothing survives the
//! process; useful for tests and for hosts that only need a warm cache.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::hash::{canonical_url, compute_cache_key};
use super::{Store, StoredEntry};
use crate::Error;
use crate::http::{Request, Response};

#[derive(Debug, Clone)]
struct MemoryEntry {
    method: String,
    url: String,
    response: Response,
    stored_at: String,
}

impl MemoryEntry {
    fn new(request: &Request, response: &Response, stored_at: &str) -> Self {
        Self {
            method: request.method.to_ascii_uppercase(),
            url: canonical_url(&request.url),
            response: response.clone(),
            stored_at: stored_at.to_string(),
        }
    }
}

/// Process-local [`Store`] implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    caches: Arc<RwLock<BTreeMap<String, HashMap<String, MemoryEntry>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.caches.write().await.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let key = compute_cache_key(&request.method, &request.url);
        let entry = MemoryEntry::new(request, response, &chrono::Utc::now().to_rfc3339());
        self.caches
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .insert(key, entry);
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let now = chrono::Utc::now().to_rfc3339();
        let staged: Vec<_> = entries
            .iter()
            .map(|(req, resp)| (compute_cache_key(&req.method, &req.url), MemoryEntry::new(req, resp, &now)))
            .collect();

        let mut caches = self.caches.write().await;
        caches.entry(name.to_string()).or_default().extend(staged);
        Ok(())
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        let key = compute_cache_key(&request.method, &request.url);
        let caches = self.caches.read().await;
        Ok(caches
            .get(name)
            .and_then(|cache| cache.get(&key))
            .map(|entry| entry.response.clone()))
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        Ok(self.caches.write().await.remove(name).is_some())
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        Ok(self.caches.read().await.keys().cloned().collect())
    }

    async fn entries(&self, name: &str) -> Result<Vec<StoredEntry>, Error> {
        let caches = self.caches.read().await;
        let mut entries: Vec<StoredEntry> = caches
            .get(name)
            .map(|cache| {
                cache
                    .values()
                    .map(|e| StoredEntry {
                        method: e.method.clone(),
                        url: e.url.clone(),
                        status: e.response.status,
                        body_len: e.response.body.len(),
                        stored_at: e.stored_at.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_lookup_overwrite() {
        let store = MemoryStore::new();
        let req = Request::get("https://example.com/poker/");

        store.put("poker-v1", &req, &Response::new(200, "OK", "one")).await.unwrap();
        store.put("poker-v1", &req, &Response::new(200, "OK", "two")).await.unwrap();

        let stored = store.lookup("poker-v1", &req).await.unwrap().unwrap();
        assert_eq!(&stored.body[..], b"two");
        assert_eq!(store.entries("poker-v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_names_and_delete() {
        let store = MemoryStore::new();
        store.open("poker-v1").await.unwrap();
        store.open("poker-v2").await.unwrap();

        assert_eq!(store.names().await.unwrap(), vec!["poker-v1", "poker-v2"]);
        assert!(store.delete("poker-v1").await.unwrap());
        assert!(!store.delete("poker-v1").await.unwrap());
        assert_eq!(store.names().await.unwrap(), vec!["poker-v2"]);
    }

    #[tokio::test]
    async fn test_lookup_missing_store() {
        let store = MemoryStore::new();
        let found = store.lookup("poker-v9", &Request::get("https://example.com/")).await.unwrap();
        assert!(found.is_none());
    }
}
