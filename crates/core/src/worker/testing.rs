//! In-memory fakes for driving worker handlers in tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{Worker, WorkerConfig};
use crate::Error;
use crate::http::{Request, Response};
use crate::network::{Network, NetworkError};
use crate::store::{MemoryStore, Store, StoredEntry};

pub(crate) const ORIGIN: &str = "https://example.com";

pub(crate) fn html(body: &str) -> Response {
    Response::new(200, "OK", body.to_string()).with_header("Content-Type", "text/html")
}

pub(crate) fn config(version: &str, precache: &[&str]) -> WorkerConfig {
    WorkerConfig {
        namespace: "poker".into(),
        version: version.into(),
        precache: precache.iter().map(|p| p.to_string()).collect(),
        origin: ORIGIN.into(),
    }
}

/// Network fake answering from a route table.
///
/// Unknown URLs answer 404; failed URLs and offline mode produce errors.
/// Held URLs wait for their gate before answering.
#[derive(Default)]
pub(crate) struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashSet<String>>,
    held: Mutex<HashMap<String, Arc<Notify>>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    pub fn route(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    /// Block requests for `url` until the returned gate is notified.
    pub fn hold(&self, url: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.held.lock().unwrap().insert(url.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.lock().unwrap().push(request.url.clone());

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&request.url) {
            return Err(NetworkError::Offline(request.url.clone()));
        }

        let gate = self.held.lock().unwrap().get(&request.url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "Not Found", "")))
    }
}

/// Store fake that counts accesses and injects failures.
#[derive(Default)]
pub(crate) struct RecordingStore {
    inner: MemoryStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_delete: Mutex<HashSet<String>>,
}

impl RecordingStore {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, name: &str) {
        self.fail_delete.lock().unwrap().insert(name.to_string());
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.inner.open(name).await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put(name, request, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        self.writes.fetch_add(entries.len(), Ordering::SeqCst);
        self.inner.put_all(name, entries).await
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::CorruptEntry("injected read failure".into()));
        }
        self.inner.lookup(name, request).await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        if self.fail_delete.lock().unwrap().contains(name) {
            return Err(Error::InvalidState(format!("injected delete failure for {name}")));
        }
        self.inner.delete(name).await
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        self.inner.names().await
    }

    async fn entries(&self, name: &str) -> Result<Vec<StoredEntry>, Error> {
        self.inner.entries(name).await
    }
}

/// A worker wired to fresh fakes.
pub(crate) struct TestHarness {
    pub store: Arc<RecordingStore>,
    pub network: Arc<ScriptedNetwork>,
    pub worker: Worker,
}

impl TestHarness {
    pub fn new(version: &str, precache: &[&str]) -> Self {
        Self::with_fakes(Arc::default(), Arc::default(), version, precache)
    }

    /// Build a worker for another version over existing fakes.
    pub fn with_fakes(
        store: Arc<RecordingStore>, network: Arc<ScriptedNetwork>, version: &str, precache: &[&str],
    ) -> Self {
        let worker = Worker::new(config(version, precache), store.clone(), network.clone());
        Self { store, network, worker }
    }

    /// Another worker version sharing this harness's store and network.
    pub fn next_version(&self, version: &str, precache: &[&str]) -> Worker {
        Worker::new(config(version, precache), self.store.clone(), self.network.clone())
    }
}
