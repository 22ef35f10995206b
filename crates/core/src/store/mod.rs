//! Versioned response stores.
//!
//! A store is a named container mapping request identity to a saved
//! response. The worker only ever writes to the store named after the current
//! version and deletes every other one on activation.
//!
//! Two backends implement [`Store`]:
//!
//! - [`SqliteStore`]: persistent, WAL-mode SQLite via tokio-rusqlite
//! - [`MemoryStore`]: process-local, for tests and ephemeral hosts

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod name;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use crate::Error;
use crate::http::{Request, Response};

pub use connection::SqliteStore;
pub use memory::MemoryStore;
pub use name::CacheName;

/// Summary of one stored entry, without its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoredEntry {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body_len: usize,
    pub stored_at: String,
}

/// Store capability consumed by the worker.
///
/// Writes to one key are atomic: a reader sees either the previous response
/// or the new one, never a mix.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open the named store, creating it if absent.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Write one entry, creating the store if needed and overwriting any
    /// previous entry for the same request.
    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Write a batch of entries; either every entry lands or none does.
    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error>;

    /// Look up the response stored for `request`.
    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Delete the named store and all its entries. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Names of every store currently present.
    async fn names(&self) -> Result<Vec<String>, Error>;

    /// Entries held by the named store, ordered by URL.
    async fn entries(&self, name: &str) -> Result<Vec<StoredEntry>, Error>;
}
