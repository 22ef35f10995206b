//! Core types and shared functionality for offline-sw.
//!
//! This crate provides:
//! - The offline worker: install, activate and network-first fetch handlers
//! - Host lifecycle sequencing via [`Registration`]
//! - Versioned response stores with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod store;
pub mod worker;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Request, Response};
pub use network::{Network, NetworkError};
pub use store::{CacheName, MemoryStore, SqliteStore, Store, StoredEntry};
pub use worker::{
    ControlSignals, Controller, FetchDisposition, FetchOutcome, PassThroughReason, Registration, RegistrationStatus,
    Worker, WorkerConfig, WorkerState,
};
