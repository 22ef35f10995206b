//! MCP tool implementations.
//!
//! This module contains all tools exposed by the offline-sw host.

pub mod cache;
pub mod worker_fetch;
pub mod worker_status;

pub use worker_fetch::{WorkerFetchOutput, WorkerFetchParams};
