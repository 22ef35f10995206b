//! Client code for offline-sw.
//!
//! This crate provides the HTTP [`offline_core::Network`] backend the worker
//! uses to reach the origin.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork, content_type};
