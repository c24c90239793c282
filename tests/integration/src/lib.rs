//! Integration test utilities for the query gateway
//!
//! This crate provides helpers for running end-to-end tests against the
//! REST API. The tests run without a database: the server is configured
//! against an unreachable endpoint, which is exactly what the fail-closed
//! paths (health, validation, error envelopes) need.

pub mod helpers;

pub use helpers::*;
