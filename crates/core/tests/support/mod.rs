//! Shared test helpers for `streamgate-core` integration tests.
//!
//! Provides an in-memory subscription registry that records every call so
//! reconcile tests can assert on the exact request sequence.

pub mod registry;
