//! Shared test helpers for `orderbridge-core` integration tests.
//!
//! In-memory stand-ins for every port so the engine and bridge tests can
//! focus on behaviour instead of plumbing.

#![allow(dead_code)]

pub mod fixtures;
pub mod invoicing;
pub mod queue;
pub mod sources;
pub mod vault;
