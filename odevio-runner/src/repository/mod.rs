//! Repository layer
//!
//! Repositories are thin adapters over the Odevio API. They carry no
//! business logic; the poller and pipeline only see the trait so they can
//! run against an in-memory fake in tests.

mod builds;
#[cfg(test)]
pub mod fake;

pub use builds::{BuildRepository, HttpBuildRepository};
