//! Core domain types
//!
//! These types describe a remote build as seen from this side of the wire:
//! what is requested, what the service reports back, and what it produces.

pub mod artifact;
pub mod build;
pub mod job;
