//! Data Transfer Objects for the Odevio API
//!
//! Mappings from domain types to the field names the remote service expects.

pub mod build;
