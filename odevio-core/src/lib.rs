//! Odevio Core
//!
//! Core types and abstractions shared by the Odevio build client and runner.
//!
//! This crate contains:
//! - Domain types: build requests, remote build jobs, artifacts
//! - DTOs: the wire representation of a build submission

pub mod domain;
pub mod dto;
