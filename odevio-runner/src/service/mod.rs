//! Service layer
//!
//! Services chain the run stages together on top of the build repository.

pub mod artifact;
mod pipeline;

pub use pipeline::{BuildOutcome, BuildPipeline};
