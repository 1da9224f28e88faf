//! Build scheduling
//!
//! Waits on a submitted build until Odevio reports a terminal status.

pub mod poller;

pub use poller::{JobPoller, PollPolicy};
