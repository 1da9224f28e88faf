//! Build poller
//!
//! Re-fetches a build with a fixed delay until it succeeds, fails or is
//! stopped. A status request that fails ends the wait; nothing is retried.

use std::sync::Arc;

use odevio_core::domain::job::{BuildJob, JobStatus};
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info};

use crate::error::RunnerError;
use crate::repository::BuildRepository;

/// How a build is waited on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay before each status request
    pub interval: Duration,
    /// Deadline for the whole wait; unbounded when unset
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: None,
        }
    }
}

/// Drives one submitted build to a terminal status
pub struct JobPoller {
    repository: Arc<dyn BuildRepository>,
    policy: PollPolicy,
}

impl JobPoller {
    pub fn new(repository: Arc<dyn BuildRepository>, policy: PollPolicy) -> Self {
        Self { repository, policy }
    }

    /// Waits until the build reaches a terminal status
    ///
    /// Starts from the status reported at submission. Every non-terminal
    /// observation costs exactly one delay and one status request.
    ///
    /// # Returns
    /// The succeeded build; failed and stopped builds are errors
    pub async fn wait_for_completion(&self, submitted: BuildJob) -> Result<BuildJob, RunnerError> {
        let key = submitted.key.clone();
        let started = Instant::now();
        let mut build = submitted;
        let mut polls: u64 = 0;

        loop {
            match build.status() {
                JobStatus::Succeeded => {
                    info!("Build succeeded");
                    return Ok(build);
                }
                JobStatus::Failed => {
                    return Err(RunnerError::BuildFailed(
                        build
                            .error_message
                            .unwrap_or_else(|| "no error message given".to_string()),
                    ));
                }
                JobStatus::Stopped => return Err(RunnerError::BuildStopped),
                JobStatus::Running => {
                    debug!(
                        "Build {} is {} after {} poll(s)",
                        key,
                        build.status_code.as_deref().unwrap_or("pending"),
                        polls
                    );
                }
            }

            if let Some(timeout) = self.policy.timeout {
                if started.elapsed() + self.policy.interval > timeout {
                    return Err(RunnerError::PollTimeout { key, timeout });
                }
            }

            time::sleep(self.policy.interval).await;
            polls += 1;
            build = self.repository.get_build(&key).await?;
        }
    }
}
