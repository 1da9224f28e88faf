//! Runner configuration
//!
//! Settings that are not part of the build request itself: where the API
//! lives, how to authenticate, where the archive is written and how the
//! build is polled.

use std::path::{Path, PathBuf};
use std::time::Duration;

use odevio_client::DEFAULT_API_URL;
use odevio_core::domain::build::BuildRequest;

use crate::scheduler::PollPolicy;

/// Name of the archive written in the working directory
pub const ARCHIVE_FILE_NAME: &str = ".app.zip";

/// Archives must stay strictly below this size to be submitted
pub const MAX_ARCHIVE_BYTES: u64 = 500_000_000;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Odevio API root (e.g., "https://odevio.com/api/v1")
    pub api_url: String,

    /// Odevio API key
    pub api_key: String,

    /// Directory the process runs in; relative paths resolve against it
    pub working_dir: PathBuf,

    /// Delay between two status requests
    pub poll_interval: Duration,

    /// Give up waiting for the build after this long; unbounded when unset
    pub poll_timeout: Option<Duration>,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(api_key: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            working_dir: working_dir.into(),
            poll_interval: Duration::from_secs(5),
            poll_timeout: None,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Option<Duration>) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    /// Where the source archive is written
    pub fn archive_path(&self) -> PathBuf {
        self.working_dir.join(ARCHIVE_FILE_NAME)
    }

    /// Directory whose entries go into the archive
    pub fn source_dir(&self, request: &BuildRequest) -> PathBuf {
        match request.directory.as_deref() {
            Some(directory) => resolve(&self.working_dir, directory),
            None => self.working_dir.clone(),
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            timeout: self.poll_timeout,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            anyhow::bail!("API key not provided");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.poll_timeout.is_some_and(|timeout| timeout.is_zero()) {
            anyhow::bail!("poll_timeout must be greater than 0");
        }

        Ok(())
    }
}

/// Joins `path` onto `base` unless it is already absolute
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
