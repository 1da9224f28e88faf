//! Runner error types
//!
//! Every fatal condition of a run is one of these variants. The `Display`
//! text is what gets reported to the host as the failure message.

use std::path::PathBuf;
use std::time::Duration;

use odevio_client::ClientError;
use odevio_core::domain::build::UnsupportedBuildType;
use odevio_core::dto::build::FormError;
use thiserror::Error;

use crate::archive::ArchiveError;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("App key not provided")]
    MissingAppKey,

    #[error("Build type not provided")]
    MissingBuildType,

    #[error(transparent)]
    UnsupportedBuildType(#[from] UnsupportedBuildType),

    #[error(transparent)]
    InvalidField(#[from] FormError),

    #[error("Failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Error starting build (error code {status}): {body}")]
    SubmissionRejected { status: u16, body: String },

    #[error("Error fetching IPA (error code {status}): {body}")]
    ArtifactRejected { status: u16, body: String },

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Build was manually stopped from somewhere else.")]
    BuildStopped,

    #[error("Build {key} did not finish within {}s", .timeout.as_secs())]
    PollTimeout { key: String, timeout: Duration },

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl RunnerError {
    /// Maps a failed submission, keeping the remote status and body
    pub fn submission(err: ClientError) -> Self {
        match err {
            ClientError::ApiError { status, message } => {
                RunnerError::SubmissionRejected { status, body: message }
            }
            other => RunnerError::Client(other),
        }
    }

    /// Maps a failed IPA lookup, keeping the remote status and body
    pub fn artifact(err: ClientError) -> Self {
        match err {
            ClientError::ApiError { status, message } => {
                RunnerError::ArtifactRejected { status, body: message }
            }
            other => RunnerError::Client(other),
        }
    }

    /// Whether the error was raised before anything was written or sent
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            RunnerError::MissingAppKey
                | RunnerError::MissingBuildType
                | RunnerError::UnsupportedBuildType(_)
                | RunnerError::InvalidField(_)
        )
    }
}
