//! Build pipeline
//!
//! Runs one build end to end:
//! - Turning the request into the submission form
//! - Zipping the sources and enforcing the size ceiling
//! - Submitting the build and waiting for it to finish
//! - Fetching the IPA of ad-hoc builds
//!
//! Every stage stops the run on error; nothing is sent once a local stage
//! has failed.

use std::sync::Arc;

use odevio_core::domain::artifact::ArtifactDescriptor;
use odevio_core::domain::build::BuildRequest;
use odevio_core::domain::job::BuildJob;
use odevio_core::dto::build::BuildForm;
use tracing::{debug, info};

use crate::archive::ArchiveBuilder;
use crate::config::{Config, MAX_ARCHIVE_BYTES};
use crate::dotfile::{self, IGNORE_FILE};
use crate::error::RunnerError;
use crate::ignore::IgnoreRules;
use crate::repository::BuildRepository;
use crate::scheduler::JobPoller;
use crate::service::artifact;

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub job: BuildJob,
    /// Only set for ad-hoc builds
    pub artifact: Option<ArtifactDescriptor>,
}

pub struct BuildPipeline {
    config: Config,
    repository: Arc<dyn BuildRepository>,
    size_limit: u64,
}

impl BuildPipeline {
    pub fn new(config: Config, repository: Arc<dyn BuildRepository>) -> Self {
        Self {
            config,
            repository,
            size_limit: MAX_ARCHIVE_BYTES,
        }
    }

    #[cfg(test)]
    fn with_size_limit(mut self, size_limit: u64) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Runs the build described by `request`
    pub async fn run(&self, request: &BuildRequest) -> Result<BuildOutcome, RunnerError> {
        info!(
            "{} with key {}",
            request.build_type.action_description(),
            request.app_key
        );

        let form = BuildForm::from_request(request)?;

        let ignore_file = dotfile::read(
            IGNORE_FILE,
            request.directory.as_deref(),
            &self.config.working_dir,
        )?;
        let rules = IgnoreRules::from_ignore_file(ignore_file.as_deref());
        debug!(
            "Excluded files: {:?}, excluded directories: {:?}",
            rules.excluded_files().collect::<Vec<_>>(),
            rules.excluded_dirs().collect::<Vec<_>>()
        );

        let archive = ArchiveBuilder::new(
            self.config.source_dir(request),
            self.config.archive_path(),
            rules,
        )
        .build()
        .await?;
        archive.check_size_limit(self.size_limit)?;
        info!("Source archive is {} bytes", archive.size);

        let submitted = self
            .repository
            .create_build(&form, &archive.path)
            .await
            .map_err(RunnerError::submission)?;
        let key = submitted.key.clone();

        let job = JobPoller::new(self.repository.clone(), self.config.poll_policy())
            .wait_for_completion(submitted)
            .await?;

        let artifact = artifact::extract(self.repository.as_ref(), request.build_type, &key).await?;

        Ok(BuildOutcome { job, artifact })
    }
}
