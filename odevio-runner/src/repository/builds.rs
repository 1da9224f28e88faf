//! Builds repository
//!
//! Handles communication with Odevio for build-related operations:
//! - Submitting a build with its source archive
//! - Fetching the current state of a build
//! - Fetching the IPA of a finished ad-hoc build

use std::path::Path;

use async_trait::async_trait;
use odevio_client::{OdevioClient, Result};
use odevio_core::domain::artifact::ArtifactDescriptor;
use odevio_core::domain::job::BuildJob;
use odevio_core::dto::build::BuildForm;

/// Repository trait for build-related operations
#[async_trait]
pub trait BuildRepository: Send + Sync {
    /// Submits a build
    ///
    /// # Arguments
    /// * `form` - Text fields of the submission
    /// * `archive` - Path of the zipped sources
    async fn create_build(&self, form: &BuildForm, archive: &Path) -> Result<BuildJob>;

    /// Fetches a build by key
    async fn get_build(&self, key: &str) -> Result<BuildJob>;

    /// Fetches the IPA descriptor of a build
    async fn get_ipa(&self, key: &str) -> Result<ArtifactDescriptor>;
}

/// HTTP implementation of BuildRepository
pub struct HttpBuildRepository {
    client: OdevioClient,
}

impl HttpBuildRepository {
    pub fn new(client: OdevioClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BuildRepository for HttpBuildRepository {
    async fn create_build(&self, form: &BuildForm, archive: &Path) -> Result<BuildJob> {
        self.client.create_build(form, archive).await
    }

    async fn get_build(&self, key: &str) -> Result<BuildJob> {
        self.client.get_build(key).await
    }

    async fn get_ipa(&self, key: &str) -> Result<ArtifactDescriptor> {
        self.client.get_ipa(key).await
    }
}
