//! IPA retrieval for finished ad-hoc builds

use odevio_core::domain::artifact::ArtifactDescriptor;
use odevio_core::domain::build::BuildType;
use tracing::info;

use crate::error::RunnerError;
use crate::repository::BuildRepository;

/// Fetches the artifact of a succeeded build, for build types that have one
pub async fn extract(
    repository: &dyn BuildRepository,
    build_type: BuildType,
    key: &str,
) -> Result<Option<ArtifactDescriptor>, RunnerError> {
    if !build_type.produces_artifact() {
        return Ok(None);
    }

    let ipa = repository
        .get_ipa(key)
        .await
        .map_err(RunnerError::artifact)?;
    info!("IPA available at {}", ipa.url);
    Ok(Some(ipa))
}
