//! Build artifact domain types

use serde::{Deserialize, Serialize};

/// Download location of the IPA produced by an ad-hoc build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub url: String,
}
