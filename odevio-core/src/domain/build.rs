//! Build request domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Kind of remote build to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildType {
    /// Build and publish to App Store Connect
    Publication,
    /// Build a signed IPA that can be downloaded afterwards
    AdHoc,
    /// Build and validate without publishing
    Validation,
}

impl BuildType {
    /// All supported build types
    pub const ALL: [BuildType; 3] = [BuildType::Publication, BuildType::AdHoc, BuildType::Validation];

    /// Wire name of the build type
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Publication => "publication",
            BuildType::AdHoc => "ad-hoc",
            BuildType::Validation => "validation",
        }
    }

    /// Whether a finished build of this type has a downloadable artifact
    pub fn produces_artifact(&self) -> bool {
        matches!(self, BuildType::AdHoc)
    }

    /// Human-readable description of what the build does to an app
    pub fn action_description(&self) -> &'static str {
        match self {
            BuildType::Publication => "Publishing app",
            BuildType::AdHoc => "Building IPA of app",
            BuildType::Validation => "Validating app",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown build type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported build type '{0}'")]
pub struct UnsupportedBuildType(pub String);

impl FromStr for BuildType {
    type Err = UnsupportedBuildType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildType::ALL
            .into_iter()
            .find(|build_type| build_type.as_str() == s)
            .ok_or_else(|| UnsupportedBuildType(s.to_string()))
    }
}

/// A fully resolved request for a remote build
///
/// Built once from inputs and the project config file, then only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Key of the Odevio application to build
    pub app_key: String,
    /// Source directory; the working directory when unset
    pub directory: Option<PathBuf>,
    pub build_type: BuildType,
    pub flutter_version: Option<String>,
    pub minimal_ios_version: Option<String>,
    pub app_version: Option<String>,
    /// Passed through as supplied, converted to an integer on submission
    pub build_number: Option<String>,
    pub mode: Option<String>,
    pub target: Option<String>,
    pub flavor: Option<String>,
    pub post_build_command: Option<String>,
}

impl BuildRequest {
    /// Creates a request with only the required fields set
    pub fn new(app_key: impl Into<String>, build_type: BuildType) -> Self {
        Self {
            app_key: app_key.into(),
            directory: None,
            build_type,
            flutter_version: None,
            minimal_ios_version: None,
            app_version: None,
            build_number: None,
            mode: None,
            target: None,
            flavor: None,
            post_build_command: None,
        }
    }
}
