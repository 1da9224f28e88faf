//! Build parameter resolution
//!
//! Each parameter comes from the explicit input when it is set and not
//! empty, else from the `.odevio` file, else it is unset. Resolution is a
//! pure function of the two sources; reading the file happens elsewhere.

use std::collections::HashMap;
use std::path::PathBuf;

use odevio_core::domain::build::{BuildRequest, BuildType};

use crate::error::RunnerError;

pub const APP_KEY: &str = "app-key";
pub const DIRECTORY: &str = "directory";
pub const BUILD_TYPE: &str = "build-type";
pub const FLUTTER: &str = "flutter";
pub const MINIMAL_IOS_VERSION: &str = "minimal-ios-version";
pub const APP_VERSION: &str = "app-version";
pub const BUILD_NUMBER: &str = "build-number";
pub const MODE: &str = "mode";
pub const TARGET: &str = "target";
pub const FLAVOR: &str = "flavor";
pub const POST_BUILD_COMMAND: &str = "post-build-command";

/// Explicit inputs given to the process
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    values: HashMap<&'static str, String>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` when `value` is present
    pub fn with(mut self, name: &'static str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.values.insert(name, value);
        }
        self
    }

    /// Trimmed, non-empty value of an input
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Parsed `.odevio` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    values: HashMap<String, String>,
}

impl ConfigFile {
    /// Parses `name=value` lines
    ///
    /// The first `=` separates name from value. Lines without one are
    /// ignored and later duplicates win.
    pub fn parse(raw: &str) -> Self {
        let values = raw
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Self { values }
    }

    /// Non-empty value of a parameter
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Merges explicit inputs over the config file
pub struct ParameterResolver<'a> {
    inputs: &'a Inputs,
    file: Option<&'a ConfigFile>,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(inputs: &'a Inputs, file: Option<&'a ConfigFile>) -> Self {
        Self { inputs, file }
    }

    /// Value of a parameter by precedence
    pub fn get(&self, name: &str) -> Option<String> {
        self.inputs
            .get(name)
            .or_else(|| self.file.and_then(|file| file.get(name)))
            .map(str::to_string)
    }

    /// Builds and validates the request
    ///
    /// Only the app key and build type are checked here.
    pub fn resolve(&self) -> Result<BuildRequest, RunnerError> {
        let app_key = self.get(APP_KEY).ok_or(RunnerError::MissingAppKey)?;
        let build_type: BuildType = self
            .get(BUILD_TYPE)
            .ok_or(RunnerError::MissingBuildType)?
            .parse()?;

        Ok(BuildRequest {
            app_key,
            directory: self.get(DIRECTORY).map(PathBuf::from),
            build_type,
            flutter_version: self.get(FLUTTER),
            minimal_ios_version: self.get(MINIMAL_IOS_VERSION),
            app_version: self.get(APP_VERSION),
            build_number: self.get(BUILD_NUMBER),
            mode: self.get(MODE),
            target: self.get(TARGET),
            flavor: self.get(FLAVOR),
            post_build_command: self.get(POST_BUILD_COMMAND),
        })
    }
}
