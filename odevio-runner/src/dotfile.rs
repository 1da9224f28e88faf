//! Project dotfiles
//!
//! `.odevio` and `.odevioignore` are looked up in the target directory
//! first, then in the working directory. A missing file is not an error.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::resolve;
use crate::error::RunnerError;

/// Key=value defaults for build parameters
pub const CONFIG_FILE: &str = ".odevio";

/// Extra names to leave out of the source archive
pub const IGNORE_FILE: &str = ".odevioignore";

/// Candidate locations of a dotfile, in lookup order
fn candidates(name: &str, directory: Option<&Path>, working_dir: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);
    if let Some(directory) = directory {
        paths.push(resolve(working_dir, directory).join(name));
    }
    let fallback = working_dir.join(name);
    if !paths.contains(&fallback) {
        paths.push(fallback);
    }
    paths
}

/// Reads the first dotfile found
pub fn read(
    name: &str,
    directory: Option<&Path>,
    working_dir: &Path,
) -> Result<Option<String>, RunnerError> {
    let Some(path) = candidates(name, directory, working_dir)
        .into_iter()
        .find(|path| path.is_file())
    else {
        debug!("No {} file found", name);
        return Ok(None);
    };

    debug!("Reading {}", path.display());
    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|source| RunnerError::ReadFile { path, source })
}
