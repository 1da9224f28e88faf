//! Ignore rules for the source archive
//!
//! Rules only ever name top-level entries of the source directory. A line
//! ending in `/` names a directory, any other non-empty line names a file.

use std::collections::BTreeSet;

/// Files never sent to Odevio
pub const DEFAULT_EXCLUDED_FILES: &[&str] = &["source.zip", ".app.zip", "odevio.patch"];

/// Directories never sent to Odevio
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "build",
    "windows",
    "linux",
    "android",
    "web",
    ".dart_tool",
    ".pub-cache",
    ".pub",
    ".git",
    ".gradle",
];

/// Resolved exclusion sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRules {
    excluded_files: BTreeSet<String>,
    excluded_dirs: BTreeSet<String>,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            excluded_files: DEFAULT_EXCLUDED_FILES.iter().map(|s| s.to_string()).collect(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl IgnoreRules {
    /// Defaults plus the rules of an ignore file, if there is one
    pub fn from_ignore_file(raw: Option<&str>) -> Self {
        let mut rules = Self::default();
        if let Some(raw) = raw {
            rules.extend(raw);
        }
        rules
    }

    fn extend(&mut self, raw: &str) {
        for line in raw.lines() {
            if line.is_empty() {
                continue;
            }
            match line.strip_suffix('/') {
                Some(dir) => self.excluded_dirs.insert(dir.to_string()),
                None => self.excluded_files.insert(line.to_string()),
            };
        }
    }

    pub fn is_file_excluded(&self, name: &str) -> bool {
        self.excluded_files.contains(name)
    }

    pub fn is_dir_excluded(&self, name: &str) -> bool {
        self.excluded_dirs.contains(name)
    }

    pub fn excluded_files(&self) -> impl Iterator<Item = &str> {
        self.excluded_files.iter().map(String::as_str)
    }

    pub fn excluded_dirs(&self) -> impl Iterator<Item = &str> {
        self.excluded_dirs.iter().map(String::as_str)
    }
}
