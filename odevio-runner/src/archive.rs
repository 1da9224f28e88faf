//! Source archive builder
//!
//! Zips the top-level entries of a source directory that the ignore rules
//! let through. Included directories are added with their whole subtree;
//! nothing below the top level is matched against the rules.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::ignore::IgnoreRules;

/// Deflate level used for every entry
const COMPRESSION_LEVEL: i64 = 6;

/// Errors that abort archive construction
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Failed to list source directory {}: {source}", .path.display())]
    ReadSourceDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Zip: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Zip: {0}")]
    Io(#[from] io::Error),

    #[error(
        "Zipped directory size exceeds 500MB, very large applications are not supported by Odevio. \
         Make sure that all files and directories not needed to build are listed in .odevioignore \
         (archive is {size} bytes)"
    )]
    TooLarge { size: u64 },
}

/// A finished archive on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub path: PathBuf,
    /// Size of the closed file, in bytes
    pub size: u64,
}

impl Archive {
    /// Fails unless the archive is strictly smaller than `limit`
    pub fn check_size_limit(&self, limit: u64) -> Result<(), ArchiveError> {
        if self.size >= limit {
            return Err(ArchiveError::TooLarge { size: self.size });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

/// Top-level entry selected for the archive
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    path: PathBuf,
    kind: EntryKind,
}

/// Builds the source archive of a run
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    source_dir: PathBuf,
    output: PathBuf,
    rules: IgnoreRules,
}

impl ArchiveBuilder {
    pub fn new(source_dir: impl Into<PathBuf>, output: impl Into<PathBuf>, rules: IgnoreRules) -> Self {
        Self {
            source_dir: source_dir.into(),
            output: output.into(),
            rules,
        }
    }

    /// Writes the archive and waits until the file is closed
    ///
    /// The blocking zip work runs on tokio's blocking pool.
    pub async fn build(self) -> Result<Archive, ArchiveError> {
        tokio::task::spawn_blocking(move || self.build_blocking())
            .await
            .map_err(|e| ArchiveError::Io(io::Error::other(e)))?
    }

    /// Writes the archive, overwriting any previous one at the output path
    pub fn build_blocking(&self) -> Result<Archive, ArchiveError> {
        let entries = self.select_entries()?;
        debug!(
            "Archiving {} top-level entries of {}",
            entries.len(),
            self.source_dir.display()
        );

        let mut zip = ZipWriter::new(BufWriter::new(File::create(&self.output)?));
        for entry in &entries {
            match entry.kind {
                EntryKind::Directory => add_tree(&mut zip, &entry.path, &entry.name)?,
                EntryKind::File => add_file(&mut zip, &entry.path, entry.name.clone())?,
            }
        }

        let mut file = zip.finish()?.into_inner().map_err(|e| e.into_error())?;
        file.flush()?;
        file.sync_all()?;
        drop(file);

        let size = fs::metadata(&self.output)?.len();
        debug!("Wrote {} ({} bytes)", self.output.display(), size);

        Ok(Archive {
            path: self.output.clone(),
            size,
        })
    }

    /// Top-level entries that pass the ignore rules, sorted by name
    fn select_entries(&self) -> Result<Vec<Entry>, ArchiveError> {
        let read_dir = fs::read_dir(&self.source_dir).map_err(|source| ArchiveError::ReadSourceDir {
            path: self.source_dir.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = match dir_entry {
                Ok(dir_entry) => dir_entry,
                Err(err) => {
                    warn!("Zip: {}", err);
                    continue;
                }
            };

            let path = dir_entry.path();
            if path == self.output {
                continue;
            }

            let name = dir_entry.file_name().to_string_lossy().into_owned();
            let kind = if dir_entry.file_type()?.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            let excluded = match kind {
                EntryKind::Directory => self.rules.is_dir_excluded(&name),
                EntryKind::File => self.rules.is_file_excluded(&name),
            };
            if excluded {
                debug!("Excluding {}", name);
                continue;
            }

            entries.push(Entry { name, path, kind });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

fn base_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL))
}

/// Adds a directory and everything below it under `name`
fn add_tree<W: Write + io::Seek>(zip: &mut ZipWriter<W>, root: &Path, name: &str) -> Result<(), ArchiveError> {
    for item in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                warn!("Zip: {}", err);
                continue;
            }
        };

        let Ok(relative) = item.path().strip_prefix(root) else {
            continue;
        };
        let archived = std::iter::once(name.to_string())
            .chain(
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned()),
            )
            .collect::<Vec<_>>()
            .join("/");

        let file_type = item.file_type();
        if file_type.is_dir() {
            zip.add_directory(archived, base_options())?;
        } else {
            add_file(zip, item.path(), archived)?;
        }
    }
    Ok(())
}

/// Adds a single file or symlink under `name`
fn add_file<W: Write + io::Seek>(zip: &mut ZipWriter<W>, path: &Path, name: String) -> Result<(), ArchiveError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("Zip: {} disappeared while archiving", path.display());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if metadata.file_type().is_symlink() {
        let target = fs::read_link(path)?;
        zip.add_symlink(name, target.to_string_lossy().into_owned(), base_options())?;
        return Ok(());
    }

    let mut source = match File::open(path) {
        Ok(source) => source,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("Zip: {} disappeared while archiving", path.display());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let mut options = base_options().large_file(metadata.len() >= u64::from(u32::MAX));
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options = options.unix_permissions(metadata.permissions().mode());
    }

    zip.start_file(name, options)?;
    io::copy(&mut source, zip)?;
    Ok(())
}
