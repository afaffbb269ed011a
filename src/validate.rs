//! Pre-flight destination checks shared by the engines.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// A resolved destination: exactly one of directory or file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Destination {
    /// Entries are materialized under this directory.
    Dir(PathBuf),
    /// Output goes to this single file.
    File(PathBuf),
}

/// Resolves the configured destination pair into a single role.
///
/// Exactly one of the two must be set. The roles swap silently when the
/// filesystem disagrees with the caller: a destination directory that
/// names an existing non-directory is treated as the destination file,
/// and a destination file that names an existing directory is treated as
/// the destination directory. A path that does not exist yet keeps its
/// configured role.
pub(crate) fn resolve_destination(
    dest_dir: Option<&Path>,
    dest_file: Option<&Path>,
) -> Result<Destination> {
    match (dest_dir, dest_file) {
        (None, None) => Err(Error::config(
            "destination is not set; provide a destination directory or file",
        )),
        (Some(_), Some(_)) => Err(Error::config(
            "both destination directory and destination file are set; provide exactly one",
        )),
        (Some(dir), None) => {
            if dir.exists() && !dir.is_dir() {
                log::debug!(
                    "destination directory '{}' is an existing file; treating it as the destination file",
                    dir.display()
                );
                Ok(Destination::File(dir.to_path_buf()))
            } else {
                Ok(Destination::Dir(dir.to_path_buf()))
            }
        }
        (None, Some(file)) => {
            if file.is_dir() {
                log::debug!(
                    "destination file '{}' is an existing directory; treating it as the destination directory",
                    file.display()
                );
                Ok(Destination::Dir(file.to_path_buf()))
            } else {
                Ok(Destination::File(file.to_path_buf()))
            }
        }
    }
}

/// Fails when an existing destination may not be replaced.
pub(crate) fn ensure_overwritable(dest: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && dest.exists() {
        return Err(Error::config(format!(
            "destination '{}' already exists and overwrite is disabled",
            dest.display()
        )));
    }
    Ok(())
}

/// Detects source entries whose backing file is the operation's own output.
///
/// An archive that lists itself as input would otherwise read its own
/// half-written bytes. The check compares canonicalized paths, so renames
/// and `..` spellings of the same file are caught. Paths that do not exist
/// yet cannot collide and are never reported.
#[derive(Debug)]
pub(crate) struct SelfInclusionCheck {
    report: PathBuf,
    protected: Vec<PathBuf>,
}

impl SelfInclusionCheck {
    /// Creates a check guarding the given destination.
    pub(crate) fn new(dest: impl Into<PathBuf>) -> Self {
        let report = dest.into();
        let mut check = Self {
            report,
            protected: Vec::new(),
        };
        let dest = check.report.clone();
        check.add_target(&dest);
        check
    }

    /// Also guards an auxiliary path, e.g. the staging file the output is
    /// assembled in before it replaces the destination.
    pub(crate) fn add_target(&mut self, path: &Path) {
        if let Ok(canonical) = path.canonicalize() {
            self.protected.push(canonical);
        }
    }

    /// Checks one entry's backing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SelfInclusion`] naming the destination when the
    /// file is one of the guarded paths.
    pub(crate) fn check(&self, source: &Path) -> Result<()> {
        if self.protected.is_empty() {
            return Ok(());
        }
        if let Ok(canonical) = source.canonicalize() {
            if self.protected.iter().any(|p| *p == canonical) {
                return Err(Error::SelfInclusion {
                    path: self.report.clone(),
                });
            }
        }
        Ok(())
    }
}
