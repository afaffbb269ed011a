//! Parallel directory-to-directory copying.

use crate::entry::{ContentSource, Entry, EntryKind};
use crate::meta;
use crate::session::Session;
use crate::write::{ArchiveOptions, ArchiveResult};
use crate::{EntrySource, Error, Result, TaskOutcome};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Mirrors an entry tree into a plain destination directory.
///
/// Works like [`ZipArchiver`](crate::ZipArchiver) without the container:
/// one copy task per entry, run on the worker pool. Targets whose
/// modification time is at least as new as the entry's are skipped, so a
/// repeat run only copies what changed.
#[derive(Debug, Clone)]
pub struct DirArchiver {
    dest: PathBuf,
}

impl DirArchiver {
    /// Creates an archiver that copies into the directory at `dest`.
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }

    /// The destination directory.
    pub fn destination(&self) -> &Path {
        &self.dest
    }

    /// Copies every entry the source yields into the destination.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when the destination exists and
    /// is not a directory, [`Error::EmptyArchive`] for a source that
    /// yields nothing without claiming virtual content, and
    /// [`Error::SelfInclusion`] when an entry would be copied onto
    /// itself or the destination sits inside a directory being copied.
    /// The first per-entry failure surfaces as [`Error::TaskExecution`]
    /// once every running task has been joined.
    pub fn archive<S: EntrySource>(
        &self,
        source: S,
        options: &ArchiveOptions,
    ) -> Result<ArchiveResult> {
        source.validate()?;
        if self.dest.exists() && !self.dest.is_dir() {
            return Err(Error::config(format!(
                "destination '{}' exists and is not a directory",
                self.dest.display()
            )));
        }
        meta::ensure_dir(&self.dest)?;
        let dest_real = self.dest.canonicalize().ok();

        let mut session = Session::new(options.threads)?;
        let preserve = options.preserve_permissions;
        let overwrite = options.overwrite;
        let mut dispatch_error = None;
        let mut dispatched = 0usize;

        match source.entries() {
            Err(err) => dispatch_error = Some(err),
            Ok(entries) => {
                for item in entries {
                    let entry = match item {
                        Ok(entry) => entry,
                        Err(err) => {
                            dispatch_error = Some(err);
                            break;
                        }
                    };
                    let target = self.dest.join(entry.name.as_str());
                    if let ContentSource::Path(src) = &entry.content {
                        if same_object(src, &target) {
                            dispatch_error = Some(Error::SelfInclusion { path: target });
                            break;
                        }
                        if entry.kind == EntryKind::Directory
                            && contains_destination(src, dest_real.as_deref())
                        {
                            dispatch_error = Some(Error::SelfInclusion {
                                path: self.dest.clone(),
                            });
                            break;
                        }
                    }
                    let label = entry.name.to_string();
                    session.submit(label, move || copy_entry(entry, &target, overwrite, preserve));
                    dispatched += 1;
                }
            }
        }

        let joined = session.close();
        if let Some(err) = dispatch_error {
            if let Err(join_err) = joined {
                log::debug!("join failure superseded by dispatch error: {join_err}");
            }
            return Err(err);
        }
        let summary = joined?;

        if dispatched == 0 && !source.has_virtual_content() {
            return Err(Error::EmptyArchive);
        }

        Ok(ArchiveResult::from(summary))
    }
}

/// True when both paths resolve to the same existing filesystem object.
fn same_object(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// True when the destination directory lives inside the directory at `src`.
///
/// Copying such a directory would sweep already-copied output back into
/// the copy.
fn contains_destination(src: &Path, dest_real: Option<&Path>) -> bool {
    match (src.canonicalize(), dest_real) {
        (Ok(src), Some(dest)) => dest.starts_with(src),
        _ => false,
    }
}

fn copy_entry(
    entry: Entry,
    target: &Path,
    overwrite: bool,
    preserve_permissions: bool,
) -> Result<TaskOutcome> {
    match entry.kind {
        EntryKind::Directory => {
            meta::ensure_dir(target)?;
            if preserve_permissions {
                if let Some(mode) = entry.mode {
                    meta::apply_permissions(target, mode);
                }
            }
            Ok(TaskOutcome::Written { bytes: 0 })
        }
        EntryKind::Symlink => copy_symlink(&entry, target, overwrite),
        EntryKind::File => copy_file(&entry, target, overwrite, preserve_permissions),
    }
}

fn copy_file(
    entry: &Entry,
    target: &Path,
    overwrite: bool,
    preserve_permissions: bool,
) -> Result<TaskOutcome> {
    if let Ok(existing) = target.metadata() {
        if !overwrite {
            log::debug!(
                "entry '{}' skipped: target exists and overwrite is disabled",
                entry.name
            );
            return Ok(TaskOutcome::Skipped);
        }
        if up_to_date(entry.modified, &existing) {
            log::debug!("entry '{}' skipped: target is up to date", entry.name);
            return Ok(TaskOutcome::Skipped);
        }
    }

    meta::ensure_parent_dir(target)?;
    let mut reader = entry.content.open()?;
    let mut out = File::create(target)?;
    let bytes = meta::copy_streaming(&mut *reader, &mut out)?;
    drop(out);

    meta::apply_mtime(target, entry.modified.unwrap_or_else(SystemTime::now));
    if preserve_permissions {
        if let Some(mode) = entry.mode {
            meta::apply_permissions(target, mode);
        }
    }
    Ok(TaskOutcome::Written { bytes })
}

fn up_to_date(source_modified: Option<SystemTime>, existing: &fs::Metadata) -> bool {
    let Some(source) = source_modified else {
        return false;
    };
    match existing.modified() {
        Ok(target) => target >= source,
        Err(_) => false,
    }
}

fn copy_symlink(entry: &Entry, target: &Path, overwrite: bool) -> Result<TaskOutcome> {
    let link_target = entry.link_target.as_deref().ok_or_else(|| {
        Error::config(format!("symlink entry '{}' has no target", entry.name))
    })?;
    if target.symlink_metadata().is_ok() {
        if !overwrite {
            log::debug!(
                "entry '{}' skipped: target exists and overwrite is disabled",
                entry.name
            );
            return Ok(TaskOutcome::Skipped);
        }
        fs::remove_file(target)?;
    }
    meta::ensure_parent_dir(target)?;
    meta::materialize_symlink(link_target, target)?;
    Ok(TaskOutcome::Written { bytes: 0 })
}
