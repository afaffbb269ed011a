//! Parallel extraction of ZIP archives.

use crate::entry::EntryKind;
use crate::meta;
use crate::read::{ExtractOptions, ExtractResult};
use crate::session::Session;
use crate::validate::{self, Destination};
use crate::zipfs::{EntryData, TreeEntry, ZipTree};
use crate::{EntrySelector, Error, Result, TaskOutcome};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extracts entries from a ZIP archive onto the filesystem, decompressing
/// them on a worker pool.
///
/// The container is opened once and its entry tree walked in a single
/// pass; each selected entry becomes one independent task reading from a
/// shared view of the archive. The destination is set with
/// [`dest_dir`](Self::dest_dir) or [`dest_file`](Self::dest_file); when
/// the configured role disagrees with what is on disk, the roles swap
/// silently (an existing file named as the directory is treated as the
/// single-file destination, and the other way around).
///
/// ```no_run
/// use parzip::{ExtractOptions, ZipUnarchiver};
///
/// # fn main() -> parzip::Result<()> {
/// let result = ZipUnarchiver::new("assets.zip")
///     .dest_dir("unpacked")
///     .extract((), &ExtractOptions::default())?;
/// println!("extracted {} entries", result.entries_written);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ZipUnarchiver {
    archive: PathBuf,
    dest_dir: Option<PathBuf>,
    dest_file: Option<PathBuf>,
}

impl ZipUnarchiver {
    /// Creates an unarchiver reading the archive at `archive`.
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            dest_dir: None,
            dest_file: None,
        }
    }

    /// Sets the directory entries are extracted under.
    pub fn dest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dest_dir = Some(dir.into());
        self
    }

    /// Sets the single file an entry's content is extracted to.
    pub fn dest_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.dest_file = Some(file.into());
        self
    }

    /// The archive being read.
    pub fn source(&self) -> &Path {
        &self.archive
    }

    /// Extracts every entry the selector accepts.
    ///
    /// Entries whose stored name is unusable (absolute after stripping,
    /// traversal segments, illegal characters) are discarded with a
    /// warning and never touch the filesystem.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when no destination (or both) is
    /// set, [`Error::Open`] when the archive cannot be read, and
    /// [`Error::Selector`] when the selector itself fails. The first
    /// per-entry failure surfaces as [`Error::TaskExecution`] after every
    /// running task has been joined.
    pub fn extract<S: EntrySelector>(
        &self,
        selector: S,
        options: &ExtractOptions,
    ) -> Result<ExtractResult> {
        let destination =
            validate::resolve_destination(self.dest_dir.as_deref(), self.dest_file.as_deref())?;
        let tree = ZipTree::open(&self.archive)?;
        if let Destination::Dir(dir) = &destination {
            meta::ensure_dir(dir)?;
        }

        let mut session = Session::new(options.threads)?;
        let mut dispatch_error = None;

        for tree_entry in tree.entries() {
            let Some(entry) = tree_entry.to_entry() else {
                if !is_root_marker(&tree_entry.raw_name) {
                    log::warn!(
                        "discarding entry with unusable name {:?} from '{}'",
                        tree_entry.raw_name,
                        self.archive.display()
                    );
                }
                continue;
            };
            match selector.select(&entry) {
                Ok(true) => {}
                Ok(false) => {
                    log::debug!("entry '{}' excluded by selector", entry.name);
                    continue;
                }
                Err(source) => {
                    dispatch_error = Some(Error::Selector {
                        entry: entry.name.to_string(),
                        source,
                    });
                    break;
                }
            }
            if matches!(destination, Destination::File(_))
                && tree_entry.kind == EntryKind::Directory
            {
                log::debug!(
                    "entry '{}' skipped: single-file destination takes no directories",
                    entry.name
                );
                continue;
            }
            if let Err(err) = dispatch(&mut session, &tree, tree_entry, &destination, options) {
                dispatch_error = Some(err);
                break;
            }
        }

        close_joined(session, dispatch_error)
    }

    /// Extracts the single entry stored under `name`.
    ///
    /// The name is matched against sanitized names first, then against
    /// raw stored names.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when the entry does not exist;
    /// otherwise like [`extract`](Self::extract).
    pub fn extract_path(&self, name: &str, options: &ExtractOptions) -> Result<ExtractResult> {
        let destination =
            validate::resolve_destination(self.dest_dir.as_deref(), self.dest_file.as_deref())?;
        let tree = ZipTree::open(&self.archive)?;
        let Some(tree_entry) = tree.find(name) else {
            return Err(Error::config(format!(
                "entry '{}' not found in '{}'",
                name,
                self.archive.display()
            )));
        };
        if tree_entry.name.is_none() {
            return Err(Error::config(format!(
                "entry '{}' has an unusable stored name",
                name
            )));
        }
        if let Destination::Dir(dir) = &destination {
            meta::ensure_dir(dir)?;
        }

        let mut session = Session::new(options.threads)?;
        let dispatch_error = dispatch(&mut session, &tree, tree_entry, &destination, options).err();
        close_joined(session, dispatch_error)
    }
}

/// Queues one extraction task for a tree entry with a usable name.
fn dispatch(
    session: &mut Session,
    tree: &ZipTree,
    tree_entry: &TreeEntry,
    destination: &Destination,
    options: &ExtractOptions,
) -> Result<()> {
    let Some(name) = &tree_entry.name else {
        return Ok(());
    };
    let target = match destination {
        Destination::Dir(dir) => dir.join(name.as_str()),
        Destination::File(file) => file.clone(),
    };
    let data = match tree_entry.kind {
        EntryKind::Directory => None,
        _ => Some(tree.entry_data(tree_entry)?),
    };
    let tree_entry = tree_entry.clone();
    let overwrite = options.overwrite;
    let preserve = options.preserve_permissions;
    let verify = options.verify_crc;
    session.submit(name.as_str(), move || {
        extract_entry(&tree_entry, data, &target, overwrite, preserve, verify)
    });
    Ok(())
}

/// Joins a session, letting a dispatch-phase error take precedence over
/// whatever the join reports.
fn close_joined(session: Session, dispatch_error: Option<Error>) -> Result<ExtractResult> {
    let joined = session.close();
    if let Some(err) = dispatch_error {
        if let Err(join_err) = joined {
            log::debug!("join failure superseded by dispatch error: {join_err}");
        }
        return Err(err);
    }
    Ok(ExtractResult::from(joined?))
}

/// True for stored names that normalize to the archive root, such as `/`
/// or `./`. These carry no payload and are dropped without a warning.
fn is_root_marker(raw: &str) -> bool {
    raw.split('/').all(|segment| segment.is_empty() || segment == ".")
}

fn extract_entry(
    tree_entry: &TreeEntry,
    data: Option<EntryData>,
    target: &Path,
    overwrite: bool,
    preserve_permissions: bool,
    verify_crc: bool,
) -> Result<TaskOutcome> {
    match tree_entry.kind {
        EntryKind::Directory => {
            meta::ensure_dir(target)?;
            if preserve_permissions {
                if let Some(mode) = tree_entry.mode {
                    meta::apply_permissions(target, mode);
                }
            }
            Ok(TaskOutcome::Written { bytes: 0 })
        }
        EntryKind::Symlink => extract_symlink(tree_entry, data, target, overwrite),
        EntryKind::File => extract_file(
            tree_entry,
            data,
            target,
            overwrite,
            preserve_permissions,
            verify_crc,
        ),
    }
}

fn extract_file(
    tree_entry: &TreeEntry,
    data: Option<EntryData>,
    target: &Path,
    overwrite: bool,
    preserve_permissions: bool,
    verify_crc: bool,
) -> Result<TaskOutcome> {
    if !overwrite && target.symlink_metadata().is_ok() {
        log::debug!(
            "entry '{}' skipped: target exists and overwrite is disabled",
            tree_entry.raw_name
        );
        return Ok(TaskOutcome::Skipped);
    }
    let data = data.ok_or_else(|| missing_payload(tree_entry))?;

    meta::ensure_parent_dir(target)?;
    let mut reader = data.reader()?;
    let mut out = File::create(target)?;
    let (bytes, crc) = meta::copy_checked(&mut *reader, &mut out)?;
    drop(out);

    if verify_crc && crc != tree_entry.crc32 {
        return Err(Error::CrcMismatch {
            entry: tree_entry.raw_name.clone(),
            expected: tree_entry.crc32,
            actual: crc,
        });
    }

    meta::apply_mtime(target, tree_entry.modified.unwrap_or_else(SystemTime::now));
    if preserve_permissions {
        if let Some(mode) = tree_entry.mode {
            meta::apply_permissions(target, mode);
        }
    }
    Ok(TaskOutcome::Written { bytes })
}

fn extract_symlink(
    tree_entry: &TreeEntry,
    data: Option<EntryData>,
    target: &Path,
    overwrite: bool,
) -> Result<TaskOutcome> {
    let data = data.ok_or_else(|| missing_payload(tree_entry))?;
    let mut payload = Vec::new();
    data.reader()?.read_to_end(&mut payload)?;
    let link_target = String::from_utf8(payload).map_err(|_| {
        Error::Io(io::Error::other(format!(
            "symlink target for '{}' is not valid UTF-8",
            tree_entry.raw_name
        )))
    })?;

    if target.symlink_metadata().is_ok() {
        if !overwrite {
            log::debug!(
                "entry '{}' skipped: target exists and overwrite is disabled",
                tree_entry.raw_name
            );
            return Ok(TaskOutcome::Skipped);
        }
        fs::remove_file(target)?;
    }
    meta::ensure_parent_dir(target)?;
    meta::materialize_symlink(&link_target, target)?;
    Ok(TaskOutcome::Written {
        bytes: link_target.len() as u64,
    })
}

fn missing_payload(tree_entry: &TreeEntry) -> Error {
    Error::Io(io::Error::other(format!(
        "entry '{}' has no payload",
        tree_entry.raw_name
    )))
}
