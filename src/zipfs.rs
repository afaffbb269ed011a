//! ZIP container adapter: staged writing and shared read access.
//!
//! The write side assembles the container in a temp file next to the
//! destination and only renames it into place on [`ZipSink::close`], so an
//! aborted operation never leaves a half-written archive behind. Workers
//! compress entries independently into [`EntryParcel`]s; committing a
//! parcel raw-copies the already-compressed bytes into the container under
//! a short lock.
//!
//! The read side maps the container into memory once and hands workers
//! self-contained [`EntryData`] slices, so decompression runs in parallel
//! without sharing a file cursor.

use crate::{Entry, EntryKind, EntryName, Error, Result, meta};
use flate2::read::DeflateDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;
use tempfile::{NamedTempFile, SpooledTempFile};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Parcel contents up to this size stay in memory; larger ones spill to a
/// temp file.
const PARCEL_SPOOL_SIZE: usize = 8 * 1024 * 1024;

/// Entries at or above this size are written with ZIP64 extensions.
const ZIP64_THRESHOLD: u64 = 0xFFFF_FFFF;

fn zip_write_error(err: ZipError) -> Error {
    match err {
        ZipError::Io(e) => Error::Io(e),
        other => Error::Io(io::Error::other(other)),
    }
}

/// Builds the per-entry write options from an entry's metadata.
///
/// Files are deflated; directories and symlinks are stored. A missing
/// modification time is substituted with the current time, matching what
/// the container would otherwise record about a file created right now.
pub(crate) fn entry_options(entry: &Entry, preserve_permissions: bool) -> FileOptions {
    let method = if entry.is_file() {
        CompressionMethod::Deflated
    } else {
        CompressionMethod::Stored
    };
    let mut options = FileOptions::default()
        .compression_method(method)
        .last_modified_time(zip_datetime(entry.modified));
    if entry.is_file() && entry.size >= ZIP64_THRESHOLD {
        options = options.large_file(true);
    }
    if preserve_permissions {
        if let Some(mode) = entry.mode {
            options = options.unix_permissions(mode);
        }
    }
    options
}

fn zip_datetime(modified: Option<SystemTime>) -> zip::DateTime {
    let stamp = modified.unwrap_or_else(SystemTime::now);
    time::OffsetDateTime::from(stamp)
        .try_into()
        .unwrap_or_else(|_| zip::DateTime::default())
}

/// A single worker's staging archive.
///
/// The parcel compresses entry content on the worker's own thread; the
/// expensive work happens before the container lock is ever taken.
pub(crate) struct EntryParcel {
    writer: ZipWriter<SpooledTempFile>,
}

impl EntryParcel {
    pub(crate) fn new() -> Self {
        Self {
            writer: ZipWriter::new(SpooledTempFile::new(PARCEL_SPOOL_SIZE)),
        }
    }

    /// Compresses one file entry into the parcel.
    ///
    /// Returns the number of uncompressed payload bytes consumed.
    pub(crate) fn add_file(
        &mut self,
        name: &EntryName,
        options: FileOptions,
        content: &mut dyn Read,
    ) -> Result<u64> {
        self.writer
            .start_file(name.as_str(), options)
            .map_err(zip_write_error)?;
        meta::copy_streaming(content, &mut self.writer).map_err(Error::Io)
    }

    fn into_archive(mut self) -> Result<ZipArchive<SpooledTempFile>> {
        let spool = self.writer.finish().map_err(zip_write_error)?;
        ZipArchive::new(spool).map_err(zip_write_error)
    }
}

/// The container being written, staged in a temp file.
///
/// All mutating methods take an internal lock, so a sink can be shared
/// across worker threads behind an `Arc`. Dropping an unclosed sink
/// removes the staging file and leaves the destination untouched.
pub(crate) struct ZipSink {
    dest: PathBuf,
    staging_path: PathBuf,
    writer: Mutex<Option<ZipWriter<NamedTempFile>>>,
}

impl ZipSink {
    /// Creates a sink that will become the file at `dest` on close.
    ///
    /// The staging file lives in the destination's parent directory so the
    /// final rename stays on one filesystem. Missing parent directories
    /// are created.
    pub(crate) fn create(dest: &Path) -> Result<Self> {
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        meta::ensure_dir(parent)?;
        let staging = tempfile::Builder::new()
            .prefix(".parzip-")
            .suffix(".tmp")
            .tempfile_in(parent)?;
        let staging_path = staging.path().to_path_buf();
        Ok(Self {
            dest: dest.to_path_buf(),
            staging_path,
            writer: Mutex::new(Some(ZipWriter::new(staging))),
        })
    }

    /// The staging file's path while the sink is open.
    pub(crate) fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, Option<ZipWriter<NamedTempFile>>>> {
        self.writer
            .lock()
            .map_err(|_| Error::Io(io::Error::other("container writer poisoned by an earlier panic")))
    }

    fn with_writer<T>(
        &self,
        f: impl FnOnce(&mut ZipWriter<NamedTempFile>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.lock_writer()?;
        match guard.as_mut() {
            Some(writer) => f(writer),
            None => Err(Error::Io(io::Error::other("container is already closed"))),
        }
    }

    /// Appends a directory entry.
    pub(crate) fn add_directory(&self, name: &EntryName, options: FileOptions) -> Result<()> {
        self.with_writer(|writer| {
            writer
                .add_directory(name.as_str(), options)
                .map_err(zip_write_error)
        })
    }

    /// Appends a symbolic link entry pointing at `target`.
    pub(crate) fn add_symlink(
        &self,
        name: &EntryName,
        target: &str,
        options: FileOptions,
    ) -> Result<()> {
        self.with_writer(|writer| {
            writer
                .add_symlink(name.as_str(), target, options)
                .map_err(zip_write_error)
        })
    }

    /// Moves a parcel's entries into the container.
    ///
    /// The entries were compressed on the submitting worker; this only
    /// raw-copies bytes, keeping the lock hold time proportional to I/O,
    /// not compression.
    pub(crate) fn commit(&self, parcel: EntryParcel) -> Result<()> {
        let mut staged = parcel.into_archive()?;
        self.with_writer(|writer| {
            for index in 0..staged.len() {
                let entry = staged.by_index_raw(index).map_err(zip_write_error)?;
                writer.raw_copy_file(entry).map_err(zip_write_error)?;
            }
            Ok(())
        })
    }

    /// Finishes the container and renames it over the destination.
    ///
    /// Calling close again after a successful close is a no-op.
    pub(crate) fn close(&self) -> Result<()> {
        let writer = self.lock_writer()?.take();
        let Some(mut writer) = writer else {
            return Ok(());
        };
        let staging = writer.finish().map_err(zip_write_error)?;
        staging.persist(&self.dest).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

/// One entry of an opened container.
#[derive(Debug, Clone)]
pub(crate) struct TreeEntry {
    pub(crate) index: usize,
    /// The name exactly as stored in the container.
    pub(crate) raw_name: String,
    /// The sanitized name, or `None` when the raw name is unusable.
    pub(crate) name: Option<EntryName>,
    pub(crate) kind: EntryKind,
    pub(crate) size: u64,
    pub(crate) compressed_size: u64,
    pub(crate) data_start: u64,
    pub(crate) method: CompressionMethod,
    pub(crate) crc32: u32,
    pub(crate) modified: Option<SystemTime>,
    pub(crate) mode: Option<u32>,
}

impl TreeEntry {
    /// Converts to the public entry model; `None` when the name is
    /// unusable.
    pub(crate) fn to_entry(&self) -> Option<Entry> {
        let name = self.name.clone()?;
        let mut entry = Entry::new(name, self.kind);
        entry.size = self.size;
        entry.modified = self.modified;
        entry.mode = self.mode;
        Some(entry)
    }
}

/// A self-contained handle to one entry's compressed bytes.
///
/// Holds a reference to the container mapping, so it can move to a worker
/// thread independently of the [`ZipTree`] it came from.
pub(crate) struct EntryData {
    map: Arc<Mmap>,
    start: usize,
    end: usize,
    method: CompressionMethod,
}

impl EntryData {
    /// Opens a reader over the decompressed entry content.
    ///
    /// # Errors
    ///
    /// Returns an error for compression methods this crate does not
    /// decode; the entry fails individually without affecting others.
    pub(crate) fn reader(&self) -> Result<Box<dyn Read + '_>> {
        let raw = &self.map[self.start..self.end];
        match self.method {
            CompressionMethod::Stored => Ok(Box::new(raw)),
            CompressionMethod::Deflated => Ok(Box::new(DeflateDecoder::new(raw))),
            other => Err(Error::Io(io::Error::other(format!(
                "unsupported compression method {other:?}"
            )))),
        }
    }
}

/// An opened container: a metadata snapshot plus a shared mapping of the
/// underlying file.
///
/// The snapshot is taken once at open time; workers never touch the
/// central directory again.
#[derive(Debug)]
pub(crate) struct ZipTree {
    path: PathBuf,
    map: Arc<Mmap>,
    entries: Vec<TreeEntry>,
}

impl ZipTree {
    /// Opens the container at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] when the file cannot be read or is not a
    /// valid container.
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        // The mapping is read-only; the archive must not be truncated by
        // another process while an operation is running.
        let map = unsafe { Mmap::map(&file) }.map_err(|e| Error::open(path, e))?;

        let mut archive =
            ZipArchive::new(io::Cursor::new(&map[..])).map_err(|e| Error::open(path, e))?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| Error::open(path, e))?;
            let raw_name = entry.name().to_string();
            let mode = entry.unix_mode();
            let kind = if entry.is_dir() {
                EntryKind::Directory
            } else if mode.is_some_and(|m| m & 0o170000 == 0o120000) {
                EntryKind::Symlink
            } else {
                EntryKind::File
            };
            entries.push(TreeEntry {
                index,
                name: EntryName::sanitize(&raw_name),
                raw_name,
                kind,
                size: entry.size(),
                compressed_size: entry.compressed_size(),
                data_start: entry.data_start(),
                method: entry.compression(),
                crc32: entry.crc32(),
                modified: entry.last_modified().to_time().ok().map(SystemTime::from),
                mode,
            });
        }
        drop(archive);

        Ok(Self {
            path: path.to_path_buf(),
            map: Arc::new(map),
            entries,
        })
    }

    /// The container's path.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries in the container.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// The metadata snapshot, in container order.
    pub(crate) fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Looks an entry up by sanitized or raw name.
    pub(crate) fn find(&self, wanted: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| {
            e.name.as_ref().is_some_and(|n| n.as_str() == wanted) || e.raw_name == wanted
        })
    }

    /// Returns a movable handle to an entry's compressed bytes.
    pub(crate) fn entry_data(&self, entry: &TreeEntry) -> Result<EntryData> {
        let out_of_range = || {
            Error::Io(io::Error::other(format!(
                "entry '{}' data range lies outside the container",
                entry.raw_name
            )))
        };
        let start = usize::try_from(entry.data_start).map_err(|_| out_of_range())?;
        let len = usize::try_from(entry.compressed_size).map_err(|_| out_of_range())?;
        let end = start.checked_add(len).ok_or_else(out_of_range)?;
        if end > self.map.len() {
            return Err(out_of_range());
        }
        Ok(EntryData {
            map: Arc::clone(&self.map),
            start,
            end,
            method: entry.method,
        })
    }
}
