//! Entry sources for archive creation.
//!
//! An [`EntrySource`] describes what goes into an archive. Sources are
//! pull-based: the engine asks for an iterator and consumes it while
//! dispatching tasks, so a source never needs to hold its whole tree in
//! memory. [`DirectorySource`] walks a directory on disk lazily;
//! [`MemorySource`] holds explicitly assembled entries.

use crate::{ContentSource, Entry, EntryKind, EntryName, Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A producer of archive entries.
///
/// The engine calls [`validate`](EntrySource::validate) before any task is
/// dispatched and then consumes [`entries`](EntrySource::entries) one item
/// at a time. Entry order is the submission order, which in turn fixes the
/// order results are joined in.
pub trait EntrySource {
    /// Checks that the source is usable before dispatch begins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the source cannot produce
    /// entries at all, e.g. a missing base directory.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Returns the entries to archive, in submission order.
    ///
    /// The iterator is consumed lazily; producing an entry must not
    /// require the previous entry's task to have finished. Parent
    /// directories are yielded before their children.
    ///
    /// # Errors
    ///
    /// Returns an error when the iterator itself cannot be constructed.
    /// Per-item failures are reported through the iterator.
    fn entries(&self) -> Result<Box<dyn Iterator<Item = Result<Entry>> + '_>>;

    /// True if the destination counts as non-empty even when
    /// [`entries`](EntrySource::entries) yields nothing.
    ///
    /// An empty source without this flag aborts the operation with
    /// [`Error::EmptyArchive`] before any write happens.
    fn has_virtual_content(&self) -> bool {
        false
    }
}

impl<S: EntrySource + ?Sized> EntrySource for &S {
    fn validate(&self) -> Result<()> {
        (**self).validate()
    }

    fn entries(&self) -> Result<Box<dyn Iterator<Item = Result<Entry>> + '_>> {
        (**self).entries()
    }

    fn has_virtual_content(&self) -> bool {
        (**self).has_virtual_content()
    }
}

/// An entry source that walks a directory tree on disk.
///
/// The walk is lazy and sorted by file name, so repeated runs over an
/// unchanged tree produce the same entry sequence. The base directory
/// itself is not emitted; every entry name is relative to it.
///
/// Symbolic links are preserved as link entries by default. With
/// [`follow_symlinks`](DirectorySource::follow_symlinks) enabled the walker
/// descends into link targets instead and archives their content as regular
/// files and directories.
///
/// # Examples
///
/// ```rust,no_run
/// use parzip::{ArchiveOptions, DirectorySource, ZipArchiver};
///
/// # fn main() -> parzip::Result<()> {
/// let source = DirectorySource::new("./photos").follow_symlinks(true);
/// ZipArchiver::new("photos.zip").archive(source, &ArchiveOptions::default())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DirectorySource {
    base: PathBuf,
    follow_symlinks: bool,
}

impl DirectorySource {
    /// Creates a source rooted at the given directory.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            follow_symlinks: false,
        }
    }

    /// Follow symbolic links instead of archiving them as links.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Returns the base directory of this source.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn entry_for(&self, dirent: &walkdir::DirEntry) -> Result<Entry> {
        let relative = dirent.path().strip_prefix(&self.base).map_err(|e| {
            Error::Io(io::Error::other(format!(
                "walked path '{}' is outside base '{}': {}",
                dirent.path().display(),
                self.base.display(),
                e
            )))
        })?;
        let name = EntryName::from_relative_path(relative)?;
        let metadata = dirent.metadata().map_err(walk_error)?;

        let file_type = dirent.file_type();
        let mut entry = if file_type.is_dir() {
            let mut entry = Entry::new(name, EntryKind::Directory);
            entry.content = ContentSource::Path(dirent.path().to_path_buf());
            entry
        } else if file_type.is_symlink() {
            let mut entry = Entry::new(name, EntryKind::Symlink);
            entry.link_target = Some(fs::read_link(dirent.path())?);
            entry
        } else {
            let mut entry = Entry::new(name, EntryKind::File);
            entry.size = metadata.len();
            entry.content = ContentSource::Path(dirent.path().to_path_buf());
            entry
        };
        entry.modified = metadata.modified().ok();
        entry.mode = mode_of(&metadata);
        Ok(entry)
    }
}

impl EntrySource for DirectorySource {
    fn validate(&self) -> Result<()> {
        let metadata = fs::metadata(&self.base).map_err(|e| {
            Error::config(format!(
                "source directory '{}' is not readable: {}",
                self.base.display(),
                e
            ))
        })?;
        if !metadata.is_dir() {
            return Err(Error::config(format!(
                "source path '{}' is not a directory",
                self.base.display()
            )));
        }
        Ok(())
    }

    fn entries(&self) -> Result<Box<dyn Iterator<Item = Result<Entry>> + '_>> {
        let walk = WalkDir::new(&self.base)
            .follow_links(self.follow_symlinks)
            .min_depth(1)
            .sort_by_file_name();
        Ok(Box::new(walk.into_iter().map(move |item| {
            let dirent = item.map_err(walk_error)?;
            self.entry_for(&dirent)
        })))
    }
}

fn walk_error(err: walkdir::Error) -> Error {
    let message = err.to_string();
    Error::Io(
        err.into_io_error()
            .unwrap_or_else(|| io::Error::other(message)),
    )
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn mode_of(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

/// An entry source assembled in memory.
///
/// Useful for generated content and for archives whose real payload lives
/// inside the container produced by a nested operation. An empty
/// `MemorySource` normally aborts the operation with
/// [`Error::EmptyArchive`]; mark it
/// [`with_virtual_content`](MemorySource::with_virtual_content) when the
/// destination legitimately starts out empty.
///
/// Entries carry their bytes as shared slices, so cloning a source is
/// cheap. For large on-disk files, [`push`](MemorySource::push) an entry
/// whose content is a [`ContentSource::Path`] to keep the read lazy.
///
/// # Examples
///
/// ```
/// use parzip::MemorySource;
///
/// # fn main() -> parzip::Result<()> {
/// let source = MemorySource::new()
///     .directory("docs")?
///     .file("docs/readme.txt", b"hello".to_vec())?;
/// assert_eq!(source.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Vec<Entry>,
    virtual_content: bool,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file entry with the given bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the name is not a valid entry
    /// name.
    pub fn file(mut self, name: impl AsRef<str>, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes: Vec<u8> = bytes.into();
        let mut entry = Entry::new(EntryName::new(name)?, EntryKind::File);
        entry.size = bytes.len() as u64;
        entry.content = ContentSource::bytes(bytes);
        self.entries.push(entry);
        Ok(self)
    }

    /// Adds a directory entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the name is not a valid entry
    /// name.
    pub fn directory(mut self, name: impl AsRef<str>) -> Result<Self> {
        self.entries
            .push(Entry::new(EntryName::new(name)?, EntryKind::Directory));
        Ok(self)
    }

    /// Adds a symbolic link entry pointing at `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the name is not a valid entry
    /// name.
    pub fn symlink(mut self, name: impl AsRef<str>, target: impl Into<PathBuf>) -> Result<Self> {
        let mut entry = Entry::new(EntryName::new(name)?, EntryKind::Symlink);
        entry.link_target = Some(target.into());
        self.entries.push(entry);
        Ok(self)
    }

    /// Adds a fully assembled entry.
    ///
    /// This is the escape hatch for entries that need explicit times,
    /// permissions or non-memory content.
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Marks the destination as non-empty even when no entries are listed.
    pub fn with_virtual_content(mut self) -> Self {
        self.virtual_content = true;
        self
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are listed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntrySource for MemorySource {
    fn entries(&self) -> Result<Box<dyn Iterator<Item = Result<Entry>> + '_>> {
        Ok(Box::new(self.entries.iter().cloned().map(Ok)))
    }

    fn has_virtual_content(&self) -> bool {
        self.virtual_content
    }
}
