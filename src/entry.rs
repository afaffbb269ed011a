//! Archive entry model and selectors.

use crate::EntryName;
use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

/// The kind of filesystem object an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A regular file with byte content.
    File,
    /// A directory.
    Directory,
    /// A symbolic link; the target is carried in [`Entry::link_target`].
    Symlink,
}

/// Where an entry's bytes come from.
///
/// Content is opened lazily by the worker that processes the entry, so a
/// source can describe an arbitrarily large tree without holding any file
/// open while the work queue drains.
#[derive(Clone)]
pub enum ContentSource {
    /// The filesystem object backing this entry. For files the bytes are
    /// read from it when the entry's task runs; for directories it only
    /// identifies the source object.
    Path(PathBuf),
    /// Bytes are held in memory.
    Bytes(Arc<[u8]>),
    /// The entry has no backing object (in-memory directories, symlinks).
    Empty,
}

impl ContentSource {
    /// Wraps in-memory bytes as entry content.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        ContentSource::Bytes(Arc::from(data.into()))
    }

    /// Opens a reader over the content.
    ///
    /// For [`ContentSource::Path`] this opens the file at call time; the
    /// reader for the other variants never touches the filesystem.
    pub fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        match self {
            ContentSource::Path(path) => Ok(Box::new(std::fs::File::open(path)?)),
            ContentSource::Bytes(data) => Ok(Box::new(io::Cursor::new(Arc::clone(data)))),
            ContentSource::Empty => Ok(Box::new(io::empty())),
        }
    }
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ContentSource::Bytes(data) => write!(f, "Bytes({} bytes)", data.len()),
            ContentSource::Empty => write!(f, "Empty"),
        }
    }
}

/// A single entry flowing through an archive operation.
///
/// Entries are produced by entry sources when creating archives and by the
/// container reader when extracting. The struct is `#[non_exhaustive]` so
/// fields can be added without breaking downstream code; construct one with
/// [`Entry::new`] and assign the fields you have.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Entry {
    /// The archive-relative name.
    pub name: EntryName,
    /// What kind of object this entry is.
    pub kind: EntryKind,
    /// Uncompressed size in bytes. Zero for directories and symlinks.
    pub size: u64,
    /// Modification time, when the producer knows it.
    pub modified: Option<SystemTime>,
    /// Unix permission bits, when the producer knows them.
    pub mode: Option<u32>,
    /// Target path for symlink entries.
    pub link_target: Option<PathBuf>,
    /// Where the entry's bytes come from.
    pub content: ContentSource,
}

impl Entry {
    /// Creates an entry with no content, size, times or permissions set.
    pub fn new(name: EntryName, kind: EntryKind) -> Self {
        Self {
            name,
            kind,
            size: 0,
            modified: None,
            mode: None,
            link_target: None,
            content: ContentSource::Empty,
        }
    }

    /// Returns true if this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Returns true if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Returns true if this entry is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    /// Returns the file name (last segment) of the entry name.
    pub fn file_name(&self) -> &str {
        self.name.file_name()
    }
}

/// A selector for filtering entries during extraction.
///
/// Selection may consult external state (a manifest file, a database), so
/// [`select`](EntrySelector::select) is fallible. A failed probe aborts the
/// operation and surfaces as [`Error::Selector`](crate::Error::Selector)
/// with the name of the entry under examination attached.
///
/// # Built-in Implementations
///
/// | Type | Behavior |
/// |------|----------|
/// | `()` | Selects all entries (most concise) |
/// | [`SelectAll`] | Selects all entries (explicit) |
/// | `&[&str]` | Selects entries matching any of the names |
/// | `Vec<String>` | Selects entries matching any of the names |
/// | `Fn(&Entry) -> bool` | Custom infallible predicate |
/// | [`SelectByName`] | Selects by exact name match |
/// | [`SelectByPredicate`] | Wraps a predicate closure |
/// | [`SelectFilesOnly`] | Selects only files (excludes directories) |
///
/// # Example
///
/// ```rust,ignore
/// // Extract everything.
/// unarchiver.extract((), &options)?;
///
/// // Extract small files only.
/// unarchiver.extract(|e: &Entry| e.size < 1024, &options)?;
/// ```
pub trait EntrySelector {
    /// Returns true if the entry should be processed.
    ///
    /// # Errors
    ///
    /// Implementations that probe external state may fail; the error is
    /// reported for the entry being examined.
    fn select(&self, entry: &Entry) -> io::Result<bool>;
}

/// Selector that matches all entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectAll;

impl EntrySelector for SelectAll {
    fn select(&self, _entry: &Entry) -> io::Result<bool> {
        Ok(true)
    }
}

/// Selector that matches entries by exact names.
#[derive(Debug, Clone)]
pub struct SelectByName {
    names: Vec<String>,
}

impl SelectByName {
    /// Creates a selector for the given names.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl EntrySelector for SelectByName {
    fn select(&self, entry: &Entry) -> io::Result<bool> {
        Ok(self.names.iter().any(|name| entry.name.as_str() == name))
    }
}

/// Selector that matches entries by a predicate function.
pub struct SelectByPredicate<F> {
    predicate: F,
}

impl<F: Fn(&Entry) -> bool> SelectByPredicate<F> {
    /// Creates a selector with the given predicate.
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F: Fn(&Entry) -> bool> EntrySelector for SelectByPredicate<F> {
    fn select(&self, entry: &Entry) -> io::Result<bool> {
        Ok((self.predicate)(entry))
    }
}

/// Selector that matches only files (not directories or symlinks).
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectFilesOnly;

impl EntrySelector for SelectFilesOnly {
    fn select(&self, entry: &Entry) -> io::Result<bool> {
        Ok(entry.is_file())
    }
}

/// The unit type `()` implements `EntrySelector` to select all entries.
///
/// This is the most concise way to process a whole archive:
///
/// ```rust,ignore
/// unarchiver.extract((), &ExtractOptions::default())?;
/// ```
impl EntrySelector for () {
    fn select(&self, _entry: &Entry) -> io::Result<bool> {
        Ok(true)
    }
}

// Implement for closures
impl<F: Fn(&Entry) -> bool> EntrySelector for F {
    fn select(&self, entry: &Entry) -> io::Result<bool> {
        Ok(self(entry))
    }
}

// Implement for slice of names
impl EntrySelector for &[&str] {
    fn select(&self, entry: &Entry) -> io::Result<bool> {
        Ok(self.iter().any(|name| entry.name.as_str() == *name))
    }
}

// Implement for Vec of names
impl EntrySelector for Vec<String> {
    fn select(&self, entry: &Entry) -> io::Result<bool> {
        Ok(self.iter().any(|name| entry.name.as_str() == name))
    }
}
