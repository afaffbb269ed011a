//! Error types for parallel archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when creating or extracting archives, along with a
//! convenient [`Result<T>`] type alias.
//!
//! # Error Phases
//!
//! Errors fall into two phases with different propagation rules:
//!
//! - **Pre-flight** ([`Configuration`][Error::Configuration],
//!   [`EmptyArchive`][Error::EmptyArchive], [`Open`][Error::Open]):
//!   detected synchronously before any task is dispatched. The worker pool
//!   stays idle.
//! - **Join-phase** ([`TaskExecution`][Error::TaskExecution],
//!   [`Cancelled`][Error::Cancelled]): per-entry failures are captured at
//!   the task boundary and only surfaced when the session joins its tasks.
//!   The first failure (in submission order) becomes the operation's error;
//!   the rest are recorded at debug level. [`SelfInclusion`][Error::SelfInclusion]
//!   sits between the two: it is detected during dispatch, but already
//!   dispatched tasks are still joined before it is raised.
//!
//! # Example
//!
//! ```rust,no_run
//! use parzip::{DirectorySource, ZipArchiver, ArchiveOptions, Error, Result};
//!
//! fn create(src: &str, dest: &str) -> Result<()> {
//!     let source = DirectorySource::new(src);
//!     match ZipArchiver::new(dest).archive(source, &ArchiveOptions::default()) {
//!         Ok(result) => {
//!             println!("wrote {} entries", result.entries_written);
//!             Ok(())
//!         }
//!         Err(Error::SelfInclusion { path }) => {
//!             eprintln!("refusing to archive {} into itself", path.display());
//!             Err(Error::SelfInclusion { path })
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;

/// The main error type for parallel archive operations.
///
/// Each variant carries the context needed to diagnose the failure. The
/// enum is `#[non_exhaustive]`: matching requires a wildcard arm so new
/// variants can be added without breaking downstream code.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred outside of any specific task.
    ///
    /// Task-level I/O failures are wrapped in
    /// [`TaskExecution`][Self::TaskExecution] instead, so that the failing
    /// entry is named.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source/destination setup is invalid or incomplete.
    ///
    /// Examples: no source configured, the source does not exist, both a
    /// destination directory and a destination file were configured at
    /// once, or neither was. Always detected before any work starts.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The entry source produced no entries and no virtual-content flag
    /// was set.
    ///
    /// Creating an intentionally empty archive is possible by marking the
    /// entry source as carrying virtual content (see
    /// [`EntrySource::has_virtual_content`](crate::EntrySource::has_virtual_content)).
    #[error("the entry source produced no entries; refusing to create an empty archive")]
    EmptyArchive,

    /// An entry resolves to the same filesystem object as the destination.
    ///
    /// Prevents an archive from swallowing itself, or a directory copy
    /// from copying into itself. Detected at the point the offending entry
    /// is reached during dispatch; tasks dispatched earlier are still
    /// joined and resources released before this is raised.
    #[error("the destination '{}' is included in the sources; an archive cannot contain itself", path.display())]
    SelfInclusion {
        /// The destination path that an entry resolved to.
        path: PathBuf,
    },

    /// One or more per-entry tasks failed.
    ///
    /// The engine reports the first failure encountered during the join
    /// phase (in submission order) and wraps its cause; remaining failures
    /// are logged at debug level. Files already written by other tasks are
    /// not rolled back.
    #[error("task for entry '{entry}' failed")]
    TaskExecution {
        /// The archive-relative name of the failing entry.
        entry: String,
        /// The underlying cause.
        #[source]
        source: Box<Error>,
    },

    /// The join wait was interrupted before every task produced a result.
    ///
    /// Distinct from [`TaskExecution`][Self::TaskExecution]: the task did
    /// not fail, the engine stopped being able to observe it (worker loss
    /// or pool shutdown before pickup).
    #[error("operation cancelled while awaiting task completion")]
    Cancelled,

    /// The archive container could not be opened.
    ///
    /// On read this means a corrupt or missing container; on create, an
    /// unwritable destination.
    #[error("cannot open archive '{}': {reason}", path.display())]
    Open {
        /// The container path.
        path: PathBuf,
        /// Why the container could not be opened.
        reason: String,
    },

    /// The selection predicate itself failed while examining an entry.
    ///
    /// Predicate failures are surfaced as a named error rather than being
    /// treated as "not selected".
    #[error("selection predicate failed for entry '{entry}'")]
    Selector {
        /// The entry the predicate was examining.
        entry: String,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },

    /// Extracted data did not match the checksum recorded in the container.
    #[error("CRC mismatch for entry '{entry}': expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        /// The entry whose data failed verification.
        entry: String,
        /// The checksum recorded in the container.
        expected: u32,
        /// The checksum of the extracted data.
        actual: u32,
    },
}

impl Error {
    /// Returns `true` if this error was detected before any task was
    /// dispatched (setup problems, not execution problems).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_) | Error::EmptyArchive | Error::Open { .. }
        )
    }

    /// Returns `true` if this error came out of the join phase: a task
    /// failed or the wait was interrupted.
    pub fn is_task_failure(&self) -> bool {
        matches!(self, Error::TaskExecution { .. } | Error::Cancelled)
    }

    /// Returns `true` if the join wait was interrupted rather than a task
    /// having failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns the archive-relative entry name associated with this error,
    /// if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::TaskExecution { entry, .. } => Some(entry),
            Error::Selector { entry, .. } => Some(entry),
            Error::CrcMismatch { entry, .. } => Some(entry),
            _ => None,
        }
    }

    /// Creates a [`Configuration`][Self::Configuration] error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Creates an [`Open`][Self::Open] error for the given container path.
    pub fn open(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Error::Open {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Wraps a task-boundary failure for the given entry.
    pub fn task(entry: impl Into<String>, source: Error) -> Self {
        Error::TaskExecution {
            entry: entry.into(),
            source: Box::new(source),
        }
    }
}

/// A specialized Result type for parallel archive operations.
///
/// Defined as `std::result::Result<T, Error>` for convenience.
pub type Result<T> = std::result::Result<T, Error>;
