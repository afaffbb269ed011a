//! Archive creation engines.
//!
//! [`ZipArchiver`] builds a ZIP container; [`DirArchiver`] mirrors an
//! entry tree into a plain destination directory. Both fan entries out to
//! a worker pool and share one options type.

mod dir;
mod zip;

pub use dir::DirArchiver;
pub use zip::ZipArchiver;

use crate::pool::Threads;
use crate::session::SessionSummary;

/// Options for an archive operation.
///
/// The defaults overwrite existing output and preserve permission bits.
///
/// ```
/// use parzip::{ArchiveOptions, Threads};
///
/// let options = ArchiveOptions::new()
///     .threads(Threads::Single)
///     .overwrite(false);
/// # let _ = options;
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub(crate) threads: Threads,
    pub(crate) preserve_permissions: bool,
    pub(crate) overwrite: bool,
}

impl ArchiveOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker pool size.
    pub fn threads(mut self, threads: Threads) -> Self {
        self.threads = threads;
        self
    }

    /// Whether entry permission bits are recorded and applied.
    ///
    /// When disabled, mode bits are neither stored nor restored and their
    /// failures are never reported.
    pub fn preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Whether existing output may be replaced.
    ///
    /// With overwriting disabled, ZIP creation refuses an existing
    /// destination archive and the directory engine leaves existing
    /// targets untouched.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            threads: Threads::Auto,
            preserve_permissions: true,
            overwrite: true,
        }
    }
}

/// Counters describing a finished archive operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveResult {
    /// Entries written to the destination.
    pub entries_written: usize,
    /// Entries skipped as up to date or protected by the overwrite flag.
    pub entries_skipped: usize,
    /// Uncompressed payload bytes processed.
    pub bytes_processed: u64,
    /// Worker threads the operation ran on.
    pub threads_used: usize,
}

impl From<SessionSummary> for ArchiveResult {
    fn from(summary: SessionSummary) -> Self {
        Self {
            entries_written: summary.entries_written,
            entries_skipped: summary.entries_skipped,
            bytes_processed: summary.bytes_processed,
            threads_used: summary.threads_used,
        }
    }
}
