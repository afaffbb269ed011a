//! Archive extraction engine.
//!
//! [`ZipUnarchiver`] opens a ZIP container, walks its entry tree once, and
//! fans the selected entries out to a worker pool. Selection is pluggable
//! through [`EntrySelector`](crate::EntrySelector); a single entry can be
//! pulled out with [`ZipUnarchiver::extract_path`].

mod extract;

pub use extract::ZipUnarchiver;

use crate::pool::Threads;
use crate::session::SessionSummary;

/// Options for an extraction operation.
///
/// The defaults overwrite existing targets, restore permission bits, and
/// verify each file's checksum against the container record.
///
/// ```
/// use parzip::{ExtractOptions, Threads};
///
/// let options = ExtractOptions::new()
///     .threads(Threads::Auto)
///     .overwrite(false)
///     .verify_crc(false);
/// # let _ = options;
/// ```
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub(crate) threads: Threads,
    pub(crate) overwrite: bool,
    pub(crate) preserve_permissions: bool,
    pub(crate) verify_crc: bool,
}

impl ExtractOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker pool size.
    pub fn threads(mut self, threads: Threads) -> Self {
        self.threads = threads;
        self
    }

    /// Whether existing targets may be replaced.
    ///
    /// When disabled, entries whose target already exists are skipped and
    /// counted in [`ExtractResult::entries_skipped`].
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Whether recorded permission bits are applied to extracted entries.
    pub fn preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Whether extracted file data is checked against the recorded CRC.
    pub fn verify_crc(mut self, verify: bool) -> Self {
        self.verify_crc = verify;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            threads: Threads::Auto,
            overwrite: true,
            preserve_permissions: true,
            verify_crc: true,
        }
    }
}

/// Counters describing a finished extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractResult {
    /// Entries materialized in the destination.
    pub entries_written: usize,
    /// Entries skipped because their target exists and overwriting is
    /// disabled.
    pub entries_skipped: usize,
    /// Uncompressed payload bytes written out.
    pub bytes_processed: u64,
    /// Worker threads the operation ran on.
    pub threads_used: usize,
}

impl From<SessionSummary> for ExtractResult {
    fn from(summary: SessionSummary) -> Self {
        Self {
            entries_written: summary.entries_written,
            entries_skipped: summary.entries_skipped,
            bytes_processed: summary.bytes_processed,
            threads_used: summary.threads_used,
        }
    }
}
