//! # parzip
//!
//! A parallel archive engine for ZIP containers.
//!
//! This crate creates and extracts ZIP archives (and mirrors trees into
//! plain directories) using a pool of worker threads instead of a single
//! sequential stream, while keeping the guarantees of a conventional
//! archiver: timestamp and permission fidelity, symlinks preserved as
//! symlinks, and protection against an archive swallowing itself.
//!
//! ## Quick Start
//!
//! ### Creating an Archive
//!
//! ```rust,no_run
//! use parzip::{ArchiveOptions, DirectorySource, Result, ZipArchiver};
//!
//! fn main() -> Result<()> {
//!     // Walk a directory tree and compress it on all available cores.
//!     let source = DirectorySource::new("photos");
//!     let result = ZipArchiver::new("photos.zip").archive(source, &ArchiveOptions::default())?;
//!
//!     println!(
//!         "wrote {} entries ({} bytes) on {} threads",
//!         result.entries_written, result.bytes_processed, result.threads_used
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ### Extracting an Archive
//!
//! ```rust,no_run
//! use parzip::{ExtractOptions, Result, ZipUnarchiver};
//!
//! fn main() -> Result<()> {
//!     let result = ZipUnarchiver::new("photos.zip")
//!         .dest_dir("restored")
//!         .extract((), &ExtractOptions::default())?;
//!
//!     println!("extracted {} entries", result.entries_written);
//!     Ok(())
//! }
//! ```
//!
//! ### Selective Extraction
//!
//! Any [`EntrySelector`] filters the tree; plain closures work too:
//!
//! ```rust,no_run
//! use parzip::{Entry, ExtractOptions, Result, ZipUnarchiver};
//!
//! fn main() -> Result<()> {
//!     ZipUnarchiver::new("photos.zip")
//!         .dest_dir("thumbnails")
//!         .extract(
//!             |e: &Entry| e.name.as_str().ends_with(".png"),
//!             &ExtractOptions::default(),
//!         )?;
//!     Ok(())
//! }
//! ```
//!
//! ### Mirroring Into a Directory
//!
//! [`DirArchiver`] is the container-free analogue: one copy task per
//! entry, with targets that are already up to date skipped on repeat
//! runs:
//!
//! ```rust,no_run
//! use parzip::{ArchiveOptions, DirArchiver, DirectorySource, Result};
//!
//! fn main() -> Result<()> {
//!     let result = DirArchiver::new("backup")
//!         .archive(DirectorySource::new("photos"), &ArchiveOptions::default())?;
//!     println!("copied {}, skipped {}", result.entries_written, result.entries_skipped);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Per-entry task failures are collected
//! when the operation joins its workers; the first one is returned and
//! the rest are logged at debug level:
//!
//! ```rust,no_run
//! use parzip::{ArchiveOptions, DirectorySource, Error, ZipArchiver};
//!
//! fn build(dest: &str) -> parzip::Result<()> {
//!     let source = DirectorySource::new("input");
//!     match ZipArchiver::new(dest).archive(source, &ArchiveOptions::default()) {
//!         Ok(result) => {
//!             println!("archived {} entries", result.entries_written);
//!             Ok(())
//!         }
//!         Err(Error::EmptyArchive) => {
//!             eprintln!("nothing to archive");
//!             Ok(())
//!         }
//!         Err(e @ Error::TaskExecution { .. }) => {
//!             eprintln!("an entry failed: {e}");
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! # fn main() {}
//! ```
//!
//! ## Concurrency Model
//!
//! Every operation owns one fixed-size worker pool, sized by
//! [`Threads`] at the start of the operation and torn down when it
//! finishes. Entries become independent tasks with no ordering between
//! them; the only blocking point is the join at the end, which waits for
//! every task before reporting. Submission is fire-and-forget: the
//! dispatcher enqueues the whole entry set up front, so pending-task
//! memory grows with the number of entries, not with their size.
//!
//! Written archives are standard ZIP containers readable by any
//! conforming tool. Symbolic links are preserved as link entries; they
//! materialize as real links on Unix and fail individually elsewhere.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

/// Fixed buffer size for streaming entry content (256 KiB).
pub(crate) const COPY_BUFFER_SIZE: usize = 256 * 1024;

pub mod entry;
pub mod error;
mod meta;
pub mod name;
pub mod pool;
pub mod read;
pub mod session;
pub mod source;
mod validate;
pub mod write;
mod zipfs;

pub use entry::{
    ContentSource, Entry, EntryKind, EntrySelector, SelectAll, SelectByName, SelectByPredicate,
    SelectFilesOnly,
};
pub use error::{Error, Result};
pub use name::EntryName;
pub use pool::{TaskHandle, TaskOutcome, Threads, WorkerPool};
pub use read::{ExtractOptions, ExtractResult, ZipUnarchiver};
pub use session::{Session, SessionSummary};
pub use source::{DirectorySource, EntrySource, MemorySource};
pub use write::{ArchiveOptions, ArchiveResult, DirArchiver, ZipArchiver};
