//! Parallel ZIP archive creation.

use crate::entry::{ContentSource, Entry, EntryKind};
use crate::session::Session;
use crate::validate::{self, SelfInclusionCheck};
use crate::write::{ArchiveOptions, ArchiveResult};
use crate::zipfs::{self, EntryParcel, ZipSink};
use crate::{EntrySource, Error, Result, TaskOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Creates a ZIP archive from an [`EntrySource`], compressing entries on
/// a worker pool.
///
/// Entries are deflated concurrently into per-entry staging buffers and
/// appended to the container serially. The archive is assembled in a temp
/// file and renamed over the destination only when every task has
/// finished, so a failed operation never leaves a truncated archive.
///
/// ```no_run
/// use parzip::{ArchiveOptions, DirectorySource, ZipArchiver};
///
/// # fn main() -> parzip::Result<()> {
/// let source = DirectorySource::new("assets");
/// let result = ZipArchiver::new("assets.zip").archive(source, &ArchiveOptions::default())?;
/// println!("wrote {} entries", result.entries_written);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ZipArchiver {
    dest: PathBuf,
}

impl ZipArchiver {
    /// Creates an archiver targeting the file at `dest`.
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }

    /// The destination archive path.
    pub fn destination(&self) -> &Path {
        &self.dest
    }

    /// Archives every entry the source yields.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error for an unreadable source or an
    /// unusable destination, [`Error::EmptyArchive`] when the source
    /// yields nothing and does not claim virtual content, and
    /// [`Error::SelfInclusion`] when an entry is the destination archive
    /// itself. Per-entry failures surface as [`Error::TaskExecution`]
    /// after every already-running task has been joined.
    pub fn archive<S: EntrySource>(
        &self,
        source: S,
        options: &ArchiveOptions,
    ) -> Result<ArchiveResult> {
        source.validate()?;
        if self.dest.is_dir() {
            return Err(Error::config(format!(
                "destination '{}' is a directory",
                self.dest.display()
            )));
        }
        validate::ensure_overwritable(&self.dest, options.overwrite)?;

        let sink = Arc::new(ZipSink::create(&self.dest)?);
        let mut guard = SelfInclusionCheck::new(&self.dest);
        guard.add_target(sink.staging_path());

        let mut session = Session::new(options.threads)?;
        let preserve = options.preserve_permissions;
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
                    if let ContentSource::Path(path) = &entry.content {
                        if let Err(err) = guard.check(path) {
                            dispatch_error = Some(err);
                            break;
                        }
                    }
                    let sink = Arc::clone(&sink);
                    let label = entry.name.to_string();
                    session.submit(label, move || write_entry(&sink, entry, preserve));
                    dispatched += 1;
                }
            }
        }

        // Every dispatched task is joined before any error is raised.
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

        sink.close()?;
        Ok(ArchiveResult::from(summary))
    }
}

fn write_entry(sink: &ZipSink, entry: Entry, preserve_permissions: bool) -> Result<TaskOutcome> {
    let options = zipfs::entry_options(&entry, preserve_permissions);
    match entry.kind {
        EntryKind::Directory => {
            sink.add_directory(&entry.name, options)?;
            Ok(TaskOutcome::Written { bytes: 0 })
        }
        EntryKind::Symlink => {
            let target = entry.link_target.as_deref().ok_or_else(|| {
                Error::config(format!("symlink entry '{}' has no target", entry.name))
            })?;
            let target = target.to_str().ok_or_else(|| {
                Error::config(format!(
                    "symlink target for '{}' is not valid UTF-8",
                    entry.name
                ))
            })?;
            sink.add_symlink(&entry.name, target, options)?;
            Ok(TaskOutcome::Written { bytes: 0 })
        }
        EntryKind::File => {
            let mut content = entry.content.open()?;
            let mut parcel = EntryParcel::new();
            let bytes = parcel.add_file(&entry.name, options, &mut *content)?;
            sink.commit(parcel)?;
            Ok(TaskOutcome::Written { bytes })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DirectorySource, MemorySource};
    use crate::{EntryName, Threads};
    use std::fs;
    use std::io::Read;
    use zip::ZipArchive;

    fn sample_source() -> MemorySource {
        MemorySource::new()
            .directory("docs")
            .unwrap()
            .file("docs/readme.txt", b"hello world".to_vec())
            .unwrap()
            .file("docs/data.bin", vec![7u8; 4096])
            .unwrap()
    }

    #[test]
    fn test_archive_memory_source() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");

        let result = ZipArchiver::new(&dest)
            .archive(sample_source(), &ArchiveOptions::default())
            .unwrap();
        assert_eq!(result.entries_written, 3);
        assert_eq!(result.entries_skipped, 0);
        assert_eq!(result.bytes_processed, 11 + 4096);

        let mut archive = ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);
        let mut text = String::new();
        archive
            .by_name("docs/readme.txt")
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "hello world");
        assert!(archive.by_name("docs/").unwrap().is_dir());
    }

    #[test]
    fn test_single_thread_reported() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let options = ArchiveOptions::new().threads(Threads::Single);
        let result = ZipArchiver::new(&dest)
            .archive(sample_source(), &options)
            .unwrap();
        assert_eq!(result.threads_used, 1);
    }

    #[test]
    fn test_empty_source_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("empty.zip");

        let err = ZipArchiver::new(&dest)
            .archive(MemorySource::new(), &ArchiveOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::EmptyArchive));
        assert!(!dest.exists());
        // The staging temp file is gone too.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_virtual_content_allows_empty_container() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("empty.zip");

        let result = ZipArchiver::new(&dest)
            .archive(
                MemorySource::new().with_virtual_content(),
                &ArchiveOptions::default(),
            )
            .unwrap();
        assert_eq!(result.entries_written, 0);

        let archive = ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_overwrite_disabled_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("keep.zip");
        fs::write(&dest, b"precious").unwrap();

        let err = ZipArchiver::new(&dest)
            .archive(sample_source(), &ArchiveOptions::new().overwrite(false))
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(fs::read(&dest).unwrap(), b"precious");
    }

    #[test]
    fn test_directory_destination_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ZipArchiver::new(dir.path())
            .archive(sample_source(), &ArchiveOptions::default())
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_content_is_task_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");

        let mut source = MemorySource::new();
        let mut entry = Entry::new(EntryName::new("ghost.txt").unwrap(), EntryKind::File);
        entry.content = ContentSource::Path(PathBuf::from("/no/such/payload"));
        source.push(entry);

        let err = ZipArchiver::new(&dest)
            .archive(source, &ArchiveOptions::default())
            .unwrap_err();
        assert!(err.is_task_failure());
        assert_eq!(err.entry_name(), Some("ghost.txt"));
        assert!(!dest.exists());
    }

    #[test]
    fn test_archiving_destination_into_itself_fails() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("tree");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a.txt"), b"content").unwrap();
        let dest = src.join("trap.zip");
        fs::write(&dest, b"old archive").unwrap();

        let err = ZipArchiver::new(&dest)
            .archive(DirectorySource::new(&src), &ArchiveOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::SelfInclusion { .. }));
        // The old archive is left exactly as it was.
        assert_eq!(fs::read(&dest).unwrap(), b"old archive");
    }

    #[test]
    fn test_mixed_kinds_roundtrip_container() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("mixed.zip");

        let source = MemorySource::new()
            .directory("d")
            .unwrap()
            .file("d/f", b"payload".to_vec())
            .unwrap()
            .symlink("d/ln", "f")
            .unwrap();
        ZipArchiver::new(&dest)
            .archive(source, &ArchiveOptions::default())
            .unwrap();

        let mut archive = ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);
        let link = archive.by_name("d/ln").unwrap();
        assert_eq!(link.unix_mode().unwrap() & 0o170000, 0o120000);
    }
}
