//! Directory-to-directory mirroring.
//!
//! End-to-end runs of [`DirArchiver`] over [`DirectorySource`]: full
//! mirrors, incremental reruns that skip up-to-date targets, symlink
//! handling in both modes, and permission handling with preservation on
//! and off.

mod common;

use parzip::{ArchiveOptions, DirArchiver, DirectorySource};
use std::fs;

#[test]
fn test_mirror_tree() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dest = dir.path().join("mirror");
    common::build_tree(&src);

    let result = DirArchiver::new(&dest)
        .archive(DirectorySource::new(&src), &ArchiveOptions::default())
        .unwrap();
    assert_eq!(result.entries_written, 7);
    assert_eq!(result.entries_skipped, 0);
    assert_eq!(common::snapshot_files(&src), common::snapshot_files(&dest));
}

#[test]
fn test_rerun_copies_only_changed_files() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dest = dir.path().join("mirror");
    common::build_tree(&src);

    let archiver = DirArchiver::new(&dest);
    archiver
        .archive(DirectorySource::new(&src), &ArchiveOptions::default())
        .unwrap();

    // An unchanged tree only re-creates directories.
    let rerun = archiver
        .archive(DirectorySource::new(&src), &ArchiveOptions::default())
        .unwrap();
    assert_eq!(rerun.entries_skipped, 5);
    assert_eq!(rerun.entries_written, 2);

    // A touched file copies again; everything else stays skipped.
    fs::write(src.join("a.txt"), b"alpha v2").unwrap();
    let newer =
        filetime::FileTime::from_system_time(std::time::SystemTime::now() + std::time::Duration::from_secs(5));
    filetime::set_file_mtime(src.join("a.txt"), newer).unwrap();
    let third = archiver
        .archive(DirectorySource::new(&src), &ArchiveOptions::default())
        .unwrap();
    assert_eq!(third.entries_skipped, 4);
    assert_eq!(third.entries_written, 3);
    assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"alpha v2");
}

#[cfg(unix)]
#[test]
fn test_symlinks_mirrored_as_links_by_default() {
    use std::os::unix::fs::symlink;
    use std::path::PathBuf;

    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dest = dir.path().join("mirror");
    common::build_tree(&src);
    symlink("a.txt", src.join("alias")).unwrap();

    DirArchiver::new(&dest)
        .archive(DirectorySource::new(&src), &ArchiveOptions::default())
        .unwrap();
    let copied = dest.join("alias");
    assert!(copied.symlink_metadata().unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&copied).unwrap(), PathBuf::from("a.txt"));
}

#[cfg(unix)]
#[test]
fn test_follow_symlinks_copies_target_content() {
    use std::os::unix::fs::symlink;

    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dest = dir.path().join("mirror");
    common::build_tree(&src);
    symlink("a.txt", src.join("alias")).unwrap();

    DirArchiver::new(&dest)
        .archive(
            DirectorySource::new(&src).follow_symlinks(true),
            &ArchiveOptions::default(),
        )
        .unwrap();
    let copied = dest.join("alias");
    // The link was resolved: the mirror holds a regular file with the
    // target's bytes.
    assert!(!copied.symlink_metadata().unwrap().file_type().is_symlink());
    assert_eq!(fs::read(&copied).unwrap(), b"alpha");
}

#[cfg(unix)]
#[test]
fn test_permission_preservation_modes() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    common::build_tree(&src);
    fs::set_permissions(src.join("a.txt"), fs::Permissions::from_mode(0o400)).unwrap();

    let preserved = dir.path().join("preserved");
    DirArchiver::new(&preserved)
        .archive(DirectorySource::new(&src), &ArchiveOptions::default())
        .unwrap();
    let mode = preserved.join("a.txt").metadata().unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o400);

    let plain = dir.path().join("plain");
    DirArchiver::new(&plain)
        .archive(
            DirectorySource::new(&src),
            &ArchiveOptions::new().preserve_permissions(false),
        )
        .unwrap();
    let mode = plain.join("a.txt").metadata().unwrap().permissions().mode();
    // Without preservation the copy keeps the process default, which
    // includes owner write.
    assert_ne!(mode & 0o200, 0);
}

#[test]
fn test_mirror_then_archive_mirror() {
    // A mirror is a faithful source for a later container build.
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let mirror = dir.path().join("mirror");
    let archive = dir.path().join("from-mirror.zip");
    common::build_tree(&src);

    DirArchiver::new(&mirror)
        .archive(DirectorySource::new(&src), &ArchiveOptions::default())
        .unwrap();
    parzip::ZipArchiver::new(&archive)
        .archive(DirectorySource::new(&mirror), &ArchiveOptions::default())
        .unwrap();
    assert_eq!(
        common::container_entry(&archive, "sub/deep/c.txt"),
        b"gamma"
    );
}
