//! Worker-pool behaviour across thread counts.
//!
//! The same inputs must produce equivalent archives and extractions no
//! matter how many workers run, and results must account for every entry
//! exactly once. Entry order inside a container may differ between runs;
//! these tests compare unordered sets and extracted bytes.

mod common;

use parzip::{
    ArchiveOptions, DirectorySource, ExtractOptions, Threads, ZipArchiver, ZipUnarchiver,
};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

fn count(n: usize) -> Threads {
    Threads::Count(NonZeroUsize::new(n).unwrap())
}

fn build_many(base: &Path, files: usize) {
    fs::create_dir_all(base.join("batch")).unwrap();
    for i in 0..files {
        let body = format!("payload {i} {}", "x".repeat(i % 97));
        fs::write(base.join(format!("batch/file_{i:03}.txt")), body).unwrap();
    }
}

#[test]
fn test_archive_equivalent_across_pool_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    build_many(&src, 60);

    let mut snapshots = Vec::new();
    for (label, threads) in [
        ("single", Threads::Single),
        ("four", count(4)),
        ("sixty_four", count(64)),
    ] {
        let archive = dir.path().join(format!("{label}.zip"));
        let result = ZipArchiver::new(&archive)
            .archive(
                DirectorySource::new(&src),
                &ArchiveOptions::new().threads(threads),
            )
            .unwrap();
        // 60 files plus the batch directory.
        assert_eq!(result.entries_written, 61, "pool {label}");

        let dest = dir.path().join(format!("{label}_out"));
        ZipUnarchiver::new(&archive)
            .dest_dir(&dest)
            .extract((), &ExtractOptions::default())
            .unwrap();
        snapshots.push(common::snapshot_files(&dest));

        let mut names = common::container_names(&archive);
        names.sort();
        assert_eq!(names.len(), 61, "pool {label}");
    }
    assert_eq!(snapshots[0], snapshots[1]);
    assert_eq!(snapshots[1], snapshots[2]);
}

#[test]
fn test_extract_equivalent_across_pool_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let archive = dir.path().join("many.zip");
    build_many(&src, 80);
    ZipArchiver::new(&archive)
        .archive(DirectorySource::new(&src), &ArchiveOptions::default())
        .unwrap();

    let reference = common::snapshot_files(&src);
    for (label, threads) in [
        ("single", Threads::Single),
        ("four", count(4)),
        ("wide", count(32)),
    ] {
        let dest = dir.path().join(format!("out_{label}"));
        let result = ZipUnarchiver::new(&archive)
            .dest_dir(&dest)
            .extract((), &ExtractOptions::new().threads(threads))
            .unwrap();
        assert_eq!(result.entries_written, 81, "pool {label}");
        assert_eq!(result.entries_skipped, 0, "pool {label}");
        assert_eq!(reference, common::snapshot_files(&dest), "pool {label}");
    }
}

#[test]
fn test_results_account_for_every_entry() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let archive = dir.path().join("count.zip");
    build_many(&src, 120);

    let archived = ZipArchiver::new(&archive)
        .archive(
            DirectorySource::new(&src),
            &ArchiveOptions::new().threads(count(8)),
        )
        .unwrap();
    assert_eq!(archived.entries_written + archived.entries_skipped, 121);
    assert!(archived.threads_used <= 8);

    let extracted = ZipUnarchiver::new(&archive)
        .dest_dir(dir.path().join("out"))
        .extract((), &ExtractOptions::new().threads(count(8)))
        .unwrap();
    assert_eq!(extracted.entries_written + extracted.entries_skipped, 121);
}

#[test]
fn test_auto_thread_count_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let archive = dir.path().join("auto.zip");
    build_many(&src, 10);

    let result = ZipArchiver::new(&archive)
        .archive(DirectorySource::new(&src), &ArchiveOptions::default())
        .unwrap();
    assert!(result.threads_used >= 1);

    let single = ZipUnarchiver::new(&archive)
        .dest_dir(dir.path().join("out"))
        .extract((), &ExtractOptions::new().threads(Threads::Single))
        .unwrap();
    assert_eq!(single.threads_used, 1);
}

#[test]
fn test_large_entries_do_not_interleave() {
    // Several entries big enough to overlap in flight; each must come back
    // byte-exact.
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    for i in 0..6 {
        let mut body = common::patterned(200 * 1024 + i * 1311);
        body[0] = i as u8;
        fs::write(src.join(format!("blob_{i}.bin")), body).unwrap();
    }
    let archive = dir.path().join("blobs.zip");
    ZipArchiver::new(&archive)
        .archive(
            DirectorySource::new(&src),
            &ArchiveOptions::new().threads(count(6)),
        )
        .unwrap();

    let dest = dir.path().join("out");
    ZipUnarchiver::new(&archive)
        .dest_dir(&dest)
        .extract((), &ExtractOptions::new().threads(count(6)))
        .unwrap();
    assert_eq!(common::snapshot_files(&src), common::snapshot_files(&dest));
}
