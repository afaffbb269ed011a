//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test
//! file compiles as a separate crate and may only use a subset of these
//! helpers.

#![allow(dead_code)]

use std::fs;
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;

/// Creates a small source tree with nested directories and mixed content.
///
/// Layout:
///
/// ```text
/// base/
///   a.txt            "alpha"
///   empty.bin        (zero bytes)
///   big.bin          300 KiB patterned data
///   sub/
///     b.txt          "beta"
///     deep/
///       c.txt        "gamma"
/// ```
pub fn build_tree(base: &Path) {
    fs::create_dir_all(base.join("sub/deep")).unwrap();
    fs::write(base.join("a.txt"), b"alpha").unwrap();
    fs::write(base.join("empty.bin"), b"").unwrap();
    fs::write(base.join("big.bin"), patterned(300 * 1024)).unwrap();
    fs::write(base.join("sub/b.txt"), b"beta").unwrap();
    fs::write(base.join("sub/deep/c.txt"), b"gamma").unwrap();
}

/// Deterministic non-repeating-looking bytes for content checks.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 7 + i / 251) % 256) as u8).collect()
}

/// Collects every file below `base` as sorted `(relative name, bytes)`
/// pairs, using forward slashes regardless of platform.
pub fn snapshot_files(base: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    for entry in WalkDir::new(base).min_depth(1).sort_by_file_name() {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .strip_prefix(base)
            .unwrap()
            .components()
            .map(|c| c.as_os_str().to_str().unwrap())
            .collect::<Vec<_>>()
            .join("/");
        files.push((name, fs::read(entry.path()).unwrap()));
    }
    files.sort();
    files
}

/// Lists the entry names recorded in a ZIP container, sorted.
///
/// Opens the container with the `zip` crate directly, so these
/// assertions double as an interoperability check.
pub fn container_names(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut names = Vec::new();
    for index in 0..archive.len() {
        names.push(archive.by_index(index).unwrap().name().to_string());
    }
    names.sort();
    names
}

/// Reads one entry's decompressed bytes straight from a container.
pub fn container_entry(path: &Path, name: &str) -> Vec<u8> {
    let file = fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut data = Vec::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_end(&mut data)
        .unwrap();
    data
}
