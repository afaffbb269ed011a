//! Filesystem metadata application and buffered copying.
//!
//! Metadata application is best effort: a file that landed on disk with
//! the wrong mtime or mode is still a successfully processed entry, so
//! failures here are logged rather than propagated.

use crate::COPY_BUFFER_SIZE;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::SystemTime;

/// Sets a file's modification time.
pub(crate) fn apply_mtime(path: &Path, modified: SystemTime) {
    let mtime = filetime::FileTime::from_system_time(modified);
    if let Err(e) = filetime::set_file_mtime(path, mtime) {
        log::warn!(
            "failed to set modification time on '{}': {}",
            path.display(),
            e
        );
    }
}

/// Sets a file's permission bits.
///
/// File-type bits in `mode` are ignored; only the permission bits apply.
#[cfg(unix)]
pub(crate) fn apply_permissions(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    let permissions = fs::Permissions::from_mode(mode & 0o7777);
    if let Err(e) = fs::set_permissions(path, permissions) {
        log::warn!("failed to set permissions on '{}': {}", path.display(), e);
    }
}

#[cfg(not(unix))]
pub(crate) fn apply_permissions(_path: &Path, _mode: u32) {}

/// Creates a directory and all of its ancestors.
///
/// Workers create directories concurrently; losing a creation race to a
/// sibling task is not an error.
pub(crate) fn ensure_dir(path: &Path) -> io::Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(_) if path.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Creates the parent directory of a path about to be written.
pub(crate) fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Creates a symbolic link at `at` pointing to `link`.
#[cfg(unix)]
pub(crate) fn materialize_symlink(link: impl AsRef<Path>, at: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, at)
}

#[cfg(not(unix))]
pub(crate) fn materialize_symlink(_link: impl AsRef<Path>, at: &Path) -> io::Result<()> {
    Err(io::Error::other(format!(
        "cannot create symbolic link '{}' on this platform",
        at.display()
    )))
}

/// Copies everything from `reader` to `writer`.
///
/// Returns the number of bytes copied.
pub(crate) fn copy_streaming(reader: &mut dyn Read, writer: &mut dyn Write) -> io::Result<u64> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

/// Copies everything from `reader` to `writer` while hashing it.
///
/// Returns the number of bytes copied and their CRC-32.
pub(crate) fn copy_checked(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
) -> io::Result<(u64, u32)> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut hasher = crc32fast::Hasher::new();
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok((total, hasher.finalize()))
}
