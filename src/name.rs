//! Validated archive entry names.

use crate::{Error, Result};
use std::fmt;
use std::path::{Component, Path};

/// Maximum length for entry names (in bytes).
///
/// The ZIP format stores the name length in a 16-bit field, so no valid
/// entry can carry a longer name. Enforcing the cap here also bounds the
/// damage a hostile archive can do with absurdly long names.
const MAX_NAME_LENGTH: usize = 65535;

/// A validated, archive-relative entry name.
///
/// `EntryName` always uses forward slashes and is guaranteed to stay
/// inside the directory it is resolved against:
/// - No NUL bytes are present
/// - The name is not absolute (no leading `/`, no drive prefix)
/// - No empty segments exist (no `//`)
/// - No `.` or `..` segments are present
///
/// Names are created two ways. [`EntryName::new`] validates caller-supplied
/// names strictly and rejects anything out of shape. [`EntryName::sanitize`]
/// is the lenient extraction-side path: it repairs what it safely can
/// (separators, root markers) and returns `None` for names that cannot be
/// used at all.
///
/// # Examples
///
/// ```
/// use parzip::EntryName;
///
/// let name = EntryName::new("dir/file.txt").unwrap();
/// assert_eq!(name.as_str(), "dir/file.txt");
///
/// assert!(EntryName::new("../secret").is_err());
/// assert!(EntryName::new("/absolute/path").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryName(String);

impl EntryName {
    /// Creates a new `EntryName` from a string, validating it.
    ///
    /// A single trailing slash (the conventional directory marker) is
    /// stripped; whether an entry is a directory is carried by its kind,
    /// not its name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the name:
    /// - Is empty
    /// - Contains NUL bytes
    /// - Is absolute (leading `/` or a drive prefix such as `C:`)
    /// - Contains empty segments (e.g. `a//b`)
    /// - Contains `.` or `..` segments
    /// - Exceeds the 16-bit length limit of the container format
    pub fn new(s: impl AsRef<str>) -> Result<Self> {
        let s = s.as_ref();
        let trimmed = s.strip_suffix('/').unwrap_or(s);
        Self::validate(trimmed)?;
        Ok(Self(trimmed.to_string()))
    }

    /// Validates an entry name string.
    fn validate(s: &str) -> Result<()> {
        if s.is_empty() {
            return Err(invalid(s, "empty name"));
        }
        if s.contains('\0') {
            return Err(invalid(s, "contains NUL byte"));
        }
        if s.len() > MAX_NAME_LENGTH {
            return Err(invalid(
                s,
                &format!("exceeds maximum length of {} bytes", MAX_NAME_LENGTH),
            ));
        }
        if s.starts_with('/') {
            return Err(invalid(s, "absolute name not allowed"));
        }
        if has_drive_prefix(s) {
            return Err(invalid(s, "drive prefix not allowed"));
        }
        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(invalid(s, "empty segment (consecutive slashes)"));
            }
            if segment == "." {
                return Err(invalid(s, "'.' segment not allowed"));
            }
            if segment == ".." {
                return Err(invalid(s, "'..' segment not allowed"));
            }
        }
        Ok(())
    }

    /// Repairs a raw name read from an archive, or rejects it.
    ///
    /// This is the extraction-side counterpart of [`EntryName::new`].
    /// Archives in the wild carry backslash separators, root markers and
    /// drive prefixes; all of those are stripped so the remainder resolves
    /// inside the extraction directory. Returns `None` when nothing usable
    /// remains: the raw name was empty or pure separators, contained a NUL
    /// byte, contained a `..` segment, or was longer than the format allows.
    ///
    /// # Examples
    ///
    /// ```
    /// use parzip::EntryName;
    ///
    /// let name = EntryName::sanitize("/etc/passwd").unwrap();
    /// assert_eq!(name.as_str(), "etc/passwd");
    ///
    /// assert!(EntryName::sanitize("../outside").is_none());
    /// assert!(EntryName::sanitize("/").is_none());
    /// ```
    pub fn sanitize(raw: &str) -> Option<Self> {
        if raw.contains('\0') || raw.len() > MAX_NAME_LENGTH {
            return None;
        }
        let mut normalized = raw.replace('\\', "/");
        while has_drive_prefix(&normalized) {
            normalized.drain(..2);
        }
        let mut segments = Vec::new();
        for segment in normalized.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }
            if segment == ".." {
                return None;
            }
            segments.push(segment);
        }
        if segments.is_empty() {
            return None;
        }
        Some(Self(segments.join("/")))
    }

    /// Builds an entry name from a relative filesystem path.
    ///
    /// Each normal path component becomes one name segment; `.` components
    /// are skipped. Platform separators are replaced by forward slashes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the path is absolute, escapes
    /// upward with `..`, contains a component that is not valid UTF-8, or
    /// yields an empty name.
    pub fn from_relative_path(path: &Path) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(os) => {
                    let segment = os.to_str().ok_or_else(|| {
                        Error::config(format!(
                            "path '{}' contains a non-UTF-8 component",
                            path.display()
                        ))
                    })?;
                    segments.push(segment);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::config(format!(
                        "path '{}' is not a plain relative path",
                        path.display()
                    )));
                }
            }
        }
        Self::new(segments.join("/"))
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the file name (last segment) of this entry name.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns an iterator over the name segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use parzip::EntryName;
    ///
    /// let name = EntryName::new("a/b/c.txt").unwrap();
    /// let segments: Vec<_> = name.components().collect();
    /// assert_eq!(segments, vec!["a", "b", "c.txt"]);
    /// ```
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns true if this name starts with the given prefix.
    ///
    /// The comparison is segment-wise, not a string prefix match:
    /// `"foo/bar"` starts with `"foo"` but not with `"fo"`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return true;
        }
        let mut own = self.components();
        for wanted in prefix.split('/') {
            match own.next() {
                Some(segment) if segment == wanted => {}
                _ => return false,
            }
        }
        true
    }
}

/// Checks for a Windows drive prefix such as `C:`.
fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn invalid(name: &str, reason: &str) -> Error {
    Error::config(format!("invalid entry name '{}': {}", name.escape_debug(), reason))
}

impl AsRef<str> for EntryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for EntryName {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntryName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn test_valid_simple_file() {
        let name = EntryName::new("file.txt").unwrap();
        assert_eq!(name.as_str(), "file.txt");
    }

    #[test]
    fn test_valid_nested_name() {
        let name = EntryName::new("dir/file.txt").unwrap();
        assert_eq!(name.as_str(), "dir/file.txt");
    }

    #[test]
    fn test_valid_unicode() {
        let name = EntryName::new("日本語/файл.txt").unwrap();
        assert_eq!(name.as_str(), "日本語/файл.txt");
    }

    #[test]
    fn test_valid_dotfile() {
        let name = EntryName::new(".gitignore").unwrap();
        assert_eq!(name.as_str(), ".gitignore");
    }

    #[test]
    fn test_valid_double_dots_in_name() {
        let name = EntryName::new("file..txt").unwrap();
        assert_eq!(name.as_str(), "file..txt");
    }

    #[test]
    fn test_valid_triple_dots() {
        let name = EntryName::new("...").unwrap();
        assert_eq!(name.as_str(), "...");
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let name = EntryName::new("dir/sub/").unwrap();
        assert_eq!(name.as_str(), "dir/sub");
    }

    #[test]
    fn test_backslash_is_literal() {
        // A backslash is a legal byte in Unix filenames; strict
        // construction keeps it as-is.
        let name = EntryName::new("odd\\name").unwrap();
        assert_eq!(name.as_str(), "odd\\name");
    }

    #[test]
    fn test_invalid_empty() {
        let err = EntryName::new("").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("empty name"));
    }

    #[test]
    fn test_invalid_bare_slash() {
        assert!(EntryName::new("/").is_err());
    }

    #[test]
    fn test_invalid_nul_byte() {
        let err = EntryName::new("file\0.txt").unwrap_err();
        assert!(err.to_string().contains("NUL"));
    }

    #[test]
    fn test_invalid_absolute() {
        let err = EntryName::new("/etc/passwd").unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn test_invalid_drive_prefix() {
        let err = EntryName::new("C:/evil.txt").unwrap_err();
        assert!(err.to_string().contains("drive"));
    }

    #[test]
    fn test_invalid_empty_segment() {
        let err = EntryName::new("a//b").unwrap_err();
        assert!(err.to_string().contains("empty segment"));
    }

    #[test]
    fn test_invalid_dot_segment() {
        assert!(EntryName::new("./file").is_err());
        assert!(EntryName::new("a/./b").is_err());
    }

    #[test]
    fn test_invalid_dotdot_segment() {
        assert!(EntryName::new("../secret").is_err());
        assert!(EntryName::new("a/../b").is_err());
    }

    #[test]
    fn test_invalid_too_long() {
        let long = "a".repeat(MAX_NAME_LENGTH + 1);
        let err = EntryName::new(&long).unwrap_err();
        assert!(err.to_string().contains("maximum length"));
    }

    // ============================================================================
    // sanitize() tests
    // ============================================================================

    #[test]
    fn test_sanitize_passthrough() {
        let name = EntryName::sanitize("dir/file.txt").unwrap();
        assert_eq!(name.as_str(), "dir/file.txt");
    }

    #[test]
    fn test_sanitize_backslash_separators() {
        let name = EntryName::sanitize("dir\\sub\\file.txt").unwrap();
        assert_eq!(name.as_str(), "dir/sub/file.txt");
    }

    #[test]
    fn test_sanitize_strips_leading_slash() {
        let name = EntryName::sanitize("/etc/passwd").unwrap();
        assert_eq!(name.as_str(), "etc/passwd");
    }

    #[test]
    fn test_sanitize_strips_drive_prefix() {
        let name = EntryName::sanitize("C:\\Windows\\evil.dll").unwrap();
        assert_eq!(name.as_str(), "Windows/evil.dll");
    }

    #[test]
    fn test_sanitize_drops_dot_and_empty_segments() {
        let name = EntryName::sanitize("./a//./b").unwrap();
        assert_eq!(name.as_str(), "a/b");
    }

    #[test]
    fn test_sanitize_strips_directory_marker() {
        let name = EntryName::sanitize("dir/sub/").unwrap();
        assert_eq!(name.as_str(), "dir/sub");
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(EntryName::sanitize("../outside").is_none());
        assert!(EntryName::sanitize("a/../../b").is_none());
        assert!(EntryName::sanitize("..\\..\\x").is_none());
        // Rejected even when the segments would resolve inside.
        assert!(EntryName::sanitize("a/../b").is_none());
    }

    #[test]
    fn test_sanitize_rejects_root_markers() {
        assert!(EntryName::sanitize("").is_none());
        assert!(EntryName::sanitize("/").is_none());
        assert!(EntryName::sanitize("//").is_none());
        assert!(EntryName::sanitize("./").is_none());
        assert!(EntryName::sanitize("\\").is_none());
    }

    #[test]
    fn test_sanitize_rejects_nul() {
        assert!(EntryName::sanitize("file\0.txt").is_none());
    }

    #[test]
    fn test_sanitize_rejects_overlong() {
        let long = "a".repeat(MAX_NAME_LENGTH + 1);
        assert!(EntryName::sanitize(&long).is_none());
    }

    // ============================================================================
    // from_relative_path() tests
    // ============================================================================

    #[test]
    fn test_from_relative_path_simple() {
        let name = EntryName::from_relative_path(Path::new("dir/file.txt")).unwrap();
        assert_eq!(name.as_str(), "dir/file.txt");
    }

    #[test]
    fn test_from_relative_path_skips_curdir() {
        let name = EntryName::from_relative_path(Path::new("./dir/file.txt")).unwrap();
        assert_eq!(name.as_str(), "dir/file.txt");
    }

    #[test]
    fn test_from_relative_path_rejects_absolute() {
        assert!(EntryName::from_relative_path(Path::new("/abs/file")).is_err());
    }

    #[test]
    fn test_from_relative_path_rejects_parent() {
        assert!(EntryName::from_relative_path(Path::new("../file")).is_err());
    }

    #[test]
    fn test_from_relative_path_rejects_empty() {
        assert!(EntryName::from_relative_path(&PathBuf::new()).is_err());
    }

    // ============================================================================
    // Accessor and trait impl tests
    // ============================================================================

    #[test]
    fn test_file_name() {
        assert_eq!(EntryName::new("file.txt").unwrap().file_name(), "file.txt");
        assert_eq!(
            EntryName::new("dir/sub/file.txt").unwrap().file_name(),
            "file.txt"
        );
    }

    #[test]
    fn test_components() {
        let name = EntryName::new("a/b/c.txt").unwrap();
        let segments: Vec<_> = name.components().collect();
        assert_eq!(segments, vec!["a", "b", "c.txt"]);
    }

    #[test]
    fn test_starts_with() {
        let name = EntryName::new("dir/subdir/file.txt").unwrap();
        assert!(name.starts_with(""));
        assert!(name.starts_with("dir"));
        assert!(name.starts_with("dir/subdir"));
        assert!(name.starts_with("dir/subdir/file.txt"));
        assert!(!name.starts_with("di"));
        assert!(!name.starts_with("other"));
    }

    #[test]
    fn test_starts_with_longer_prefix() {
        let name = EntryName::new("a/b").unwrap();
        assert!(!name.starts_with("a/b/c"));
    }

    #[test]
    fn test_display_and_as_ref() {
        let name = EntryName::new("dir/file.txt").unwrap();
        assert_eq!(format!("{}", name), "dir/file.txt");
        let s: &str = name.as_ref();
        assert_eq!(s, "dir/file.txt");
    }

    #[test]
    fn test_ordering() {
        let a = EntryName::new("a").unwrap();
        let b = EntryName::new("b").unwrap();
        let aa = EntryName::new("aa").unwrap();
        assert!(a < b);
        assert!(a < aa);
        assert!(aa < b);
    }

    #[test]
    fn test_hash_consistency() {
        let name1 = EntryName::new("dir/file.txt").unwrap();
        let name2 = EntryName::new("dir/file.txt").unwrap();
        let mut set = HashSet::new();
        set.insert(name1.clone());
        assert!(set.contains(&name2));
    }

    #[test]
    fn test_try_from() {
        let from_str: EntryName = "dir/file.txt".try_into().unwrap();
        assert_eq!(from_str.as_str(), "dir/file.txt");
        let from_string: EntryName = String::from("dir/file.txt").try_into().unwrap();
        assert_eq!(from_string.as_str(), "dir/file.txt");
    }
}
