//! Path identity and display helpers.
//!
//! Discovery deduplicates by *physical directory*, so two spellings of the
//! same directory (a symlink, a `./` prefix, NFD vs NFC on macOS) must map
//! to one key. [`directory_key`] canonicalizes and then normalizes to NFC.
//!
//! Provenance markers show paths relative to the working directory with
//! forward slashes, produced by [`relative_display`].

use std::path::{Component, Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

/// Normalize a path string to NFC (Composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Normalize a [`Path`] to NFC form.
///
/// Paths that are not valid UTF-8 are returned unchanged.
#[must_use]
pub fn normalize_pathbuf(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) if !unicode_normalization::is_nfc(s) => PathBuf::from(normalize_path_str(s)),
        _ => path.to_path_buf(),
    }
}

/// Identity key for a directory: canonical, NFC-normalized path.
///
/// Falls back to the lexically cleaned path when canonicalization fails
/// (the directory vanished or is unreadable).
#[must_use]
pub fn directory_key(path: &Path) -> PathBuf {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| clean_path(path));
    normalize_pathbuf(&resolved)
}

/// Lexically remove `.` components and fold `..` where possible.
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Render `path` relative to `base` using forward slashes.
///
/// Paths outside `base` climb with `..`. When the two share no common
/// root (different drive prefixes) the absolute path is returned.
#[must_use]
pub fn relative_display(path: &Path, base: &Path) -> String {
    let path = clean_path(path);
    let base = clean_path(base);

    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    match (path_parts.first(), base_parts.first()) {
        (Some(a), Some(b)) if a != b => return to_slash(&path),
        _ => {}
    }

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat_n("..".to_string(), base_parts.len() - common));
    parts.extend(
        path_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

fn to_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    if cfg!(windows) {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

/// Whether `path` lies under `ancestor` (or equals it), by identity key.
#[must_use]
pub fn is_within(path: &Path, ancestor: &Path) -> bool {
    directory_key(path).starts_with(directory_key(ancestor))
}

/// Basename of a path as an owned string.
#[must_use]
pub fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
