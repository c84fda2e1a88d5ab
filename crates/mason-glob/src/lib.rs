//! mason-glob: Filespec matching and file enumeration.
//!
//! This is the file-selection primitive used when mason evaluates item
//! specifications. Given an include filespec (a path pattern with `*`, `?`
//! and `**` wildcards) and an optional set of exclude filespecs, it returns
//! the filesystem paths matching the include and none of the excludes.
//!
//! Provides:
//! - **FileMatcher**: the engine; [`FileMatcher::get_files`] is the entry point
//! - **is_match**: standalone `*`/`?` matching on single filename components
//! - **FileSystem**: a minimal read-only filesystem trait the walker runs
//!   against; [`OsFileSystem`] is the default adapter, tests inject fakes
//! - **FileMatcher::file_match / get_file_spec_info**: compile a filespec to
//!   a regex and classify it without walking
//!
//! Filespecs accept `/` and `\` interchangeably. Matching is
//! case-insensitive throughout, mirroring the legacy platform matcher the
//! engine's semantics are inherited from.

mod cache;
mod compile;
mod matcher;
mod os;
mod paths;
mod shortname;
mod split;
mod walk;
pub mod wildcard;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::clear_file_enumeration_cache;
pub use matcher::{FileMatcher, FileSpecInfo, MatchResult};
pub use os::OsFileSystem;
pub use wildcard::{has_wildcards, has_wildcards_semicolon_item_or_property_references, is_match};

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsResult<T> = Result<T, FileSystemError>;

/// Errors from filesystem operations underneath the walker.
#[derive(Debug, Clone, Error)]
pub enum FileSystemError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for FileSystemError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => FileSystemError::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => FileSystemError::PermissionDenied(err.to_string()),
            _ => FileSystemError::Io(err.to_string()),
        }
    }
}

/// What to enumerate from a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSystemEntity {
    Files,
    Directories,
    FilesAndDirectories,
}

/// Minimal read-only filesystem abstraction for the enumeration engine.
///
/// Implement this trait to run the engine against something other than the
/// local disk (an overlay, a fixture tree in tests). Adapters report errors
/// faithfully; the engine itself decides which of them degrade to empty
/// listings.
pub trait FileSystem: Send + Sync {
    /// List the entries of `dir` as full paths (the entry name appended to
    /// `dir` as given, so relative directories yield relative paths).
    ///
    /// When `pattern` is present, entries are narrowed to names matching it
    /// as a `*`/`?` wildcard pattern; `None` and the all-files wildcards
    /// (`*`, `*.*`) return everything.
    fn list(&self, entity: FileSystemEntity, dir: &str, pattern: Option<&str>)
        -> FsResult<Vec<String>>;

    /// Check whether `dir` exists and is a directory.
    fn dir_exists(&self, dir: &str) -> bool;
}

/// List a directory through the adapter, applying the engine's access rules:
///
/// - the implicit current directory is scanned as `./`;
/// - missing directories and access-denied both yield an empty listing, any
///   other I/O error propagates;
/// - patterns the legacy platform matcher treats too loosely (a `?`-suffixed
///   pattern, or a three-character extension alongside `*`) are re-filtered
///   through the wildcard matcher;
/// - the synthetic `./` prefix is stripped from results unless the caller
///   supplied one itself.
pub(crate) fn list_accessible(
    fs: &dyn FileSystem,
    entity: FileSystemEntity,
    dir: &str,
    pattern: Option<&str>,
) -> FsResult<Vec<String>> {
    let scan = if dir.is_empty() { "./" } else { dir };
    let mut entries = match fs.list(entity, scan, pattern) {
        Ok(entries) => entries,
        Err(FileSystemError::NotFound(_)) | Err(FileSystemError::PermissionDenied(_)) => {
            return Ok(Vec::new());
        }
        Err(err) => return Err(err),
    };

    if let Some(pat) = pattern {
        if should_enforce_matching(pat) {
            entries.retain(|entry| wildcard::is_match(paths::file_name(entry), pat));
        }
    }

    if !(dir == "." || dir.starts_with("./") || dir.starts_with(".\\")) {
        for entry in entries.iter_mut() {
            if let Some(stripped) = paths::strip_initial_dot_slash(entry) {
                *entry = stripped.to_string();
            }
        }
    }

    Ok(entries)
}

/// True when the raw listing for `pattern` cannot be trusted and must be
/// re-filtered through the wildcard matcher.
///
/// The legacy platform enumerator matches loosely in these cases: a pattern
/// ending in `?` also matches names one character shorter (`file.tx?`
/// matches `file.tx`), and a three-character extension combined with `*`
/// also matches longer extensions (`*.htm` matches `file.html`, an artifact
/// of 8.3 short names).
pub(crate) fn should_enforce_matching(pattern: &str) -> bool {
    if pattern.ends_with('?') {
        return true;
    }
    match pattern.rfind('.') {
        Some(dot) => pattern.len() - dot - 1 == 3 && pattern.contains('*'),
        None => false,
    }
}
