//! Path string utilities for the enumeration engine.
//!
//! The engine works on textual paths: filespecs carry pattern characters and
//! mixed separators, so `std::path` canonicalization is the wrong tool. Both
//! `/` and `\` are accepted as separators everywhere; comparisons are
//! case-insensitive like the legacy platform matcher.

pub(crate) fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// The last component of a path, after any separator.
pub(crate) fn file_name(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Strip one leading `./` (or `.\`), if present.
pub(crate) fn strip_initial_dot_slash(path: &str) -> Option<&str> {
    if path.starts_with("./") || path.starts_with(".\\") {
        Some(&path[2..])
    } else {
        None
    }
}

/// Normalize a directory path for walking and comparison: separators become
/// `/`, runs of separators collapse to one (a UNC `\\server\share` prefix
/// keeps its double separator), trailing separators are trimmed except on
/// roots (`/`, `//`, `c:/`), and interior `.` segments disappear — the same
/// spelling identities the regex compiler reduces, so walked paths always
/// line up with the compiled pattern. A leading `./` on a relative path is
/// meaningful (it controls result spelling) and stays. `..` segments are
/// kept; this is a textual cleanup, not resolution.
pub(crate) fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let bytes = path.as_bytes();
    let unc = bytes.len() >= 2
        && matches!(bytes[0], b'/' | b'\\')
        && matches!(bytes[1], b'/' | b'\\');
    let rooted = !unc && matches!(bytes[0], b'/' | b'\\');

    let mut out = String::with_capacity(path.len());
    if unc {
        out.push_str("//");
    } else if rooted {
        out.push('/');
    }
    let root_len = out.len();

    let mut first_segment = true;
    for segment in path.split(is_separator) {
        if segment.is_empty() {
            continue;
        }
        if segment == "." && (!first_segment || unc || rooted) {
            continue;
        }
        if out.len() > root_len {
            out.push('/');
        }
        out.push_str(segment);
        first_segment = false;
    }

    if out.ends_with(':') {
        out.push('/');
    }
    out
}

/// Normalization used for map keys and base-directory comparisons:
/// [`normalize_path`] plus case folding.
pub(crate) fn comparison_key(path: &str) -> String {
    normalize_path(path).to_lowercase()
}

/// Normalize a wildcard directory part for stepping: separators become `/`,
/// empty and `.` segments disappear, and the trailing separator is dropped.
/// The result is what the walker consumes segment by segment.
pub(crate) fn normalize_wildcard(wildcard_dir: &str) -> String {
    let mut out = String::with_capacity(wildcard_dir.len());
    for segment in wildcard_dir.split(is_separator) {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(segment);
    }
    out
}

/// Case- and separator-insensitive path equality, ignoring trailing
/// separators.
pub fn paths_equal(a: &str, b: &str) -> bool {
    comparison_key(a) == comparison_key(b)
}

/// True when `child` lies strictly underneath `parent`. Both arguments must
/// already be comparison keys. An empty parent (the current directory for a
/// relative walk) contains every relative child.
pub(crate) fn is_subdirectory_of(child: &str, parent: &str) -> bool {
    if parent.is_empty() {
        return true;
    }
    if !child.starts_with(parent) {
        return false;
    }
    parent.ends_with('/') || child[parent.len()..].starts_with('/')
}

/// Combine a base directory and a possibly-relative path. Rooted paths
/// (leading separator or drive prefix) win outright.
pub(crate) fn combine_paths(base: &str, path: &str) -> String {
    if base.is_empty() || is_rooted(path) {
        return path.to_string();
    }
    if path.is_empty() {
        return base.to_string();
    }
    let mut out = String::with_capacity(base.len() + path.len() + 1);
    out.push_str(base);
    if !base.ends_with(is_separator) {
        out.push('/');
    }
    out.push_str(path);
    out
}

fn is_rooted(path: &str) -> bool {
    path.starts_with(is_separator)
        || (path.len() >= 2 && path.as_bytes()[1] == b':' && path.as_bytes()[0].is_ascii_alphabetic())
}

/// Strip a leading project directory from a walked path, honoring whether
/// the project directory already ends in a separator. Paths outside the
/// project directory come back unchanged.
pub(crate) fn remove_project_directory(path: &str, project_directory: &str) -> String {
    if !starts_with_path(path, project_directory) {
        return path.to_string();
    }
    if project_directory.ends_with(is_separator) {
        return path[project_directory.len()..].to_string();
    }
    let rest = &path[project_directory.len()..];
    match rest.chars().next() {
        Some(c) if is_separator(c) => rest[1..].to_string(),
        // Same-prefix sibling such as `srcfoo` under project `src`.
        _ => path.to_string(),
    }
}

/// Prefix check tolerant of separator flavor and ASCII case.
fn starts_with_path(path: &str, prefix: &str) -> bool {
    if path.len() < prefix.len() {
        return false;
    }
    path.chars().zip(prefix.chars()).all(|(a, b)| {
        (is_separator(a) && is_separator(b)) || a.eq_ignore_ascii_case(&b)
    })
}
