//! Filespec splitting.
//!
//! A filespec decomposes into three parts:
//!
//! - `fixed_dir`: the longest leading directory portion with no wildcard,
//!   including its trailing separator;
//! - `wildcard_dir`: the middle directory portion containing directory-level
//!   wildcards, including the trailing separator of its last segment;
//! - `filename`: the last segment, which may itself contain `*`/`?`.
//!
//! `src/**/sub?/*.cs` splits into `src/` + `**/sub?/` + `*.cs`.

use crate::paths::is_separator;
use crate::shortname;
use crate::FileSystem;

/// The `**` wildcard: matches any number of intermediate directories.
pub(crate) const RECURSIVE_DIR_MATCH: &str = "**";

/// True when a wildcard directory part is nothing but `**` (any trailing
/// separators ignored).
pub(crate) fn is_recursive_directory_match(wildcard_dir: &str) -> bool {
    wildcard_dir.trim_end_matches(is_separator) == RECURSIVE_DIR_MATCH
}

/// Split a filespec into its fixed, wildcard and filename parts.
///
/// A trailing `**` segment is folded into the wildcard directory part with
/// the filename becoming `*.*`, so `src/**` enumerates every file under
/// `src`. Short-name (`~`) segments in the fixed part are resolved against
/// the filesystem.
pub(crate) fn split_file_spec(
    filespec: &str,
    fs: &dyn FileSystem,
) -> (String, String, String) {
    let (fixed, wildcard, filename) = filespec_parts(filespec);
    let mut fixed = fixed.to_string();
    let mut wildcard = wildcard.to_string();
    let mut filename = filename.to_string();

    if filename == RECURSIVE_DIR_MATCH {
        wildcard.push_str(RECURSIVE_DIR_MATCH);
        wildcard.push('/');
        filename = "*.*".to_string();
    }

    fixed = shortname::get_long_path_name(&fixed, fs);

    (fixed, wildcard, filename)
}

fn filespec_parts(filespec: &str) -> (&str, &str, &str) {
    let last_separator = filespec.rfind(is_separator);
    let last_separator = match last_separator {
        // No separator: the whole spec is a filename (or bare wildcard).
        None => return ("", "", filespec),
        Some(i) => i,
    };

    let first_wildcard = filespec.find(['*', '?']);
    match first_wildcard {
        // No wildcard, or the only wildcards are in the last segment.
        None => {
            return (&filespec[..=last_separator], "", &filespec[last_separator + 1..]);
        }
        Some(w) if w > last_separator => {
            return (&filespec[..=last_separator], "", &filespec[last_separator + 1..]);
        }
        Some(w) => {
            // A wildcard sits in a directory segment. The fixed part ends at
            // the last separator before it.
            match filespec[..w].rfind(is_separator) {
                None => ("", &filespec[..=last_separator], &filespec[last_separator + 1..]),
                Some(s) => (
                    &filespec[..=s],
                    &filespec[s + 1..=last_separator],
                    &filespec[last_separator + 1..],
                ),
            }
        }
    }
}
