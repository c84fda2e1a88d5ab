//! Wildcard matching for single filename components.
//!
//! Supports `*` (zero or more characters) and `?` (exactly one character).
//! Matching is case-insensitive. The matcher is applied to bare filename
//! components, so there is never a separator boundary for `*` to cross;
//! directory-level wildcards are handled by the compiled regex instead.

use std::collections::HashSet;

/// Check if a string contains filespec wildcards (`*`, `?`).
///
/// ```
/// use mason_glob::has_wildcards;
/// assert!(has_wildcards("*.cs"));
/// assert!(has_wildcards("a?.txt"));
/// assert!(!has_wildcards("src/main.cs"));
/// ```
pub fn has_wildcards(filespec: &str) -> bool {
    filespec.contains(['*', '?'])
}

/// Check if a string contains wildcards, a semicolon, or an item/property
/// reference (`$(`, `@(`).
///
/// Callers use this to decide whether a spec can be taken as a plain path
/// without any evaluation.
pub fn has_wildcards_semicolon_item_or_property_references(filespec: &str) -> bool {
    filespec.contains(['*', '?', ';']) || filespec.contains("$(") || filespec.contains("@(")
}

/// True for the patterns that match every file (`*`, `*.*`).
///
/// `*.*` is inherited from the legacy platform, where it matches all names,
/// extension or not.
pub(crate) fn is_all_files_wildcard(pattern: &str) -> bool {
    pattern == "*" || pattern == "*.*"
}

/// Match a filename against a `*`/`?` wildcard pattern, case-insensitively.
///
/// Returns true if the pattern matches the entire input.
///
/// # Examples
/// ```
/// use mason_glob::is_match;
///
/// assert!(is_match("main.cs", "*.cs"));
/// assert!(is_match("Main.CS", "*.cs"));
/// assert!(is_match("test1", "test?"));
/// assert!(!is_match("main.txt", "*.cs"));
/// ```
pub fn is_match(input: &str, pattern: &str) -> bool {
    // A bare * matches anything; skip the state machine entirely.
    if pattern == "*" {
        return true;
    }

    let input: Vec<char> = input.chars().flat_map(char::to_lowercase).collect();
    let pattern: Vec<char> = pattern.chars().flat_map(char::to_lowercase).collect();

    // Iterative backtracking over (input_pos, pattern_pos) states, memoized
    // so each state is expanded at most once. Worst case O(|input|·|pattern|).
    let mut work = vec![(0usize, 0usize)];
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    seen.insert((0, 0));

    while let Some((i, p)) = work.pop() {
        if p == pattern.len() {
            if i == input.len() {
                return true;
            }
            continue;
        }
        let mut push = |state: (usize, usize), work: &mut Vec<(usize, usize)>| {
            if seen.insert(state) {
                work.push(state);
            }
        };
        match pattern[p] {
            '*' => {
                // Zero characters consumed, or one and stay on the star.
                push((i, p + 1), &mut work);
                if i < input.len() {
                    push((i + 1, p), &mut work);
                }
            }
            '?' => {
                if i < input.len() {
                    push((i + 1, p + 1), &mut work);
                }
            }
            c => {
                if i < input.len() && input[i] == c {
                    push((i + 1, p + 1), &mut work);
                }
            }
        }
    }

    false
}
