//! The recursive walk.
//!
//! A walk steps through the wildcard directory part one segment at a time,
//! enumerating subdirectories only where a segment requires it and
//! collecting files once the remaining wildcard allows them. Exclude
//! filespecs ride along in two forms:
//!
//! - **lockstep excludes** share the include's base directory and advance
//!   in parallel at every step;
//! - **deferred excludes** are rooted below the include's base and only
//!   activate once the walk reaches their directory.
//!
//! When a lockstep exclude provably dominates the include for a whole
//! subtree, the subtree is pruned without touching the disk.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use crate::paths::{self, comparison_key};
use crate::split::{is_recursive_directory_match, RECURSIVE_DIR_MATCH};
use crate::wildcard::{is_all_files_wildcard, is_match};
use crate::{list_accessible, FileSystem, FileSystemEntity, FsResult};

/// Immutable per-walk matching data. Exactly one of `filespec` and `regex`
/// is set: a bare filename pattern suffices unless the wildcard directory
/// part constrains intermediate directories, in which case the compiled
/// regex runs against full candidate paths.
#[derive(Debug)]
pub(crate) struct SearchData {
    pub filespec: Option<String>,
    pub regex: Option<Regex>,
    pub needs_recursion: bool,
}

impl SearchData {
    pub fn new(filespec: Option<String>, regex: Option<Regex>, needs_recursion: bool) -> Arc<Self> {
        debug_assert!(filespec.is_some() != regex.is_some());
        Arc::new(Self {
            filespec,
            regex,
            needs_recursion,
        })
    }
}

/// The mutable position of one search: where it currently is and how much
/// of its wildcard directory part is still unconsumed.
#[derive(Debug, Clone)]
pub(crate) struct RecursionState {
    pub base_directory: String,
    pub remaining_wildcard: String,
    pub search: Arc<SearchData>,
}

/// Per-directory decisions derived from a [`RecursionState`].
struct StepResult {
    consider_files: bool,
    needs_to_process_each_file: bool,
    directory_pattern: Option<String>,
    remaining_wildcard: String,
    needs_directory_recursion: bool,
}

/// Walk-wide inputs threaded through the recursion.
pub(crate) struct WalkContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub project_directory: Option<&'a str>,
    pub strip_project_directory: bool,
}

fn compute_step(state: &RecursionState) -> StepResult {
    let remaining = state.remaining_wildcard.as_str();
    let consider_files = remaining.is_empty() || remaining.starts_with(RECURSIVE_DIR_MATCH);
    let needs_to_process_each_file = state.search.filespec.is_none();

    let mut directory_pattern = None;
    let mut next_remaining = String::new();
    if state.search.needs_recursion && !remaining.is_empty() {
        if is_recursive_directory_match(remaining) {
            // `**` never advances: every subdirectory stays recursive.
            next_remaining = RECURSIVE_DIR_MATCH.to_string();
        } else {
            let slash = remaining.find(paths::is_separator);
            let segment = match slash {
                Some(i) => &remaining[..i],
                None => remaining,
            };
            if segment == RECURSIVE_DIR_MATCH {
                // A `**` head with more to follow: the regex carries the
                // rest of the constraint, enumeration must take everything.
                next_remaining = RECURSIVE_DIR_MATCH.to_string();
            } else {
                directory_pattern = Some(segment.to_string());
                next_remaining = match slash {
                    Some(i) => remaining[i + 1..].to_string(),
                    None => String::new(),
                };
            }
        }
    }

    StepResult {
        consider_files,
        needs_to_process_each_file,
        directory_pattern,
        remaining_wildcard: next_remaining,
        needs_directory_recursion: state.search.needs_recursion && !remaining.is_empty(),
    }
}

/// Match one candidate file against a search: the bare filename against the
/// filename pattern, or the whole path against the compiled regex.
fn match_file_step(state: &RecursionState, file: &str) -> bool {
    match &state.search.filespec {
        Some(spec) => {
            is_all_files_wildcard(spec) || is_match(paths::file_name(file), spec)
        }
        None => state
            .search
            .regex
            .as_ref()
            .is_some_and(|regex| regex.is_match(file)),
    }
}

fn files_for_step(
    step: &StepResult,
    state: &RecursionState,
    ctx: &WalkContext<'_>,
) -> FsResult<Vec<String>> {
    debug_assert!(step.consider_files);
    let pattern = state.search.filespec.as_deref();
    let mut files = list_accessible(ctx.fs, FileSystemEntity::Files, &state.base_directory, pattern)?;

    if ctx.strip_project_directory {
        if let Some(project) = ctx.project_directory {
            for file in files.iter_mut() {
                *file = paths::remove_project_directory(file, project);
            }
        }
    }
    Ok(files)
}

/// Collect every file reachable from `state` that matches the include and
/// no exclude. Any I/O failure other than the tolerated ones aborts the
/// whole walk; the caller degrades to returning the filespec verbatim.
pub(crate) fn get_files_recursive(
    results: &mut Vec<String>,
    state: &RecursionState,
    lockstep_excludes: &[RecursionState],
    deferred_excludes: &HashMap<String, Vec<RecursionState>>,
    ctx: &WalkContext<'_>,
) -> FsResult<()> {
    let step = compute_step(state);
    let exclude_steps: Vec<StepResult> = lockstep_excludes.iter().map(compute_step).collect();

    // A lockstep exclude that still has the same wildcard directory to
    // consume and a filename pattern covering the include's swallows this
    // directory and everything below it.
    for exclude in lockstep_excludes {
        debug_assert!(
            comparison_key(&exclude.base_directory) == comparison_key(&state.base_directory),
            "lockstep excludes must share the include's base directory"
        );
        if exclude.remaining_wildcard != state.remaining_wildcard {
            continue;
        }
        if let Some(exclude_spec) = &exclude.search.filespec {
            let dominates = is_all_files_wildcard(exclude_spec)
                || state.search.filespec.as_deref() == Some(exclude_spec.as_str());
            if dominates {
                return Ok(());
            }
        }
    }

    if step.consider_files {
        let files = files_for_step(&step, state, ctx)?;
        'files: for file in files {
            if step.needs_to_process_each_file && !match_file_step(state, &file) {
                continue;
            }
            for (exclude, exclude_step) in lockstep_excludes.iter().zip(&exclude_steps) {
                if exclude_step.consider_files && match_file_step(exclude, &file) {
                    continue 'files;
                }
            }
            results.push(file);
        }
    }

    if step.needs_directory_recursion {
        let subdirs = list_accessible(
            ctx.fs,
            FileSystemEntity::Directories,
            &state.base_directory,
            step.directory_pattern.as_deref(),
        )?;

        for subdir in subdirs {
            let next_state = RecursionState {
                base_directory: subdir.clone(),
                remaining_wildcard: step.remaining_wildcard.clone(),
                search: state.search.clone(),
            };

            // Carry forward the lockstep excludes that also recurse into
            // this particular subdirectory.
            let mut next_excludes: Vec<RecursionState> = Vec::new();
            for (exclude, exclude_step) in lockstep_excludes.iter().zip(&exclude_steps) {
                let follows = exclude_step.needs_directory_recursion
                    && match &exclude_step.directory_pattern {
                        None => true,
                        Some(pattern) => is_match(paths::file_name(&subdir), pattern),
                    };
                if follows {
                    next_excludes.push(RecursionState {
                        base_directory: subdir.clone(),
                        remaining_wildcard: exclude_step.remaining_wildcard.clone(),
                        search: exclude.search.clone(),
                    });
                }
            }

            // Deferred excludes whose base directory this is become lockstep.
            if let Some(activated) = deferred_excludes.get(&comparison_key(&subdir)) {
                for exclude in activated {
                    next_excludes.push(RecursionState {
                        base_directory: subdir.clone(),
                        remaining_wildcard: exclude.remaining_wildcard.clone(),
                        search: exclude.search.clone(),
                    });
                }
            }

            get_files_recursive(results, &next_state, &next_excludes, deferred_excludes, ctx)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryFileSystem;

    fn filename_search(filespec: &str, needs_recursion: bool) -> Arc<SearchData> {
        SearchData::new(Some(filespec.to_string()), None, needs_recursion)
    }

    fn walk(
        fs: &MemoryFileSystem,
        state: RecursionState,
        excludes: Vec<RecursionState>,
    ) -> Vec<String> {
        let ctx = WalkContext {
            fs,
            project_directory: None,
            strip_project_directory: false,
        };
        let mut results = Vec::new();
        get_files_recursive(&mut results, &state, &excludes, &HashMap::new(), &ctx).unwrap();
        results.sort();
        results
    }

    #[test]
    fn flat_directory_with_filename_pattern() {
        let fs = MemoryFileSystem::new()
            .file("src/a.cs")
            .file("src/b.txt");
        let state = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: String::new(),
            search: filename_search("*.cs", false),
        };
        assert_eq!(walk(&fs, state, vec![]), vec!["src/a.cs"]);
    }

    #[test]
    fn recursive_wildcard_descends() {
        let fs = MemoryFileSystem::new()
            .file("src/a.cs")
            .file("src/b.txt")
            .file("src/sub/c.cs")
            .file("src/sub/deep/d.cs");
        let state = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: "**".into(),
            search: filename_search("*.cs", true),
        };
        assert_eq!(
            walk(&fs, state, vec![]),
            vec!["src/a.cs", "src/sub/c.cs", "src/sub/deep/d.cs"]
        );
    }

    #[test]
    fn single_level_wildcard_prunes_non_matching_directories() {
        let fs = MemoryFileSystem::new()
            .file("src/app1/a.cs")
            .file("src/app2/b.cs")
            .file("src/lib/c.cs");
        let state = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: "app*".into(),
            search: filename_search("*.cs", true),
        };
        assert_eq!(
            walk(&fs, state, vec![]),
            vec!["src/app1/a.cs", "src/app2/b.cs"]
        );
        // The lib subtree was never even listed.
        assert!(!fs.listed_directories().iter().any(|d| d.contains("lib")));
    }

    #[test]
    fn dominated_subtree_is_pruned_without_listing() {
        let fs = MemoryFileSystem::new()
            .file("src/a.cs")
            .file("src/sub/b.cs");
        let search = filename_search("*.cs", true);
        let state = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: "**".into(),
            search: search.clone(),
        };
        let exclude = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: "**".into(),
            search: filename_search("*.*", true),
        };
        assert!(walk(&fs, state, vec![exclude]).is_empty());
        assert!(fs.listed_directories().is_empty());
    }

    #[test]
    fn lockstep_exclude_filters_files() {
        let fs = MemoryFileSystem::new()
            .file("src/a.cs")
            .file("src/a.obj")
            .file("src/sub/b.cs")
            .file("src/sub/b.obj");
        let state = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: "**".into(),
            search: filename_search("*.*", true),
        };
        let exclude = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: "**".into(),
            search: filename_search("*.obj", true),
        };
        assert_eq!(
            walk(&fs, state, vec![exclude]),
            vec!["src/a.cs", "src/sub/b.cs"]
        );
    }

    #[test]
    fn exclude_with_directory_pattern_follows_matching_subdirs_only() {
        let fs = MemoryFileSystem::new()
            .file("src/app/a.cs")
            .file("src/lib/b.cs");
        let state = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: "**".into(),
            search: filename_search("*.cs", true),
        };
        // Exclude src/app/*.cs: one concrete directory step, then files.
        let exclude = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: "app".into(),
            search: filename_search("*.cs", true),
        };
        assert_eq!(walk(&fs, state, vec![exclude]), vec!["src/lib/b.cs"]);
    }

    #[test]
    fn deferred_exclude_activates_at_its_base() {
        let fs = MemoryFileSystem::new()
            .file("src/a.cs")
            .file("src/sub/b.cs")
            .file("src/sub/deep/c.cs");
        let state = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: "**".into(),
            search: filename_search("*.cs", true),
        };
        let deferred = RecursionState {
            base_directory: "src/sub".into(),
            remaining_wildcard: "**".into(),
            search: filename_search("*.cs", true),
        };
        let mut map = HashMap::new();
        map.insert(comparison_key("src/sub"), vec![deferred]);

        let ctx = WalkContext {
            fs: &fs,
            project_directory: None,
            strip_project_directory: false,
        };
        let mut results = Vec::new();
        get_files_recursive(&mut results, &state, &[], &map, &ctx).unwrap();
        assert_eq!(results, vec!["src/a.cs"]);
    }

    #[test]
    fn io_errors_abort_the_walk() {
        let fs = MemoryFileSystem::new()
            .file("src/a.cs")
            .file("src/bad/b.cs")
            .fail("src/bad");
        let state = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: "**".into(),
            search: filename_search("*.cs", true),
        };
        let ctx = WalkContext {
            fs: &fs,
            project_directory: None,
            strip_project_directory: false,
        };
        let mut results = Vec::new();
        let err = get_files_recursive(&mut results, &state, &[], &HashMap::new(), &ctx);
        assert!(err.is_err());
    }

    #[test]
    fn denied_directories_are_silently_empty() {
        let fs = MemoryFileSystem::new()
            .file("src/a.cs")
            .file("src/locked/b.cs")
            .deny("src/locked");
        let state = RecursionState {
            base_directory: "src".into(),
            remaining_wildcard: "**".into(),
            search: filename_search("*.cs", true),
        };
        assert_eq!(walk(&fs, state, vec![]), vec!["src/a.cs"]);
    }
}
