//! Public entry points: [`FileMatcher`] and its result types.
//!
//! `get_files` is the item-evaluation primitive: expand one include
//! filespec against the filesystem, minus whatever the exclude filespecs
//! cover. The degradation rules are inherited from the legacy platform and
//! deliberate:
//!
//! - an include without wildcards is returned as-is (excludes permitting),
//!   whether or not it exists;
//! - an illegal include is returned verbatim;
//! - a fixed directory that does not exist yields nothing;
//! - an I/O failure mid-walk yields the include verbatim.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::cache;
use crate::compile;
use crate::paths::{self, comparison_key, paths_equal};
use crate::shortname;
use crate::split::{self, is_recursive_directory_match, RECURSIVE_DIR_MATCH};
use crate::walk::{self, RecursionState, SearchData, WalkContext};
use crate::wildcard::has_wildcards;
use crate::{FileSystem, OsFileSystem};

/// Outcome of [`FileMatcher::file_match`].
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub is_legal_file_spec: bool,
    pub is_match: bool,
    pub is_file_spec_recursive: bool,
    pub fixed_directory_part: String,
    pub wildcard_directory_part: String,
    pub filename_part: String,
}

impl MatchResult {
    fn illegal() -> Self {
        Self::default()
    }
}

/// Outcome of [`FileMatcher::get_file_spec_info`]: the split parts, the
/// compiled regex text and the legality verdict for a filespec.
#[derive(Debug, Clone, Default)]
pub struct FileSpecInfo {
    pub fixed_directory_part: String,
    pub wildcard_directory_part: String,
    pub filename_part: String,
    /// Regex text matching the whole filespec, with `FIXEDDIR`,
    /// `WILDCARDDIR` and `FILENAME` capture groups. `None` when illegal.
    pub match_regex: Option<String>,
    pub needs_recursion: bool,
    pub is_legal_file_spec: bool,
}

impl FileSpecInfo {
    fn illegal() -> Self {
        Self::default()
    }
}

enum SearchAction {
    RunSearch(SearchPlan),
    ReturnFileSpec,
    ReturnEmptyList,
}

struct SearchPlan {
    state: RecursionState,
    strip_project_directory: bool,
}

/// The filespec matching and enumeration engine.
///
/// Holds the filesystem to enumerate against and the caching policy.
/// Matchers are cheap to clone and safe to share across threads; the result
/// cache itself is process-wide.
///
/// # Examples
/// ```no_run
/// use mason_glob::FileMatcher;
///
/// let matcher = FileMatcher::default();
/// let sources = matcher.get_files(None, "src/**/*.cs", &["src/**/obj/**"]);
/// ```
#[derive(Clone)]
pub struct FileMatcher {
    file_system: Arc<dyn FileSystem>,
    caching: bool,
}

impl Default for FileMatcher {
    /// The OS-backed matcher, with the process-wide cache switched by the
    /// `MASON_CACHE_FILE_ENUMERATIONS` environment variable.
    fn default() -> Self {
        Self {
            file_system: Arc::new(OsFileSystem),
            caching: cache::caching_enabled_from_env(),
        }
    }
}

impl FileMatcher {
    /// A matcher over a custom filesystem, caching off.
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        Self {
            file_system,
            caching: false,
        }
    }

    /// Override the caching policy.
    pub fn with_caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    /// Expand `filespec` into the set of matching files, minus anything the
    /// excludes cover.
    ///
    /// When `project_directory` is given, relative fixed directories are
    /// resolved against it and the results come back project-relative.
    pub fn get_files(
        &self,
        project_directory: Option<&str>,
        filespec: &str,
        excludes: &[&str],
    ) -> Vec<String> {
        if !self.caching {
            return self.get_files_implementation(project_directory, filespec, excludes);
        }
        let key = cache::cache_key(project_directory, filespec, excludes);
        cache::get_or_compute(&key, || {
            self.get_files_implementation(project_directory, filespec, excludes)
        })
    }

    /// Split a filespec, compile it, and report legality. The filesystem is
    /// only consulted for short-name (`~`) resolution of the fixed part.
    pub fn get_file_spec_info(&self, filespec: &str) -> FileSpecInfo {
        if !raw_file_spec_is_valid(filespec) {
            return FileSpecInfo::illegal();
        }
        let (fixed, wildcard, filename) =
            split::split_file_spec(filespec, self.file_system.as_ref());
        match compile::regular_expression_from_parts(&fixed, &wildcard, &filename) {
            Some(pattern) => {
                let needs_recursion = !wildcard.is_empty();
                FileSpecInfo {
                    fixed_directory_part: fixed,
                    wildcard_directory_part: wildcard,
                    filename_part: filename,
                    match_regex: Some(pattern),
                    needs_recursion,
                    is_legal_file_spec: true,
                }
            }
            None => FileSpecInfo::illegal(),
        }
    }

    /// Match one candidate path against a filespec, resolving short names
    /// in the candidate first.
    pub fn file_match(&self, filespec: &str, file_to_match: &str) -> MatchResult {
        let info = self.get_file_spec_info(filespec);
        let pattern = match &info.match_regex {
            Some(pattern) if info.is_legal_file_spec => pattern,
            _ => return MatchResult::illegal(),
        };
        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(_) => return MatchResult::illegal(),
        };

        let resolved = shortname::get_long_path_name(file_to_match, self.file_system.as_ref());
        match regex.captures(&resolved) {
            Some(caps) => MatchResult {
                is_legal_file_spec: true,
                is_match: true,
                is_file_spec_recursive: info.needs_recursion,
                fixed_directory_part: caps["FIXEDDIR"].to_string(),
                wildcard_directory_part: caps["WILDCARDDIR"].to_string(),
                filename_part: caps["FILENAME"].to_string(),
            },
            None => MatchResult {
                is_legal_file_spec: true,
                is_match: false,
                is_file_spec_recursive: info.needs_recursion,
                ..MatchResult::default()
            },
        }
    }

    fn get_files_implementation(
        &self,
        project_directory: Option<&str>,
        filespec: &str,
        excludes: &[&str],
    ) -> Vec<String> {
        // No wildcards: the filespec is its own (sole) result.
        if !has_wildcards(filespec) {
            return self.single_item_if_not_excluded(filespec, excludes);
        }

        let plan = match self.get_file_search_data(project_directory, filespec) {
            SearchAction::ReturnEmptyList => return Vec::new(),
            SearchAction::ReturnFileSpec => {
                return self.single_item_if_not_excluded(filespec, excludes)
            }
            SearchAction::RunSearch(plan) => plan,
        };

        let mut lockstep: Vec<RecursionState> = Vec::new();
        let mut deferred: HashMap<String, Vec<RecursionState>> = HashMap::new();
        let mut literal_excludes: HashSet<String> = HashSet::new();

        for exclude in excludes {
            if paths_equal(filespec, exclude) {
                // The exclude swallows the include outright.
                return Vec::new();
            }

            let exclude_plan = match self.get_file_search_data(project_directory, exclude) {
                SearchAction::ReturnFileSpec => {
                    // Illegal excludes are legacy-compatible literal paths:
                    // subtract them from the results afterwards.
                    literal_excludes.insert(comparison_key(exclude));
                    continue;
                }
                // Nonexistent exclude base: it cannot cover anything.
                SearchAction::ReturnEmptyList => continue,
                SearchAction::RunSearch(plan) => plan,
            };
            let mut exclude_state = exclude_plan.state;

            let include_key = comparison_key(&plan.state.base_directory);
            let exclude_key = comparison_key(&exclude_state.base_directory);

            if exclude_key == include_key {
                lockstep.push(exclude_state);
            } else if exclude_key.len() == include_key.len() {
                // Sibling base directory: disjoint from the include.
            } else if exclude_key.len() > include_key.len() {
                if paths::is_subdirectory_of(&exclude_key, &include_key) {
                    // Activate only once the walk reaches the exclude's base.
                    deferred.entry(exclude_key).or_default().push(exclude_state);
                }
            } else {
                // The exclude is rooted above the include.
                if !paths::is_subdirectory_of(&include_key, &exclude_key) {
                    continue;
                }
                if !exclude_state.search.needs_recursion {
                    // It only names files above the include's base.
                    continue;
                }
                // Rebase onto the include. A plain `**` keeps its filename
                // pattern; anything else is already regex-matched on full
                // paths, so enumeration just stops pruning for it.
                if !is_recursive_directory_match(&exclude_state.remaining_wildcard) {
                    exclude_state.remaining_wildcard = RECURSIVE_DIR_MATCH.to_string();
                }
                exclude_state.base_directory = plan.state.base_directory.clone();
                lockstep.push(exclude_state);
            }
        }

        let ctx = WalkContext {
            fs: self.file_system.as_ref(),
            project_directory,
            strip_project_directory: plan.strip_project_directory,
        };
        let mut results = Vec::new();
        if let Err(err) =
            walk::get_files_recursive(&mut results, &plan.state, &lockstep, &deferred, &ctx)
        {
            debug!(%err, filespec, "enumeration failed, returning the filespec verbatim");
            return vec![filespec.to_string()];
        }

        if !literal_excludes.is_empty() {
            results.retain(|file| !literal_excludes.contains(&comparison_key(file)));
        }
        results
    }

    /// Classify a filespec for walking: where to start, what remains of the
    /// wildcard directory, and whether files need the full-path regex.
    fn get_file_search_data(
        &self,
        project_directory: Option<&str>,
        filespec: &str,
    ) -> SearchAction {
        let info = self.get_file_spec_info(filespec);
        if !info.is_legal_file_spec {
            return SearchAction::ReturnFileSpec;
        }

        let mut fixed = info.fixed_directory_part.clone();
        let mut strip_project_directory = false;
        if let Some(project) = project_directory {
            if !fixed.is_empty() {
                let combined = paths::combine_paths(project, &fixed);
                strip_project_directory = !paths_equal(&combined, &fixed);
                fixed = combined;
            } else {
                fixed = project.to_string();
                strip_project_directory = true;
            }
        }

        if !fixed.is_empty() && !self.file_system.dir_exists(&fixed) {
            return SearchAction::ReturnEmptyList;
        }

        // A wildcard directory that is anything other than a plain `**`
        // constrains intermediate directories, which only the compiled
        // regex can check.
        let wildcard = &info.wildcard_directory_part;
        let match_with_regex = !wildcard.is_empty() && !is_recursive_directory_match(wildcard);

        let search = if match_with_regex {
            let regex = info
                .match_regex
                .as_deref()
                .and_then(|pattern| Regex::new(pattern).ok());
            match regex {
                Some(regex) => SearchData::new(None, Some(regex), info.needs_recursion),
                None => return SearchAction::ReturnFileSpec,
            }
        } else {
            SearchData::new(Some(info.filename_part.clone()), None, info.needs_recursion)
        };

        SearchAction::RunSearch(SearchPlan {
            state: RecursionState {
                base_directory: paths::normalize_path(&fixed),
                remaining_wildcard: paths::normalize_wildcard(wildcard),
                search,
            },
            strip_project_directory,
        })
    }

    /// The no-walk degradation path: the filespec itself is the result,
    /// unless an exclude covers it.
    fn single_item_if_not_excluded(&self, filespec: &str, excludes: &[&str]) -> Vec<String> {
        for exclude in excludes {
            if paths_equal(filespec, exclude) {
                return Vec::new();
            }
            let result = self.file_match(exclude, filespec);
            if result.is_legal_file_spec && result.is_match {
                return Vec::new();
            }
        }
        vec![filespec.to_string()]
    }
}

/// Structural checks that need no splitting: a `...` anywhere or a colon
/// anywhere but the second character make a filespec illegal.
fn raw_file_spec_is_valid(filespec: &str) -> bool {
    if filespec.contains('\0') || filespec.contains("...") {
        return false;
    }
    match filespec.rfind(':') {
        Some(i) => i == 1,
        None => true,
    }
}
