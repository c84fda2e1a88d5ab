//! Process-wide result cache for file enumerations.
//!
//! Keyed by a textual digest of `(project directory, include, excludes)`.
//! Each key owns one slot holding a once-published result and a monitor;
//! at most one walk runs per key, later callers wait on the monitor and
//! then observe the published array. Reads after publication are lock-free.
//! Hits hand out a fresh copy so callers can never corrupt the cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::debug;

/// Environment knob that turns the process-wide enumeration cache on for
/// [`crate::FileMatcher::default`].
pub(crate) const CACHE_ENV_KNOB: &str = "MASON_CACHE_FILE_ENUMERATIONS";

struct CacheSlot {
    value: OnceLock<Arc<Vec<String>>>,
    monitor: Mutex<()>,
}

static ENUMERATIONS: OnceLock<Mutex<HashMap<String, Arc<CacheSlot>>>> = OnceLock::new();

fn slots() -> &'static Mutex<HashMap<String, Arc<CacheSlot>>> {
    ENUMERATIONS.get_or_init(|| Mutex::new(HashMap::new()))
}

pub(crate) fn caching_enabled_from_env() -> bool {
    std::env::var(CACHE_ENV_KNOB)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

pub(crate) fn cache_key(
    project_directory: Option<&str>,
    filespec: &str,
    excludes: &[&str],
) -> String {
    let mut key = String::with_capacity(
        project_directory.map_or(0, str::len) + filespec.len() + excludes.len() * 8,
    );
    key.push_str(project_directory.unwrap_or(""));
    key.push('\n');
    key.push_str(filespec);
    for exclude in excludes {
        key.push('\n');
        key.push_str(exclude);
    }
    key
}

/// Return the cached result for `key`, computing and publishing it first if
/// necessary. The returned vector is always a private copy.
pub(crate) fn get_or_compute(key: &str, compute: impl FnOnce() -> Vec<String>) -> Vec<String> {
    let slot = {
        let mut map = slots().lock().unwrap();
        map.entry(key.to_string())
            .or_insert_with(|| {
                Arc::new(CacheSlot {
                    value: OnceLock::new(),
                    monitor: Mutex::new(()),
                })
            })
            .clone()
    };

    if let Some(published) = slot.value.get() {
        debug!(key, "file enumeration cache hit");
        return published.as_ref().clone();
    }

    let _guard = slot.monitor.lock().unwrap();
    if let Some(published) = slot.value.get() {
        return published.as_ref().clone();
    }

    debug!(key, "file enumeration cache miss");
    let computed = Arc::new(compute());
    let result = computed.as_ref().clone();
    let _ = slot.value.set(computed);
    result
}

/// Drop every cached enumeration. Test hook.
pub fn clear_file_enumeration_cache() {
    slots().lock().unwrap().clear();
}
