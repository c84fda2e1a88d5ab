//! In-memory filesystem for exercising the engine in tests.

use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;

use crate::paths;
use crate::wildcard::{is_all_files_wildcard, is_match};
use crate::{FileSystem, FileSystemEntity, FileSystemError, FsResult};

/// A fixture filesystem built from path strings. Relative and absolute
/// paths both work; parent directories are implied. Directories can be
/// marked access-denied or broken to drive the error paths.
#[derive(Debug, Default)]
pub(crate) struct MemoryFileSystem {
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
    denied: HashSet<String>,
    broken: HashSet<String>,
    listed: Mutex<Vec<String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str) -> Self {
        let key = canonical_key(path);
        self.add_ancestors(&key);
        self.files.insert(key);
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        let key = canonical_key(path);
        self.add_ancestors(&key);
        self.dirs.insert(key);
        self
    }

    /// Listing this directory reports access denied.
    pub fn deny(mut self, dir: &str) -> Self {
        self.denied.insert(canonical_key(dir));
        self
    }

    /// Listing this directory reports a hard I/O error.
    pub fn fail(mut self, dir: &str) -> Self {
        self.broken.insert(canonical_key(dir));
        self
    }

    /// Every directory a `list` call was attempted on, in call order.
    pub fn listed_directories(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    fn add_ancestors(&mut self, key: &str) {
        let mut current = parent(key);
        while !current.is_empty() {
            if !self.dirs.insert(current.to_string()) {
                break;
            }
            if current == "/" {
                break;
            }
            current = parent(&current).to_string();
        }
    }
}

fn parent(path: &str) -> String {
    match path.rfind('/') {
        None => String::new(),
        Some(0) => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

/// Collapse a lookup path the way a real filesystem would: separators
/// unified, `.` segments resolved, trailing separators ignored.
fn canonical_key(path: &str) -> String {
    let norm = paths::normalize_path(path);
    let absolute = norm.starts_with('/');
    let mut joined = String::with_capacity(norm.len());
    for segment in norm.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() || dir.ends_with(['/', '\\']) {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

impl FileSystem for MemoryFileSystem {
    fn list(
        &self,
        entity: FileSystemEntity,
        dir: &str,
        pattern: Option<&str>,
    ) -> FsResult<Vec<String>> {
        let key = canonical_key(dir);
        self.listed.lock().unwrap().push(key.clone());

        if self.denied.contains(&key) {
            return Err(FileSystemError::PermissionDenied(dir.to_string()));
        }
        if self.broken.contains(&key) {
            return Err(FileSystemError::Io(format!("device error: {dir}")));
        }
        if !key.is_empty() && !self.dirs.contains(&key) {
            return Err(FileSystemError::NotFound(dir.to_string()));
        }

        let filter = pattern.filter(|p| !is_all_files_wildcard(p));
        let mut out = Vec::new();
        let mut push_children = |pool: &BTreeSet<String>| {
            for path in pool {
                if parent(path) != key {
                    continue;
                }
                let name = paths::file_name(path);
                if let Some(pat) = filter {
                    if !is_match(name, pat) {
                        continue;
                    }
                }
                out.push(join(dir, name));
            }
        };

        match entity {
            FileSystemEntity::Files => push_children(&self.files),
            FileSystemEntity::Directories => push_children(&self.dirs),
            FileSystemEntity::FilesAndDirectories => {
                push_children(&self.files);
                push_children(&self.dirs);
            }
        }
        Ok(out)
    }

    fn dir_exists(&self, dir: &str) -> bool {
        let key = canonical_key(dir);
        key.is_empty() || self.dirs.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implies_parent_directories() {
        let fs = MemoryFileSystem::new().file("src/sub/deep/a.cs");
        assert!(fs.dir_exists("src"));
        assert!(fs.dir_exists("src/sub"));
        assert!(fs.dir_exists("src/sub/deep"));
        assert!(!fs.dir_exists("src/other"));
    }

    #[test]
    fn lists_children_with_caller_prefix() {
        let fs = MemoryFileSystem::new().file("src/a.cs").file("src/sub/b.cs");
        let files = fs.list(FileSystemEntity::Files, "src", None).unwrap();
        assert_eq!(files, vec!["src/a.cs"]);
        let dirs = fs.list(FileSystemEntity::Directories, "src", None).unwrap();
        assert_eq!(dirs, vec!["src/sub"]);
    }

    #[test]
    fn resolves_dot_segments_like_a_real_filesystem() {
        let fs = MemoryFileSystem::new().file("src/a.cs");
        let files = fs.list(FileSystemEntity::Files, "src/.", None).unwrap();
        assert_eq!(files, vec!["src/./a.cs"]);
        assert!(fs.dir_exists("src/./"));
    }

    #[test]
    fn absolute_paths_work() {
        let fs = MemoryFileSystem::new().file("/proj/src/a.cs");
        assert!(fs.dir_exists("/proj/src"));
        let files = fs.list(FileSystemEntity::Files, "/proj/src", None).unwrap();
        assert_eq!(files, vec!["/proj/src/a.cs"]);
    }

    #[test]
    fn patterns_narrow_listings() {
        let fs = MemoryFileSystem::new().file("src/a.cs").file("src/b.txt");
        let files = fs
            .list(FileSystemEntity::Files, "src", Some("*.cs"))
            .unwrap();
        assert_eq!(files, vec!["src/a.cs"]);
        let all = fs.list(FileSystemEntity::Files, "src", Some("*.*")).unwrap();
        assert_eq!(all.len(), 2);
    }
}
