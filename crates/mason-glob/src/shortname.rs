//! Short-name (`~`) segment resolution.
//!
//! The legacy platform generates 8.3 aliases like `RUNTIM~1` for long
//! directory names. Filespecs may carry them; matching must happen against
//! canonical long names, so each `~`-containing segment is resolved by
//! probing the filesystem for the entry it denotes. Segments that resolve
//! to nothing (or on filesystems without aliases) are kept verbatim.

use crate::paths::is_separator;
use crate::wildcard;
use crate::{list_accessible, FileSystem, FileSystemEntity};

/// Resolve `~`-containing segments of `path` to their canonical names.
///
/// Paths without `~` come back untouched, separators included. Resolved
/// paths are rebuilt with `/`. UNC (`\\server\share\`) and drive-letter
/// roots are never probed. Must not be called with wildcards in the path.
pub(crate) fn get_long_path_name(path: &str, fs: &dyn FileSystem) -> String {
    if !path.contains('~') {
        return path.to_string();
    }
    debug_assert!(
        !wildcard::has_wildcards(path),
        "get_long_path_name does not handle wildcards: {path:?}"
    );

    let parts: Vec<&str> = path.split(is_separator).collect();
    let is_unc = {
        let mut lead = path.chars();
        matches!(
            (lead.next(), lead.next()),
            (Some(a), Some(b)) if is_separator(a) && is_separator(b)
        )
    };

    let (root, start) = if is_unc {
        if parts.len() < 4 {
            // Malformed UNC; nothing sensible to probe.
            return path.to_string();
        }
        (format!("//{}/{}/", parts[2], parts[3]), 4)
    } else if parts[0].ends_with(':') {
        (format!("{}/", parts[0]), 1)
    } else {
        (String::new(), 0)
    };

    let mut long_parts: Vec<String> = Vec::with_capacity(parts.len() - start);
    let mut long_path = root.clone();

    for (i, part) in parts.iter().enumerate().skip(start) {
        // Empty parts come from doubled separators; keep them as-is.
        if part.is_empty() {
            long_parts.push(String::new());
            continue;
        }
        if !part.contains('~') {
            long_parts.push(part.to_string());
            long_path = append(&long_path, part);
            continue;
        }

        let entries = list_accessible(
            fs,
            FileSystemEntity::FilesAndDirectories,
            &long_path,
            Some(part),
        )
        .unwrap_or_default();

        match entries.as_slice() {
            [] => {
                // Not found on disk: keep the rest of the path verbatim.
                long_parts.extend(parts[i..].iter().map(|p| p.to_string()));
                break;
            }
            [single] => {
                let resolved = crate::paths::file_name(single).to_string();
                long_path = append(&long_path, &resolved);
                long_parts.push(resolved);
            }
            _ => {
                debug_assert!(false, "short-name probe for {part:?} was ambiguous");
                long_parts.extend(parts[i..].iter().map(|p| p.to_string()));
                break;
            }
        }
    }

    format!("{root}{}", long_parts.join("/"))
}

fn append(base: &str, part: &str) -> String {
    if base.is_empty() {
        part.to_string()
    } else if base.ends_with(is_separator) {
        format!("{base}{part}")
    } else {
        format!("{base}/{part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryFileSystem;
    use crate::{FileSystem, FileSystemEntity, FsResult};

    /// Filesystem that answers short-name probes like the legacy platform:
    /// a `~` pattern resolves to a canned long name.
    struct AliasFs {
        inner: MemoryFileSystem,
        alias: (String, String),
    }

    impl FileSystem for AliasFs {
        fn list(
            &self,
            entity: FileSystemEntity,
            dir: &str,
            pattern: Option<&str>,
        ) -> FsResult<Vec<String>> {
            if let Some(pat) = pattern {
                if pat.eq_ignore_ascii_case(&self.alias.0) {
                    let dir = dir.trim_end_matches(['/', '\\']);
                    let joined = if dir.is_empty() || dir == "." {
                        self.alias.1.clone()
                    } else {
                        format!("{dir}/{}", self.alias.1)
                    };
                    return Ok(vec![joined]);
                }
            }
            self.inner.list(entity, dir, pattern)
        }

        fn dir_exists(&self, dir: &str) -> bool {
            self.inner.dir_exists(dir)
        }
    }

    #[test]
    fn path_without_tilde_is_untouched() {
        let fs = MemoryFileSystem::new();
        assert_eq!(get_long_path_name("src\\sub/", &fs), "src\\sub/");
    }

    #[test]
    fn tilde_segment_resolves_to_long_name() {
        let fs = AliasFs {
            inner: MemoryFileSystem::new().dir("runtimes"),
            alias: ("runtim~1".into(), "runtimes".into()),
        };
        assert_eq!(get_long_path_name("runtim~1/native/", &fs), "runtimes/native/");
    }

    #[test]
    fn unresolved_tilde_keeps_remainder_verbatim() {
        let fs = MemoryFileSystem::new().dir("src");
        assert_eq!(get_long_path_name("src/missi~1/x/", &fs), "src/missi~1/x/");
    }

    #[test]
    fn drive_root_is_not_probed() {
        let fs = MemoryFileSystem::new();
        assert_eq!(get_long_path_name("c:/missi~1/", &fs), "c:/missi~1/");
    }

    #[test]
    fn unc_root_is_preserved() {
        let fs = MemoryFileSystem::new();
        assert_eq!(
            get_long_path_name("\\\\server\\share\\missi~1\\x", &fs),
            "//server/share/missi~1/x"
        );
    }

    #[test]
    fn doubled_separators_survive() {
        let fs = MemoryFileSystem::new().dir("src");
        assert_eq!(get_long_path_name("src//missi~1", &fs), "src//missi~1");
    }
}
