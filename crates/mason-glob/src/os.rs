//! Default [`FileSystem`] adapter over the local disk.

use std::fs;

use crate::paths::is_separator;
use crate::wildcard::{is_all_files_wildcard, is_match};
use crate::{FileSystem, FileSystemEntity, FsResult};

/// [`FileSystem`] implementation backed by `std::fs`.
///
/// Listings apply `pattern` with the engine's wildcard matcher, so they are
/// exact: the loose 8.3-era behaviors of the legacy platform enumerator do
/// not occur here. Entries whose names are not valid UTF-8 are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn list(
        &self,
        entity: FileSystemEntity,
        dir: &str,
        pattern: Option<&str>,
    ) -> FsResult<Vec<String>> {
        let read = fs::read_dir(dir)?;
        let filter = pattern.filter(|p| !is_all_files_wildcard(p));

        let mut out = Vec::new();
        for entry in read {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };

            if let Some(pat) = filter {
                if !is_match(&name, pat) {
                    continue;
                }
            }

            // Follow symlinks for the file/directory decision, like the
            // platform enumerator does; broken links count as files.
            let is_dir = entry
                .file_type()
                .map(|t| {
                    if t.is_symlink() {
                        fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false)
                    } else {
                        t.is_dir()
                    }
                })
                .unwrap_or(false);

            let wanted = match entity {
                FileSystemEntity::Files => !is_dir,
                FileSystemEntity::Directories => is_dir,
                FileSystemEntity::FilesAndDirectories => true,
            };
            if wanted {
                out.push(join(dir, &name));
            }
        }
        Ok(out)
    }

    fn dir_exists(&self, dir: &str) -> bool {
        let probe = if dir.is_empty() { "." } else { dir };
        fs::metadata(probe).map(|m| m.is_dir()).unwrap_or(false)
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.ends_with(is_separator) {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}
