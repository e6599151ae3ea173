use std::fs;
use std::path::{Path, PathBuf};

pub trait OwnershipSetter {
    /// Hands `root` and everything below it to `uid`, leaving the group as is.
    fn chown_recursive(&self, root: &Path, uid: u32) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnixOwnership;

impl OwnershipSetter for UnixOwnership {
    fn chown_recursive(&self, root: &Path, uid: u32) -> Result<(), String> {
        for path in collect_tree(root)? {
            std::os::unix::fs::lchown(&path, Some(uid), None).map_err(|error| {
                format!("failed to change owner of '{}': {error}", path.display())
            })?;
        }
        Ok(())
    }
}

/// Lists `root` followed by every descendant. Symlinks are listed but not
/// followed.
pub fn collect_tree(root: &Path) -> Result<Vec<PathBuf>, String> {
    let mut paths = vec![root.to_path_buf()];
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir)
            .map_err(|error| format!("failed to read directory '{}': {error}", dir.display()))?;
        for entry in entries {
            let entry = entry.map_err(|error| {
                format!("failed to read entry in '{}': {error}", dir.display())
            })?;
            let file_type = entry.file_type().map_err(|error| {
                format!("failed to inspect '{}': {error}", entry.path().display())
            })?;
            let path = entry.path();
            if file_type.is_dir() {
                pending.push(path.clone());
            }
            paths.push(path);
        }
    }

    Ok(paths)
}
