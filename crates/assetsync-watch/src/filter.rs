//! Exclusion predicates for the watched tree.

use std::path::Path;

/// Decides whether a path below the root is left out of sync entirely.
pub trait PathExclusion: Send + Sync {
    /// Whether `path` (absolute, below `root`) is excluded.
    fn is_excluded(&self, root: &Path, path: &Path) -> bool;

    /// Get the name of this exclusion.
    fn name(&self) -> &'static str;
}

/// Excludes one directory directly below the root, and everything in it.
///
/// Used for the directory generated copies are written to, so they are never
/// ingested as originals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedRootDir {
    dir_name: String,
}

impl ReservedRootDir {
    /// Exclude `<root>/<dir_name>`.
    pub fn new(dir_name: impl Into<String>) -> Self {
        Self {
            dir_name: dir_name.into(),
        }
    }

    /// The excluded directory name.
    pub fn dir_name(&self) -> &str {
        &self.dir_name
    }
}

impl Default for ReservedRootDir {
    fn default() -> Self {
        Self::new("watermarked")
    }
}

impl PathExclusion for ReservedRootDir {
    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        path.strip_prefix(root)
            .ok()
            .and_then(|rel| rel.components().next())
            .is_some_and(|first| first.as_os_str() == self.dir_name.as_str())
    }

    fn name(&self) -> &'static str {
        "reserved-root-dir"
    }
}

/// Excludes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExclusion;

impl PathExclusion for NoExclusion {
    fn is_excluded(&self, _root: &Path, _path: &Path) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
