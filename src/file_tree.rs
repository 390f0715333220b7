use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{BuckifyError, Result};

/// Extensions of files compiled into targets.
pub const SOURCE_EXTENSIONS: &[&str] = &["cc", "c"];

/// Directory name skipped by default (Java bindings).
pub const DEFAULT_EXCLUDED_DIR: &str = "java";

/// Collects every C/C++ source file under a repository root
pub struct FileTreeScanner {
    root: PathBuf,
    excluded_dir: String,
}

impl FileTreeScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            excluded_dir: DEFAULT_EXCLUDED_DIR.to_string(),
        }
    }

    pub fn excluded_dir(mut self, name: impl Into<String>) -> Self {
        self.excluded_dir = name.into();
        self
    }

    /// Source paths relative to the root, `/`-separated.
    pub fn scan(&self) -> Result<BTreeSet<String>> {
        if !self.root.is_dir() {
            return Err(BuckifyError::MissingRoot(self.root.clone()));
        }

        let mut files = BTreeSet::new();
        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry under {}: {}", self.root.display(), err);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }

            if let Some(relative) = self.relative_path(entry.path()) {
                files.insert(relative);
            }
        }

        debug!("found {} source files under {}", files.len(), self.root.display());
        Ok(files)
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if self.excluded_dir.is_empty() || !entry.file_type().is_dir() {
            return false;
        }

        entry
            .path()
            .strip_prefix(&self.root)
            .map(|relative| {
                relative
                    .components()
                    .any(|c| c.as_os_str() == self.excluded_dir.as_str())
            })
            .unwrap_or(false)
    }

    fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}
