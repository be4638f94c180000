//! Manifest discovery
//!
//! Expands workspace-relative scan fragments into the set of `package.json`
//! files below them, i.e. `<root>/<fragment>/**/package.json`, never looking
//! inside `node_modules`.

use crate::core::error::PublishError;
use crate::manifest::MANIFEST_FILENAME;
use glob::glob;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Dependency cache directory excluded from every scan
const EXCLUDED_DIR: &str = "node_modules";

/// Finds package manifests below the configured scan directories
#[derive(Debug, Clone)]
pub struct ManifestScanner {
    workspace: PathBuf,
    fragments: Vec<String>,
}

impl ManifestScanner {
    /// Create a scanner rooted at `workspace`.
    ///
    /// A blank fragment stands for the workspace root itself.
    pub fn new<P: Into<PathBuf>>(workspace: P, fragments: Vec<String>) -> Self {
        Self {
            workspace: workspace.into(),
            fragments,
        }
    }

    /// Glob pattern describing what each fragment scans, for logging
    pub fn patterns(&self) -> Vec<String> {
        self.fragments
            .iter()
            .map(|fragment| {
                self.fragment_root(fragment)
                    .join("**")
                    .join(MANIFEST_FILENAME)
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }

    /// Discover all manifests.
    ///
    /// # Errors
    ///
    /// - `PublishError::InvalidScanPattern` - a fragment is not a valid glob
    /// - `PublishError::NoManifestsFound` - nothing matched
    pub fn scan(&self) -> Result<BTreeSet<PathBuf>, PublishError> {
        let mut manifests = BTreeSet::new();

        for fragment in &self.fragments {
            let pattern = self.glob_pattern(fragment);

            let entries = glob(&pattern).map_err(|e| PublishError::InvalidScanPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;

            for entry in entries {
                let dir = match entry {
                    Ok(dir) if dir.is_dir() => dir,
                    Ok(_) => continue,
                    Err(e) => {
                        debug!(error = %e, "skipping unreadable scan entry");
                        continue;
                    }
                };

                if self.is_excluded(&dir) {
                    continue;
                }

                Self::collect_manifests(&dir, &mut manifests);
            }
        }

        if manifests.is_empty() {
            return Err(PublishError::NoManifestsFound {
                patterns: self.patterns().join(", "),
            });
        }

        info!(count = manifests.len(), "discovered manifests");
        Ok(manifests)
    }

    fn fragment_root(&self, fragment: &str) -> PathBuf {
        let fragment = fragment.trim().trim_start_matches("./");
        if fragment.is_empty() || fragment == "." {
            self.workspace.clone()
        } else {
            self.workspace.join(fragment)
        }
    }

    /// Like `fragment_root`, with the workspace part escaped so only the
    /// fragment is interpreted as a glob
    fn glob_pattern(&self, fragment: &str) -> String {
        let workspace = glob::Pattern::escape(&self.workspace.to_string_lossy());
        let fragment = fragment.trim().trim_start_matches("./");
        if fragment.is_empty() || fragment == "." {
            workspace
        } else {
            format!("{}/{}", workspace.trim_end_matches('/'), fragment)
        }
    }

    /// A `node_modules` component below the workspace root
    fn is_excluded(&self, path: &Path) -> bool {
        path.strip_prefix(&self.workspace)
            .unwrap_or(path)
            .components()
            .any(|c| c.as_os_str() == EXCLUDED_DIR)
    }

    fn collect_manifests(dir: &Path, manifests: &mut BTreeSet<PathBuf>) {
        let walker = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_dependency_cache(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILENAME {
                let path = entry
                    .path()
                    .canonicalize()
                    .unwrap_or_else(|_| entry.path().to_path_buf());
                debug!(path = %path.display(), "found manifest");
                manifests.insert(path);
            }
        }
    }
}

fn is_dependency_cache(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == EXCLUDED_DIR
}
