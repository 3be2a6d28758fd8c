//! Source tree walking.
//!
//! Enumerates candidate source files under a root, never descending into
//! skipped directories, in a stable order.

use crate::config::BoundaryRulesConfig;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// A path that could not be visited or read
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IoFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Files found by a walk, plus entries that could not be visited
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Sorted source file paths
    pub files: Vec<PathBuf>,
    pub errors: Vec<IoFailure>,
}

/// Walker over a source tree
#[derive(Debug, Clone)]
pub struct SourceWalker {
    extensions: HashSet<String>,
    skip_dirs: HashSet<String>,
    max_depth: usize,
    follow_links: bool,
}

impl SourceWalker {
    pub fn new(config: &BoundaryRulesConfig) -> Self {
        Self {
            extensions: config.extensions.iter().cloned().collect(),
            skip_dirs: config.skip_dirs.iter().cloned().collect(),
            max_depth: config.max_depth,
            follow_links: config.follow_links,
        }
    }

    /// Walk `root` and collect every file with a recognized extension.
    ///
    /// Symlink cycles can only be entered with `follow_links`; walkdir then
    /// reports them as loop errors, which land in `errors`. A directory at
    /// `max_depth` is not entered and is reported in `errors` as well.
    pub fn walk(&self, root: &Path) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();

        let walker = WalkDir::new(root)
            .follow_links(self.follow_links)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_skipped_dir(e));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_dir() && entry.depth() == self.max_depth {
                        warn!(
                            dir = %entry.path().display(),
                            max_depth = self.max_depth,
                            "Directory at depth limit not scanned"
                        );
                        outcome.errors.push(IoFailure {
                            path: entry.into_path(),
                            message: format!(
                                "directory not scanned: depth limit of {} reached",
                                self.max_depth
                            ),
                        });
                    } else if entry.file_type().is_file()
                        && self.has_source_extension(entry.path())
                    {
                        outcome.files.push(entry.into_path());
                    }
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    warn!(path = %path.display(), error = %err, "Cannot visit path");
                    outcome.errors.push(IoFailure {
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }

        outcome.files.sort();
        outcome
    }

    fn is_skipped_dir(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let skipped = entry
            .file_name()
            .to_str()
            .is_some_and(|name| self.skip_dirs.contains(name));
        if skipped {
            debug!(dir = %entry.path().display(), "Skipping directory");
        }
        skipped
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.extensions.contains(ext))
    }
}

/// Path of `path` relative to `root`, or `path` itself when outside it
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
