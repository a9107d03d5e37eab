//! Capture log discovery.
//!
//! Capture tools name their per-frame logs after the target executable plus a
//! timestamp (`FrameView_helldivers2.exe_2024_03_01T201500_Log.csv`) or write
//! to one fixed file. Both are expressed as a directory and a file-name
//! glob pattern (`*`, `?`, `[...]`); the newest matching file wins.

use glob::MatchOptions;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, trace};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Placeholder in log patterns replaced by the target executable name.
pub const EXE_PLACEHOLDER: &str = "{exe}";

/// Finds the most recently modified capture log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLocator {
    dir: PathBuf,
    pattern: String,
}

impl LogLocator {
    /// Create a locator for `pattern` inside `dir`, substituting `{exe}`.
    pub fn new(dir: impl Into<PathBuf>, pattern: &str, exe_name: &str) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.replace(EXE_PLACEHOLDER, &glob::Pattern::escape(exe_name)),
        }
    }

    /// Locator for a single fixed log path.
    pub fn fixed(path: &Path) -> Self {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let pattern = path
            .file_name()
            .map(|n| glob::Pattern::escape(&n.to_string_lossy()))
            .unwrap_or_default();
        Self { dir, pattern }
    }

    /// Directory searched.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Effective file-name pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Newest matching file, or `None` when nothing matches or the pattern
    /// is invalid.
    ///
    /// Matching is case-insensitive; the directory itself is taken literally.
    pub fn latest(&self) -> Option<PathBuf> {
        let full = self.glob_pattern();
        let paths = match glob::glob_with(&full, MATCH_OPTIONS) {
            Ok(paths) => paths,
            Err(e) => {
                debug!(pattern = %full, error = %e, "Invalid capture log pattern");
                return None;
            }
        };

        let mut best: Option<(SystemTime, PathBuf)> = None;
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    trace!(error = %e, "Skipping unreadable capture log candidate");
                    continue;
                }
            };
            let Ok(meta) = fs::metadata(&path) else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            trace!(path = ?path, ?modified, "Capture log candidate");
            if best.as_ref().is_none_or(|(t, _)| modified > *t) {
                best = Some((modified, path));
            }
        }

        best.map(|(_, path)| path)
    }

    fn glob_pattern(&self) -> String {
        let dir = glob::Pattern::escape(&self.dir.to_string_lossy());
        Path::new(&dir).join(&self.pattern).to_string_lossy().into_owned()
    }
}
