//! Project file discovery.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::{FileKind, ScanError};

pub const DEFAULT_INCLUDE: &[&str] = &[
    "**/*.html",
    "**/*.htm",
    "**/*.css",
    "**/*.scss",
    "**/*.sass",
    "**/*.less",
    "**/*.ts",
    "**/*.js",
];

pub const DEFAULT_EXCLUDE: &[&str] = &[
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
    "**/coverage/**",
    "**/.git/**",
    "**/*.d.ts",
    "**/*.spec.ts",
];

/// Directories never descended into, whatever the globs say.
const SKIP_DIRS: &[&str] = &["node_modules", ".git"];

/// Compiled include/exclude filter. Patterns match paths relative to the
/// scan root, with `/` separators on every platform. `*` stays within one
/// path segment; `**` spans directories.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl FileFilter {
    /// An empty include list means every supported file. User excludes are
    /// added to the defaults, never replace them.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, ScanError> {
        let include = if include.is_empty() {
            build_set(DEFAULT_INCLUDE.iter().copied())?
        } else {
            build_set(include.iter().map(AsRef::as_ref))?
        };
        let exclude = build_set(
            DEFAULT_EXCLUDE
                .iter()
                .copied()
                .chain(exclude.iter().map(AsRef::as_ref)),
        )?;

        Ok(Self { include, exclude })
    }

    pub fn matches(&self, relative: &str) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        let empty: &[&str] = &[];
        // Built-in patterns are known to compile.
        Self::new(empty, empty).unwrap_or_else(|_| Self {
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
        })
    }
}

fn build_set<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| ScanError::InvalidGlob {
                pattern: pattern.to_string(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ScanError::InvalidGlob {
        pattern: "<set>".to_string(),
        source,
    })
}

/// Path of `path` relative to `root`, `/`-separated.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Every supported file under `root` that passes `filter`, deduplicated and
/// sorted. A root that is itself a file is returned alone when its kind is
/// supported.
pub fn discover_files(root: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>, ScanError> {
    if !root.exists() {
        return Err(ScanError::InvalidRoot {
            path: root.to_path_buf(),
        });
    }

    if root.is_file() {
        return Ok(FileKind::from_path(root)
            .map(|_| vec![root.to_path_buf()])
            .unwrap_or_default());
    }

    fs::read_dir(root).map_err(|source| ScanError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = BTreeSet::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_skipped(e)) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_file() || FileKind::from_path(entry.path()).is_none() {
            continue;
        }

        let relative = relative_path(root, entry.path());
        if filter.matches(&relative) {
            files.insert(entry.into_path());
        } else {
            debug!(path = %relative, "filtered out");
        }
    }

    Ok(files.into_iter().collect())
}

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| SKIP_DIRS.contains(&name))
}
