use crate::error::{FixityError, Result};
use crate::index::hasher::{hash_file, HashAlgorithm};
use crate::snapshot::{path_key, Snapshot, SnapshotBuilder};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files_hashed: usize,
    pub dirs_scanned: usize,
    pub bytes_hashed: u64,
    pub symlinks_skipped: usize,
    pub special_skipped: usize,
    pub excluded: usize,
    pub errors: usize,
}

/// An entry that could not be digested and is absent from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub path: String,
    pub reason: String,
}

/// Options for filesystem scanning
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub algorithm: HashAlgorithm,
    /// Never follow by default. When enabled, every link is followed and a
    /// cycle shows up as a per-entry failure.
    pub follow_symlinks: bool,
    pub max_depth: Option<usize>,
    pub include_hidden: bool,
    /// Glob patterns matched against path-keys.
    pub exclude: Vec<String>,
    /// Exact path-keys to leave out.
    pub exclude_keys: BTreeSet<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            follow_symlinks: false,
            max_depth: None,
            include_hidden: true,
            exclude: Vec::new(),
            exclude_keys: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub snapshot: Snapshot,
    pub failures: Vec<ScanFailure>,
    pub stats: ScanStats,
}

/// Fails unless `root` exists and is a directory.
pub fn validate_root(root: &Path) -> Result<()> {
    let metadata = fs::metadata(root).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FixityError::NotFound(root.to_path_buf()),
        _ => FixityError::io(root, e),
    })?;

    if !metadata.is_dir() {
        return Err(FixityError::NotADirectory(root.to_path_buf()));
    }

    Ok(())
}

/// Scans a directory tree and digests every regular file in it
pub fn scan_directory<P: AsRef<Path>>(root: P, options: &ScanOptions) -> Result<ScanOutcome> {
    scan_directory_with_progress(root, options, |_| {})
}

/// Like [`scan_directory`], calling `progress` before each file is hashed.
///
/// A file that cannot be read, or a directory that cannot be listed, is
/// recorded in [`ScanOutcome::failures`] and the walk carries on. Only an
/// invalid root or an invalid exclude pattern fails the whole scan.
pub fn scan_directory_with_progress<P, F>(
    root: P,
    options: &ScanOptions,
    mut progress: F,
) -> Result<ScanOutcome>
where
    P: AsRef<Path>,
    F: FnMut(&Path),
{
    let root = root.as_ref();
    validate_root(root)?;

    let excludes = build_globset(&options.exclude)?;
    let mut builder = SnapshotBuilder::new();
    let mut failures = Vec::new();
    let mut stats = ScanStats::default();

    let mut walker = WalkDir::new(root).follow_links(options.follow_symlinks);
    if let Some(max_depth) = options.max_depth {
        walker = walker.max_depth(max_depth);
    }

    let mut entries = walker.into_iter();
    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                failures.push(walk_failure(root, &err));
                stats.errors += 1;
                continue;
            }
        };

        let is_dir = entry.file_type().is_dir();

        if entry.depth() == 0 {
            if is_dir {
                stats.dirs_scanned += 1;
            }
            continue;
        }

        let Some(key) = path_key(root, entry.path()) else {
            failures.push(ScanFailure {
                path: entry.path().display().to_string(),
                reason: "path is not valid UTF-8".to_string(),
            });
            stats.errors += 1;
            if is_dir {
                entries.skip_current_dir();
            }
            continue;
        };

        if is_excluded(&entry, &key, options, &excludes) {
            stats.excluded += 1;
            if is_dir {
                entries.skip_current_dir();
            }
            continue;
        }

        let file_type = entry.file_type();
        if is_dir {
            stats.dirs_scanned += 1;
            continue;
        }
        if file_type.is_symlink() {
            stats.symlinks_skipped += 1;
            continue;
        }
        if !file_type.is_file() {
            stats.special_skipped += 1;
            continue;
        }

        progress(entry.path());

        match hash_file(entry.path(), options.algorithm) {
            Ok(digest) => {
                stats.files_hashed += 1;
                stats.bytes_hashed += entry.metadata().map(|m| m.len()).unwrap_or(0);
                builder.insert(key, digest);
            }
            Err(err) => {
                failures.push(ScanFailure {
                    path: entry.path().display().to_string(),
                    reason: failure_reason(&err),
                });
                stats.errors += 1;
            }
        }
    }

    Ok(ScanOutcome {
        snapshot: builder.build(),
        failures,
        stats,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| FixityError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| FixityError::Config(format!("Failed to compile exclude patterns: {}", e)))
}

fn is_excluded(entry: &DirEntry, key: &str, options: &ScanOptions, excludes: &GlobSet) -> bool {
    if !options.include_hidden && is_hidden(entry.file_name()) {
        return true;
    }
    options.exclude_keys.contains(key) || excludes.is_match(key)
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

fn failure_reason(err: &FixityError) -> String {
    match err {
        FixityError::Io { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

fn walk_failure(root: &Path, err: &walkdir::Error) -> ScanFailure {
    let path = err
        .path()
        .unwrap_or(root)
        .display()
        .to_string();

    let reason = if let Some(ancestor) = err.loop_ancestor() {
        format!("symlink loop back to {}", ancestor.display())
    } else if let Some(io) = err.io_error() {
        io.to_string()
    } else {
        err.to_string()
    };

    ScanFailure { path, reason }
}
