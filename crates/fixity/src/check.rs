//! One integrity run: load the baseline, scan, diff, save.

use crate::baseline::{Baseline, BaselineFormat, BaselineStore};
use crate::diff::{diff, DiffResult};
use crate::error::{FixityError, Result};
use crate::index::hasher::HashAlgorithm;
use crate::index::scanner::{
    scan_directory_with_progress, validate_root, ScanFailure, ScanOptions, ScanStats,
};
use crate::report::Reporter;
use crate::snapshot::{path_key, Snapshot};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What to do when the stored baseline exists but cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptPolicy {
    #[default]
    Abort,
    TreatAsEmpty,
}

#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub scan: ScanOptions,
    pub corrupt_policy: CorruptPolicy,
    /// Files the tool itself writes (audit log etc.), left out of the scan
    /// when they sit inside the tree. The baseline file is always left out.
    pub state_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub root: String,
    pub baseline_path: String,
    pub algorithm: HashAlgorithm,
    pub baseline_existed: bool,
    pub baseline_discarded: bool,
    pub diff: DiffResult,
    /// Paths whose digest matched the baseline.
    pub unchanged: usize,
    pub failures: Vec<ScanFailure>,
    pub stats: ScanStats,
    /// Entries in the new baseline.
    pub file_count: usize,
    pub duration_ms: u128,
}

impl CheckReport {
    pub fn has_changes(&self) -> bool {
        !self.diff.is_clean()
    }

    /// Files left out of the new baseline because they could not be read.
    pub fn unreadable_count(&self) -> usize {
        self.failures.len()
    }
}

pub struct Checker {
    store: BaselineStore,
    options: CheckOptions,
}

impl Checker {
    pub fn new(store: BaselineStore, options: CheckOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Runs the full cycle against `root`.
    ///
    /// Errors abort the run: a missing root, an unreadable or corrupt
    /// baseline (unless [`CorruptPolicy::TreatAsEmpty`]), an algorithm
    /// mismatch, or a failed save. Files that cannot be read do not; they
    /// end up in [`CheckReport::failures`].
    pub fn run(&self, root: &Path, reporter: &mut dyn Reporter) -> Result<CheckReport> {
        let start = Instant::now();
        let algorithm = self.options.scan.algorithm;

        validate_root(root)?;
        reporter.scan_started(root);

        let (mut baseline, discarded) = self.load_baseline(reporter)?;
        if baseline.format == BaselineFormat::Legacy {
            baseline.snapshot = rebase_legacy_keys(&baseline.snapshot, root);
        }

        if let Some(stored) = baseline.algorithm {
            if stored != algorithm && !baseline.snapshot.is_empty() {
                return Err(FixityError::AlgorithmMismatch {
                    baseline: stored.to_string(),
                    requested: algorithm.to_string(),
                });
            }
        }

        let mut scan_options = self.options.scan.clone();
        let own_files = std::iter::once(self.store.path())
            .chain(self.options.state_files.iter().map(PathBuf::as_path));
        for state_file in own_files {
            if let Some(key) = key_within(root, state_file) {
                scan_options.exclude_keys.insert(key);
            }
        }

        let outcome = scan_directory_with_progress(root, &scan_options, |path| {
            reporter.file_started(path)
        })?;

        for failure in &outcome.failures {
            reporter.file_failed(failure);
        }

        let diff = diff(&baseline.snapshot, &outcome.snapshot);
        let unchanged = diff.unchanged(&baseline.snapshot, &outcome.snapshot).len();

        self.store.save(&outcome.snapshot, algorithm, Some(root))?;

        let report = CheckReport {
            root: root.display().to_string(),
            baseline_path: self.store.path().display().to_string(),
            algorithm,
            baseline_existed: baseline.exists(),
            baseline_discarded: discarded,
            diff,
            unchanged,
            failures: outcome.failures,
            stats: outcome.stats,
            file_count: outcome.snapshot.len(),
            duration_ms: start.elapsed().as_millis(),
        };

        reporter.check_completed(&report);
        Ok(report)
    }

    fn load_baseline(&self, reporter: &mut dyn Reporter) -> Result<(Baseline, bool)> {
        match self.store.load() {
            Ok(baseline) => Ok((baseline, false)),
            Err(err @ FixityError::CorruptBaseline { .. })
                if self.options.corrupt_policy == CorruptPolicy::TreatAsEmpty =>
            {
                reporter.baseline_discarded(&err);
                Ok((Baseline::missing(), true))
            }
            Err(err) => Err(err),
        }
    }
}

/// Legacy baselines keyed files by `root` joined with the relative path.
/// Strips that prefix so the keys line up with a fresh scan.
fn rebase_legacy_keys(snapshot: &Snapshot, root: &Path) -> Snapshot {
    let prefix = format!("{}/", root.display().to_string().trim_end_matches('/'));
    snapshot
        .iter()
        .map(|(key, digest)| {
            let key = key.strip_prefix(&prefix).unwrap_or(key);
            (key.to_string(), digest.to_string())
        })
        .collect()
}

/// Path-key `file` would get in a scan of `root`, if it lives inside it.
fn key_within(root: &Path, file: &Path) -> Option<String> {
    let root = fs::canonicalize(root).ok()?;
    let name = file.file_name()?;
    let parent = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file = fs::canonicalize(parent).ok()?.join(name);
    path_key(&root, &file)
}
