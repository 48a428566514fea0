//! Run events for whoever presents or records them.
//!
//! The checker never logs on its own; it calls a [`Reporter`] handed in by
//! the caller.

use crate::check::CheckReport;
use crate::error::{FixityError, Result};
use crate::index::scanner::ScanFailure;
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_AUDIT_LOG: &str = "logs/integrity_log.txt";

pub trait Reporter {
    fn scan_started(&mut self, _root: &Path) {}

    fn file_started(&mut self, _path: &Path) {}

    fn file_failed(&mut self, _failure: &ScanFailure) {}

    /// A corrupt baseline was replaced by an empty one.
    fn baseline_discarded(&mut self, _error: &FixityError) {}

    fn check_completed(&mut self, _report: &CheckReport) {}
}

/// Ignores every event.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Forwards events to the `log` facade.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn scan_started(&mut self, root: &Path) {
        log::info!("Scanning started for directory: {}", root.display());
    }

    fn file_started(&mut self, path: &Path) {
        log::debug!("Hashing {}", path.display());
    }

    fn file_failed(&mut self, failure: &ScanFailure) {
        log::info!("Error hashing file {}: {}", failure.path, failure.reason);
    }

    fn baseline_discarded(&mut self, error: &FixityError) {
        log::warn!("Discarding unreadable baseline: {}", error);
    }

    fn check_completed(&mut self, report: &CheckReport) {
        log::info!(
            "Scan of {} finished: {} modified, {} missing, {} new, {} unreadable",
            report.root,
            report.diff.modified.len(),
            report.diff.missing.len(),
            report.diff.added.len(),
            report.failures.len()
        );
    }
}

/// Appends a timestamped audit trail of every run to a file.
pub struct AuditLog {
    path: PathBuf,
    file: File,
}

impl AuditLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| FixityError::io(parent, e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| FixityError::io(&path, e))?;

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, level: &str, message: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        if let Err(e) = writeln!(self.file, "{} - {} - {}", timestamp, level, message) {
            log::warn!("Failed to write audit log {}: {}", self.path.display(), e);
        }
    }
}

impl Reporter for AuditLog {
    fn scan_started(&mut self, root: &Path) {
        self.write_line("INFO", &format!("Scanning started for directory: {}", root.display()));
    }

    fn file_failed(&mut self, failure: &ScanFailure) {
        self.write_line(
            "ERROR",
            &format!("Error hashing file {}: {}", failure.path, failure.reason),
        );
    }

    fn baseline_discarded(&mut self, error: &FixityError) {
        self.write_line("WARNING", &format!("Discarded corrupt baseline: {}", error));
    }

    fn check_completed(&mut self, report: &CheckReport) {
        self.write_line(
            "INFO",
            &format!("Scan completed at {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        );
        self.write_line("INFO", &format!("Modified files: {:?}", report.diff.modified));
        self.write_line("INFO", &format!("Missing files: {:?}", report.diff.missing));
        self.write_line("INFO", &format!("New files: {:?}", report.diff.added));
        if !report.failures.is_empty() {
            self.write_line(
                "WARNING",
                &format!("Unreadable files: {}", report.failures.len()),
            );
        }
    }
}

/// Sends every event to two reporters, `A` first.
pub struct Tee<A, B>(pub A, pub B);

impl<A: Reporter, B: Reporter> Reporter for Tee<A, B> {
    fn scan_started(&mut self, root: &Path) {
        self.0.scan_started(root);
        self.1.scan_started(root);
    }

    fn file_started(&mut self, path: &Path) {
        self.0.file_started(path);
        self.1.file_started(path);
    }

    fn file_failed(&mut self, failure: &ScanFailure) {
        self.0.file_failed(failure);
        self.1.file_failed(failure);
    }

    fn baseline_discarded(&mut self, error: &FixityError) {
        self.0.baseline_discarded(error);
        self.1.baseline_discarded(error);
    }

    fn check_completed(&mut self, report: &CheckReport) {
        self.0.check_completed(report);
        self.1.check_completed(report);
    }
}
