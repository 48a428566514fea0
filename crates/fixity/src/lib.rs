pub mod baseline;
pub mod check;
pub mod config;
pub mod diff;
pub mod error;
pub mod index;
pub mod report;
pub mod snapshot;
pub mod util;

pub use baseline::{Baseline, BaselineFormat, BaselineStore, DEFAULT_BASELINE_FILE};
pub use check::{CheckOptions, CheckReport, Checker, CorruptPolicy};
pub use config::{Config, Overrides};
pub use diff::{diff, DiffResult};
pub use error::{FixityError, Result};
pub use index::{
    hash_file, hash_file_with_progress, scan_directory, scan_directory_with_progress,
    HashAlgorithm, ScanFailure, ScanOptions, ScanOutcome, ScanStats,
};
pub use report::{AuditLog, LogReporter, NullReporter, Reporter, Tee, DEFAULT_AUDIT_LOG};
pub use snapshot::{path_key, Snapshot, SnapshotBuilder};
