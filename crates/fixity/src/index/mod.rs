pub mod hasher;
pub mod scanner;

pub use hasher::{hash_file, hash_file_with_progress, hash_reader, HashAlgorithm, ProgressCallback};
pub use scanner::{
    scan_directory, scan_directory_with_progress, validate_root, ScanFailure, ScanOptions,
    ScanOutcome, ScanStats,
};
