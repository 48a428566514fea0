//! Persisted baseline.
//!
//! The baseline is a pretty-printed JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "algorithm": "sha256",
//!   "root": "/srv/www",
//!   "created_at": "2026-10-19T08:00:00Z",
//!   "files": { "index.html": "9f86d0..." }
//! }
//! ```
//!
//! A bare `{ "path": "digest" }` object is also read, as SHA-256.

use crate::error::{FixityError, Result};
use crate::index::hasher::HashAlgorithm;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASELINE_FILE: &str = "reference_hashes.json";

const BASELINE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BaselineDocument {
    version: u32,
    algorithm: String,
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineFormat {
    /// No baseline file yet.
    Missing,
    /// Flat path → digest object.
    Legacy,
    Versioned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub snapshot: Snapshot,
    pub algorithm: Option<HashAlgorithm>,
    pub root: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub format: BaselineFormat,
}

impl Baseline {
    pub fn missing() -> Self {
        Self {
            snapshot: Snapshot::empty(),
            algorithm: None,
            root: None,
            created_at: None,
            format: BaselineFormat::Missing,
        }
    }

    pub fn exists(&self) -> bool {
        self.format != BaselineFormat::Missing
    }
}

/// Reads and writes the baseline at a fixed location.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored baseline.
    ///
    /// A missing file is a first run and yields [`Baseline::missing`]. A file
    /// that exists but does not parse is `CorruptBaseline`, never empty.
    pub fn load(&self) -> Result<Baseline> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Baseline::missing()),
            Err(e) => return Err(FixityError::io(&self.path, e)),
        };

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))?;

        match value {
            Value::Object(map) if map.contains_key("version") => {
                self.parse_versioned(Value::Object(map))
            }
            Value::Object(map) => self.parse_legacy(map),
            _ => Err(self.corrupt("expected a JSON object")),
        }
    }

    /// Replaces the stored baseline with `snapshot`.
    ///
    /// A snapshot whose keys or digests `load` would reject is refused with
    /// `InvalidSnapshot` and nothing is written.
    ///
    /// The document is written to a temporary file next to the target and
    /// then renamed over it, so an interrupted save leaves the previous
    /// baseline intact.
    pub fn save(
        &self,
        snapshot: &Snapshot,
        algorithm: HashAlgorithm,
        root: Option<&Path>,
    ) -> Result<()> {
        if let Some(details) = invalid_entry(snapshot.as_map(), algorithm) {
            return Err(FixityError::InvalidSnapshot(details));
        }

        let document = BaselineDocument {
            version: BASELINE_VERSION,
            algorithm: algorithm.as_str().to_string(),
            root: root.map(|r| r.display().to_string()),
            created_at: Some(Utc::now()),
            files: snapshot.as_map().clone(),
        };

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| FixityError::io(&parent, e))?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent)
            .map_err(|e| FixityError::io(&parent, e))?;
        let temp_path = temp.path().to_path_buf();

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &document)
                .map_err(|e| FixityError::io(&temp_path, e.into()))?;
            writer
                .write_all(b"\n")
                .and_then(|_| writer.flush())
                .map_err(|e| FixityError::io(&temp_path, e))?;
        }

        temp.as_file()
            .sync_all()
            .map_err(|e| FixityError::io(&temp_path, e))?;
        temp.persist(&self.path)
            .map_err(|e| FixityError::io(&self.path, e.error))?;

        Ok(())
    }

    fn parse_versioned(&self, value: Value) -> Result<Baseline> {
        let document: BaselineDocument =
            serde_json::from_value(value).map_err(|e| self.corrupt(e.to_string()))?;

        if document.version != BASELINE_VERSION {
            return Err(self.corrupt(format!(
                "unsupported baseline version {} (expected {})",
                document.version, BASELINE_VERSION
            )));
        }

        let algorithm: HashAlgorithm = document
            .algorithm
            .parse()
            .map_err(|_| self.corrupt(format!("unknown algorithm '{}'", document.algorithm)))?;

        self.check_entries(&document.files, algorithm)?;

        Ok(Baseline {
            snapshot: Snapshot::from_map(document.files),
            algorithm: Some(algorithm),
            root: document.root,
            created_at: document.created_at,
            format: BaselineFormat::Versioned,
        })
    }

    fn parse_legacy(&self, map: serde_json::Map<String, Value>) -> Result<Baseline> {
        let mut files = BTreeMap::new();
        for (path, digest) in map {
            match digest {
                Value::String(digest) => {
                    files.insert(path, digest);
                }
                other => {
                    return Err(self.corrupt(format!(
                        "digest for '{}' is not a string: {}",
                        path, other
                    )))
                }
            }
        }

        let algorithm = HashAlgorithm::Sha256;
        self.check_entries(&files, algorithm)?;

        Ok(Baseline {
            snapshot: Snapshot::from_map(files),
            algorithm: Some(algorithm),
            root: None,
            created_at: None,
            format: BaselineFormat::Legacy,
        })
    }

    fn check_entries(&self, files: &BTreeMap<String, String>, algorithm: HashAlgorithm) -> Result<()> {
        match invalid_entry(files, algorithm) {
            Some(details) => Err(self.corrupt(details)),
            None => Ok(()),
        }
    }

    fn corrupt(&self, details: impl Into<String>) -> FixityError {
        FixityError::CorruptBaseline {
            path: self.path.clone(),
            details: details.into(),
        }
    }
}

/// First problem that would make `files` unloadable, if any.
fn invalid_entry(files: &BTreeMap<String, String>, algorithm: HashAlgorithm) -> Option<String> {
    for (path, digest) in files {
        if path.is_empty() {
            return Some("empty path key".to_string());
        }
        if !algorithm.is_valid_digest(digest) {
            return Some(format!(
                "digest for '{}' is not a {} hex digest",
                path, algorithm
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    const H1: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    const H2: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn snap(entries: &[(&str, &str)]) -> Snapshot {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn store_in(dir: &TempDir) -> BaselineStore {
        BaselineStore::new(dir.path().join(DEFAULT_BASELINE_FILE))
    }

    fn assert_corrupt(store: &BaselineStore) {
        match store.load() {
            Err(FixityError::CorruptBaseline { path, .. }) => assert_eq!(path, store.path()),
            other => panic!("expected CorruptBaseline, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_baseline_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let baseline = store_in(&temp_dir).load().unwrap();

        assert!(!baseline.exists());
        assert!(baseline.snapshot.is_empty());
        assert_eq!(baseline.algorithm, None);
    }

    #[test]
    fn test_round_trip_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.save(&Snapshot::empty(), HashAlgorithm::Sha256, None).unwrap();
        let baseline = store.load().unwrap();

        assert!(baseline.exists());
        assert_eq!(baseline.format, BaselineFormat::Versioned);
        assert_eq!(baseline.snapshot, Snapshot::empty());
    }

    #[test]
    fn test_round_trip_with_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let snapshot = snap(&[("a.txt", H1), ("dir/b.txt", H2)]);

        store
            .save(&snapshot, HashAlgorithm::Sha256, Some(Path::new("/srv/www")))
            .unwrap();
        let baseline = store.load().unwrap();

        assert_eq!(baseline.snapshot, snapshot);
        assert_eq!(baseline.algorithm, Some(HashAlgorithm::Sha256));
        assert_eq!(baseline.root.as_deref(), Some("/srv/www"));
        assert!(baseline.created_at.is_some());
    }

    #[test]
    fn test_save_replaces_previous_baseline() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.save(&snap(&[("old", H1)]), HashAlgorithm::Sha256, None).unwrap();
        store.save(&snap(&[("new", H2)]), HashAlgorithm::Sha256, None).unwrap();

        assert_eq!(store.load().unwrap().snapshot, snap(&[("new", H2)]));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.save(&snap(&[("a", H1)]), HashAlgorithm::Sha256, None).unwrap();
        store.save(&snap(&[("b", H1)]), HashAlgorithm::Sha256, None).unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec![DEFAULT_BASELINE_FILE.to_string()]);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let store = BaselineStore::new(temp_dir.path().join("state/nested/baseline.json"));

        store.save(&snap(&[("a", H1)]), HashAlgorithm::Sha256, None).unwrap();
        assert_eq!(store.load().unwrap().snapshot.len(), 1);
    }

    #[test]
    fn test_save_failure_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not_a_dir");
        fs::write(&blocker, b"file").unwrap();
        let store = BaselineStore::new(blocker.join("baseline.json"));

        let err = store.save(&Snapshot::empty(), HashAlgorithm::Sha256, None).unwrap_err();
        assert!(matches!(err, FixityError::Io { .. }));
    }

    #[test]
    fn test_failed_rename_cleans_up_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.save(&snap(&[("kept", H1)]), HashAlgorithm::Sha256, None).unwrap();

        // a non-empty directory where the baseline should go makes the rename fail
        let blocked = BaselineStore::new(temp_dir.path().join("blocked"));
        fs::create_dir(temp_dir.path().join("blocked")).unwrap();
        fs::write(temp_dir.path().join("blocked/inner"), b"x").unwrap();

        let err = blocked.save(&Snapshot::empty(), HashAlgorithm::Sha256, None).unwrap_err();
        assert!(matches!(err, FixityError::Io { .. }));

        let mut names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["blocked".to_string(), DEFAULT_BASELINE_FILE.to_string()]);
        assert_eq!(store.load().unwrap().snapshot, snap(&[("kept", H1)]));
    }

    #[test]
    fn test_legacy_flat_map_loads_as_sha256() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(
            store.path(),
            format!("{{\n    \"docs/readme.md\": \"{H1}\",\n    \"main.py\": \"{H2}\"\n}}"),
        )
        .unwrap();

        let baseline = store.load().unwrap();
        assert_eq!(baseline.format, BaselineFormat::Legacy);
        assert_eq!(baseline.algorithm, Some(HashAlgorithm::Sha256));
        assert_eq!(baseline.snapshot, snap(&[("docs/readme.md", H1), ("main.py", H2)]));
    }

    #[test]
    fn test_invalid_json_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(store.path(), b"{ \"a\": ").unwrap();
        assert_corrupt(&store);
    }

    #[test]
    fn test_empty_file_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(store.path(), b"").unwrap();
        assert_corrupt(&store);
    }

    #[test]
    fn test_non_object_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(store.path(), b"[\"a\", \"b\"]").unwrap();
        assert_corrupt(&store);
    }

    #[test]
    fn test_non_string_digest_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(store.path(), b"{\"a.txt\": 42}").unwrap();
        assert_corrupt(&store);
    }

    #[test]
    fn test_malformed_digest_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(store.path(), b"{\"a.txt\": \"not-a-digest\"}").unwrap();
        assert_corrupt(&store);
    }

    #[test]
    fn test_unknown_version_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(
            store.path(),
            b"{\"version\": 99, \"algorithm\": \"sha256\", \"files\": {}}",
        )
        .unwrap();
        assert_corrupt(&store);
    }

    #[test]
    fn test_unknown_algorithm_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(
            store.path(),
            b"{\"version\": 1, \"algorithm\": \"crc32\", \"files\": {}}",
        )
        .unwrap();
        assert_corrupt(&store);
    }

    #[test]
    fn test_save_rejects_snapshot_load_would_refuse() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.save(&snap(&[("kept", H1)]), HashAlgorithm::Sha256, None).unwrap();
        let before = fs::read(store.path()).unwrap();

        let err = store
            .save(&snap(&[("a", "h1"), ("b", "h2")]), HashAlgorithm::Sha256, None)
            .unwrap_err();
        assert!(matches!(err, FixityError::InvalidSnapshot(ref d) if d.contains("'a'")));

        let err = store.save(&snap(&[("a", H1)]), HashAlgorithm::Md5, None).unwrap_err();
        assert!(matches!(err, FixityError::InvalidSnapshot(_)));

        let err = store.save(&snap(&[("", H1)]), HashAlgorithm::Sha256, None).unwrap_err();
        assert!(matches!(err, FixityError::InvalidSnapshot(_)));

        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
        assert_eq!(store.load().unwrap().snapshot, snap(&[("kept", H1)]));
    }

    #[test]
    fn test_digest_length_checked_against_algorithm() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(
            store.path(),
            format!("{{\"version\": 1, \"algorithm\": \"md5\", \"files\": {{\"a\": \"{H1}\"}}}}"),
        )
        .unwrap();
        assert_corrupt(&store);
    }

    fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
        prop::collection::btree_map("[a-zA-Z0-9 ._/\u{e9}\u{4e2d}-]{1,24}", "[0-9a-f]{64}", 0..16)
            .prop_map(|map| map.into_iter().collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn load_after_save_returns_same_snapshot(snapshot in arb_snapshot()) {
            let temp_dir = TempDir::new().unwrap();
            let store = store_in(&temp_dir);

            store.save(&snapshot, HashAlgorithm::Blake3, None).unwrap();
            let baseline = store.load().unwrap();

            prop_assert_eq!(baseline.snapshot, snapshot);
            prop_assert_eq!(baseline.algorithm, Some(HashAlgorithm::Blake3));
        }
    }
}
