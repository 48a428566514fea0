#![allow(dead_code)]

use fixity_lib::{BaselineStore, CheckOptions, Checker};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A tree to scan plus a separate directory holding the baseline.
pub struct TestFixture {
    pub tree: TempDir,
    pub state: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            tree: TempDir::new().unwrap(),
            state: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.tree.path()
    }

    pub fn baseline_path(&self) -> PathBuf {
        self.state.path().join("reference_hashes.json")
    }

    pub fn store(&self) -> BaselineStore {
        BaselineStore::new(self.baseline_path())
    }

    pub fn checker(&self, options: CheckOptions) -> Checker {
        Checker::new(self.store(), options)
    }

    /// Writes `contents` at `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &[u8]) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.root().join(rel)).unwrap();
    }
}

pub fn setup_test_fixture() -> TestFixture {
    let fixture = TestFixture::new();
    fixture.write("main.py", b"print('hello')\n");
    fixture.write("docs/readme.md", b"# readme\n");
    fixture.write("docs/img/logo.svg", b"<svg/>");
    fixture.write(".hidden/config", b"secret=1");
    fixture
}
