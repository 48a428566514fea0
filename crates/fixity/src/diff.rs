//! Snapshot comparison.
//!
//! Matches entries by path-key and sorts each into exactly one of
//! modified, missing or added. Paths with equal digests on both sides are
//! unchanged and not reported.

use crate::snapshot::Snapshot;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub modified: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    pub added: BTreeSet<String>,
}

impl DiffResult {
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.missing.is_empty() && self.added.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.modified.len() + self.missing.len() + self.added.len()
    }

    /// Paths present in both snapshots with the same digest.
    pub fn unchanged(&self, old: &Snapshot, new: &Snapshot) -> BTreeSet<String> {
        old.keys()
            .filter(|key| new.contains(key) && !self.modified.contains(*key))
            .map(str::to_string)
            .collect()
    }
}

/// Compare a baseline snapshot against a fresh one
pub fn diff(old: &Snapshot, new: &Snapshot) -> DiffResult {
    let mut result = DiffResult::default();

    for (path, old_digest) in old.iter() {
        match new.get(path) {
            None => {
                result.missing.insert(path.to_string());
            }
            Some(new_digest) if new_digest != old_digest => {
                result.modified.insert(path.to_string());
            }
            Some(_) => {}
        }
    }

    for path in new.keys() {
        if !old.contains(path) {
            result.added.insert(path.to_string());
        }
    }

    result
}
