//! The set of record hashes already written during a run.
//!
//! [`Merger`](crate::Merger) only needs insert-if-absent. A disk-backed or
//! probabilistic set can stand in for the default `HashSet` by implementing
//! [`SeenSet`]; a false positive there drops a record, never duplicates one.

use std::collections::{BTreeSet, HashSet};

use archivist_core::RecordHash;

pub trait SeenSet {
    /// Insert `hash`. Returns `true` if it was not present before.
    fn insert(&mut self, hash: RecordHash) -> bool;

    fn contains(&self, hash: &RecordHash) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SeenSet for HashSet<RecordHash> {
    fn insert(&mut self, hash: RecordHash) -> bool {
        HashSet::insert(self, hash)
    }

    fn contains(&self, hash: &RecordHash) -> bool {
        HashSet::contains(self, hash)
    }

    fn len(&self) -> usize {
        HashSet::len(self)
    }
}

impl SeenSet for BTreeSet<RecordHash> {
    fn insert(&mut self, hash: RecordHash) -> bool {
        BTreeSet::insert(self, hash)
    }

    fn contains(&self, hash: &RecordHash) -> bool {
        BTreeSet::contains(self, hash)
    }

    fn len(&self) -> usize {
        BTreeSet::len(self)
    }
}
