//! Model-checking harness.
//!
//! [`StoreHarness`] applies every operation both to a real store and to a
//! plain map, then checks that every lookup the store answers agrees with
//! the map.

use crate::generators::StoreOperation;
use rosterdb_core::{Database, Record, RecordId, Score};
use std::collections::{BTreeMap, BTreeSet};

/// A store paired with the records it is expected to hold.
pub struct StoreHarness {
    /// The store instance.
    pub db: Database,
    /// Records currently live.
    live: BTreeMap<RecordId, Record>,
    /// Records a reload would bring back: the newest line per id.
    persisted: BTreeMap<RecordId, Record>,
}

impl StoreHarness {
    /// Creates a new harness over an in-memory store.
    pub fn new() -> Self {
        Self {
            db: Database::open_in_memory().expect("Failed to open store"),
            live: BTreeMap::new(),
            persisted: BTreeMap::new(),
        }
    }

    /// Applies `op` to the store and the model.
    ///
    /// # Panics
    ///
    /// Panics if the store's answer disagrees with the model.
    pub fn apply(&mut self, op: &StoreOperation) {
        match op {
            StoreOperation::Add(record) => self.add(record.clone()),
            StoreOperation::Edit(record) => self.edit(record.clone()),
            StoreOperation::DeleteById(id) => {
                let result = self.db.delete_by_id(*id);
                if self.live.remove(id).is_some() {
                    result.expect("Failed to delete live id");
                } else {
                    assert!(result.expect_err("Deleted absent id").is_not_found());
                }
            }
            StoreOperation::DeleteByName(name) => {
                let removed = self.db.delete_by_name(name);
                self.expect_bulk_delete(removed, |r| &r.name == name);
            }
            StoreOperation::DeleteByScore(score) => {
                let removed = self.db.delete_by_score(*score);
                self.expect_bulk_delete(removed, |r| Score::new(r.score) == Score::new(*score));
            }
            StoreOperation::DeleteByActive(active) => {
                let removed = self.db.delete_by_active(*active);
                self.expect_bulk_delete(removed, |r| r.active == *active);
            }
            StoreOperation::Reload => {
                self.db.reload().expect("Failed to reload");
                self.live = self.persisted.clone();
            }
            StoreOperation::Compact => {
                self.db.compact().expect("Failed to compact");
                self.persisted = self.live.clone();
            }
        }
    }

    /// Adds a record, expecting `DuplicateId` if its id is live.
    pub fn add(&mut self, record: Record) {
        let result = self.db.add(record.clone());
        if self.live.contains_key(&record.id) {
            assert!(result.expect_err("Duplicate add succeeded").is_duplicate());
        } else {
            result.expect("Failed to add record");
            self.persisted.insert(record.id, record.clone());
            self.live.insert(record.id, record);
        }
    }

    /// Edits a record, expecting `NotFound` if its id is not live.
    pub fn edit(&mut self, record: Record) {
        let result = self.db.edit(record.clone());
        if self.live.contains_key(&record.id) {
            result.expect("Failed to edit record");
            self.persisted.insert(record.id, record.clone());
            self.live.insert(record.id, record);
        } else {
            assert!(result.expect_err("Edited absent id").is_not_found());
        }
    }

    fn expect_bulk_delete(
        &mut self,
        result: rosterdb_core::CoreResult<usize>,
        matches: impl Fn(&Record) -> bool,
    ) {
        let before = self.live.len();
        self.live.retain(|_, r| !matches(r));
        let expected = before - self.live.len();

        if expected == 0 {
            assert!(result.expect_err("Deleted empty bucket").is_not_found());
        } else {
            assert_eq!(result.expect("Failed to delete bucket"), expected);
        }
    }

    /// Verifies every live record through every index.
    ///
    /// # Panics
    ///
    /// Panics on the first disagreement.
    pub fn verify_all(&self) {
        self.db.check_invariants().expect("Index invariants violated");
        assert_eq!(self.db.len(), self.live.len(), "Live record count mismatch");

        for (id, expected) in &self.live {
            let actual = self.db.find_by_id(*id).expect("Failed to find live id");
            assert_eq!(&actual, expected, "Record mismatch for id {}", id);
        }

        let names: BTreeSet<&str> = self.live.values().map(|r| r.name.as_str()).collect();
        for name in names {
            let found = self.db.find_by_name(name).expect("Failed to find by name");
            assert_eq!(ids(&found), self.expected_ids(|r| r.name == name), "name {:?}", name);
        }

        let scores: BTreeSet<Score> = self.live.values().map(|r| Score::new(r.score)).collect();
        for score in scores {
            let found = self.db.find_by_score(score.value()).expect("Failed to find by score");
            assert_eq!(
                ids(&found),
                self.expected_ids(|r| Score::new(r.score) == score),
                "score {}",
                score
            );
        }

        for active in [true, false] {
            let expected = self.expected_ids(|r| r.active == active);
            match self.db.find_by_active(active) {
                Ok(found) => assert_eq!(ids(&found), expected, "active {}", active),
                Err(e) => {
                    assert!(e.is_not_found());
                    assert!(expected.is_empty(), "active {} bucket missing", active);
                }
            }
        }
    }

    /// Returns the count of live records in the model.
    pub fn tracked_count(&self) -> usize {
        self.live.len()
    }

    fn expected_ids(&self, pred: impl Fn(&Record) -> bool) -> Vec<RecordId> {
        self.live.values().filter(|r| pred(r)).map(|r| r.id).collect()
    }
}

impl Default for StoreHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn ids(records: &[Record]) -> Vec<RecordId> {
    records.iter().map(|r| r.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harness_tracks_reload_and_compact() {
        let mut harness = StoreHarness::new();
        harness.add(Record::new(1, "A", 1.0, true));
        harness.add(Record::new(2, "B", 2.0, false));

        harness.apply(&StoreOperation::DeleteById(2));
        harness.verify_all();
        assert_eq!(harness.tracked_count(), 1);

        harness.apply(&StoreOperation::Reload);
        harness.verify_all();
        assert_eq!(harness.tracked_count(), 2);

        harness.apply(&StoreOperation::DeleteById(2));
        harness.apply(&StoreOperation::Compact);
        harness.apply(&StoreOperation::Reload);
        harness.verify_all();
        assert_eq!(harness.tracked_count(), 1);
    }
}
