//! Index Engine - keeps the primary and secondary indexes in lock-step.
//!
//! The engine owns five structures and is the only code that touches them:
//!
//! - `by_id`: record id to the byte offset of its line in the store
//! - `by_name`, `by_score`, `by_active`: attribute value to set of ids
//! - `summaries`: record id to its cached [`Summary`]
//!
//! # Invariants
//!
//! - Every id in `by_id` has exactly one `summaries` entry and sits in
//!   exactly one bucket of each secondary index, matching that summary
//! - No secondary index holds an empty bucket
//! - `by_id[id]` points at the start of a line whose parsed id is `id`
//! - Ids are unique; `add` rejects an id that is already indexed
//!
//! Deleting only removes index entries. The record's line stays in the
//! store until a compaction or restore rewrites the file, so a plain reload
//! of an uncompacted store brings deleted records back.

use crate::entity::{Record, RecordId, Score, Summary};
use crate::error::{CoreError, CoreResult};
use crate::index::HashIndex;
use rosterdb_storage::StorageBackend;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// How [`IndexEngine::edit`] treats the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditPolicy {
    /// Append the edited record as a new line and repoint `by_id` to it.
    ///
    /// The previous line becomes dead. Every read, reload, backup and
    /// compaction sees the edited record.
    #[default]
    Reappend,
    /// Update the indexes only and leave `by_id` on the original line.
    ///
    /// Secondary indexes reflect the edit, but every read goes to the
    /// original line and returns the pre-edit record, and a reload or
    /// backup forgets the edit entirely. A compaction writes the edit out.
    IndexOnly,
}

/// Sizes of each index, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexCounts {
    /// Number of live records.
    pub records: usize,
    /// Number of distinct names.
    pub names: usize,
    /// Number of distinct scores.
    pub scores: usize,
    /// Number of active records.
    pub active: usize,
    /// Number of inactive records.
    pub inactive: usize,
}

/// An ordered, comparable copy of the whole index state.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSnapshot {
    /// Id to offset.
    pub by_id: BTreeMap<RecordId, u64>,
    /// Name buckets.
    pub by_name: BTreeMap<String, BTreeSet<RecordId>>,
    /// Score buckets.
    pub by_score: BTreeMap<Score, BTreeSet<RecordId>>,
    /// Active buckets.
    pub by_active: BTreeMap<bool, BTreeSet<RecordId>>,
    /// Cached summaries.
    pub summaries: BTreeMap<RecordId, Summary>,
}

/// The four indexes plus the summary cache, maintained as one unit.
///
/// The engine does not own the store; operations that read or append lines
/// borrow a [`StorageBackend`] for the duration of the call.
#[derive(Debug, Clone)]
pub struct IndexEngine {
    by_id: HashMap<RecordId, u64>,
    by_name: HashIndex<String>,
    by_score: HashIndex<Score>,
    by_active: HashIndex<bool>,
    summaries: HashMap<RecordId, Summary>,
    edit_policy: EditPolicy,
}

impl Default for IndexEngine {
    fn default() -> Self {
        Self::new(EditPolicy::default())
    }
}

impl IndexEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new(edit_policy: EditPolicy) -> Self {
        Self {
            by_id: HashMap::new(),
            by_name: HashIndex::new("name"),
            by_score: HashIndex::new("score"),
            by_active: HashIndex::new("active"),
            summaries: HashMap::new(),
            edit_policy,
        }
    }

    /// Returns the edit policy.
    #[must_use]
    pub fn edit_policy(&self) -> EditPolicy {
        self.edit_policy
    }

    // === Mutations ===

    /// Appends `record` to the store and indexes it.
    ///
    /// Returns the offset of the new line.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DuplicateId`] if the id is already indexed
    /// - [`CoreError::InvalidRecord`] if the record cannot be encoded
    /// - [`CoreError::Storage`] if the append fails; indexes are untouched
    pub fn add(&mut self, record: &Record, backend: &mut dyn StorageBackend) -> CoreResult<u64> {
        if self.by_id.contains_key(&record.id) {
            return Err(CoreError::DuplicateId { id: record.id });
        }

        let line = record.encode()?;
        let offset = backend.append_line(&line)?;
        self.insert_entry(record.id, offset, record.summary());
        debug!(id = record.id, offset, "record added");
        Ok(offset)
    }

    /// Indexes a line that already exists in the store.
    ///
    /// Used by the loader. If the id is already indexed, the earlier entry
    /// is replaced (a later line for the same id wins). Returns true if an
    /// earlier entry was replaced.
    pub fn index_existing(&mut self, record: &Record, offset: u64) -> bool {
        let superseded = match self.summaries.remove(&record.id) {
            Some(old) => {
                self.remove_from_buckets(record.id, &old);
                true
            }
            None => false,
        };
        self.insert_entry(record.id, offset, record.summary());
        superseded
    }

    /// Removes one id from every index.
    ///
    /// The store is not touched.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if the id is not indexed.
    pub fn delete_by_id(&mut self, id: RecordId) -> CoreResult<()> {
        if self.forget(id) {
            Ok(())
        } else {
            Err(CoreError::not_found(format!("record with id {}", id)))
        }
    }

    /// Removes every record named `name`. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no record has that name.
    pub fn delete_by_name(&mut self, name: &str) -> CoreResult<usize> {
        let key = name.to_string();
        let ids = Self::bucket_ids(&self.by_name, &key)
            .ok_or_else(|| CoreError::not_found(format!("records with name {:?}", name)))?;
        let removed = self.forget_all(&ids);
        self.by_name.take(&key);
        Ok(removed)
    }

    /// Removes every record with exactly this score. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no record has that score.
    pub fn delete_by_score(&mut self, score: f64) -> CoreResult<usize> {
        let key = Score::new(score);
        let ids = Self::bucket_ids(&self.by_score, &key)
            .ok_or_else(|| CoreError::not_found(format!("records with score {}", score)))?;
        let removed = self.forget_all(&ids);
        self.by_score.take(&key);
        Ok(removed)
    }

    /// Removes every record with this active flag. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no record has that flag.
    pub fn delete_by_active(&mut self, active: bool) -> CoreResult<usize> {
        let ids = Self::bucket_ids(&self.by_active, &active)
            .ok_or_else(|| CoreError::not_found(format!("records with active {}", active)))?;
        let removed = self.forget_all(&ids);
        self.by_active.take(&active);
        Ok(removed)
    }

    /// Replaces the indexed attributes of an existing record.
    ///
    /// Under [`EditPolicy::Reappend`] the new record is appended first and
    /// the indexes change only if the append succeeds.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the id is not indexed
    /// - [`CoreError::InvalidRecord`] if the record cannot be encoded
    /// - [`CoreError::Storage`] if the append fails
    pub fn edit(&mut self, record: &Record, backend: &mut dyn StorageBackend) -> CoreResult<()> {
        if !self.summaries.contains_key(&record.id) {
            return Err(CoreError::not_found(format!("record with id {}", record.id)));
        }

        match self.edit_policy {
            EditPolicy::Reappend => {
                let line = record.encode()?;
                let offset = backend.append_line(&line)?;
                self.by_id.insert(record.id, offset);
                debug!(id = record.id, offset, "record re-appended on edit");
            }
            EditPolicy::IndexOnly => record.validate()?,
        }

        if let Some(old) = self.summaries.remove(&record.id) {
            self.remove_from_buckets(record.id, &old);
        }
        let summary = record.summary();
        self.add_to_buckets(record.id, &summary);
        self.summaries.insert(record.id, summary);
        Ok(())
    }

    /// Drops every entry from every index.
    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_name.clear();
        self.by_score.clear();
        self.by_active.clear();
        self.summaries.clear();
    }

    // === Queries ===

    /// Reads the record for `id` from the store.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if the id is not indexed, or if its line is
    /// out of range, unparsable, or belongs to a different id. I/O failures
    /// propagate as [`CoreError::Storage`].
    pub fn find_by_id(&self, id: RecordId, backend: &dyn StorageBackend) -> CoreResult<Record> {
        let offset = *self
            .by_id
            .get(&id)
            .ok_or_else(|| CoreError::not_found(format!("record with id {}", id)))?;

        let line = match backend.read_line_at(offset) {
            Ok(line) => line,
            Err(e) if e.is_missing_line() => {
                return Err(CoreError::not_found(format!(
                    "record with id {} (offset {} out of range)",
                    id, offset
                )))
            }
            Err(e) => return Err(e.into()),
        };

        match Record::decode(&line) {
            Ok(record) if record.id == id => Ok(record),
            Ok(record) => Err(CoreError::not_found(format!(
                "record with id {} (offset {} holds id {})",
                id, offset, record.id
            ))),
            Err(e) => Err(CoreError::not_found(format!(
                "record with id {} (unparsable line: {})",
                id, e
            ))),
        }
    }

    /// Reads every record named `name`, ordered by id.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no record has that name. Ids whose line
    /// cannot be read or parsed are skipped.
    pub fn find_by_name(&self, name: &str, backend: &dyn StorageBackend) -> CoreResult<Vec<Record>> {
        let ids = Self::bucket_ids(&self.by_name, &name.to_string())
            .ok_or_else(|| CoreError::not_found(format!("records with name {:?}", name)))?;
        self.resolve(&ids, backend)
    }

    /// Reads every record with exactly this score, ordered by id.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no record has that score.
    pub fn find_by_score(&self, score: f64, backend: &dyn StorageBackend) -> CoreResult<Vec<Record>> {
        let ids = Self::bucket_ids(&self.by_score, &Score::new(score))
            .ok_or_else(|| CoreError::not_found(format!("records with score {}", score)))?;
        self.resolve(&ids, backend)
    }

    /// Reads every record with this active flag, ordered by id.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no record has that flag.
    pub fn find_by_active(&self, active: bool, backend: &dyn StorageBackend) -> CoreResult<Vec<Record>> {
        let ids = Self::bucket_ids(&self.by_active, &active)
            .ok_or_else(|| CoreError::not_found(format!("records with active {}", active)))?;
        self.resolve(&ids, backend)
    }

    /// Returns true if `id` is live.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Returns the offset of the live line for `id`.
    #[must_use]
    pub fn offset_of(&self, id: RecordId) -> Option<u64> {
        self.by_id.get(&id).copied()
    }

    /// Returns true if the line at `offset` is the current line for `id`.
    #[must_use]
    pub fn is_live_line(&self, id: RecordId, offset: u64) -> bool {
        self.by_id.get(&id) == Some(&offset)
    }

    /// Returns the cached summary for `id`.
    #[must_use]
    pub fn summary(&self, id: RecordId) -> Option<&Summary> {
        self.summaries.get(&id)
    }

    /// Returns the number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if no record is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Returns the size of every index.
    #[must_use]
    pub fn counts(&self) -> IndexCounts {
        IndexCounts {
            records: self.by_id.len(),
            names: self.by_name.key_count(),
            scores: self.by_score.key_count(),
            active: self.by_active.lookup(&true).map_or(0, |s| s.len()),
            inactive: self.by_active.lookup(&false).map_or(0, |s| s.len()),
        }
    }

    /// Returns an ordered copy of the whole index state.
    #[must_use]
    pub fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            by_id: self.by_id.iter().map(|(k, v)| (*k, *v)).collect(),
            by_name: self.by_name.to_sorted(),
            by_score: self.by_score.to_sorted(),
            by_active: self.by_active.to_sorted(),
            summaries: self
                .summaries
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
        }
    }

    /// Verifies the cross-index invariants.
    ///
    /// # Errors
    ///
    /// [`CoreError::Inconsistent`] describing the first violation found.
    pub fn check_invariants(&self) -> CoreResult<()> {
        if self.summaries.len() != self.by_id.len() {
            return Err(CoreError::inconsistent(format!(
                "{} summaries for {} ids",
                self.summaries.len(),
                self.by_id.len()
            )));
        }

        for (id, summary) in &self.summaries {
            if !self.by_id.contains_key(id) {
                return Err(CoreError::inconsistent(format!("summary for unknown id {}", id)));
            }
            let in_name = Self::bucket_has(&self.by_name, &summary.name, *id);
            let in_score = Self::bucket_has(&self.by_score, &Score::new(summary.score), *id);
            let in_active = Self::bucket_has(&self.by_active, &summary.active, *id);
            if !(in_name && in_score && in_active) {
                return Err(CoreError::inconsistent(format!(
                    "id {} missing from a bucket matching its summary",
                    id
                )));
            }
        }

        for (index_len, name) in [
            (self.by_name.len(), self.by_name.name()),
            (self.by_score.len(), self.by_score.name()),
            (self.by_active.len(), self.by_active.name()),
        ] {
            if index_len != self.by_id.len() {
                return Err(CoreError::inconsistent(format!(
                    "{} index holds {} entries for {} ids",
                    name,
                    index_len,
                    self.by_id.len()
                )));
            }
        }

        let empty_bucket = self.by_name.iter().any(|(_, ids)| ids.is_empty())
            || self.by_score.iter().any(|(_, ids)| ids.is_empty())
            || self.by_active.iter().any(|(_, ids)| ids.is_empty());
        if empty_bucket {
            return Err(CoreError::inconsistent("empty bucket present"));
        }

        Ok(())
    }

    // === Internals ===

    fn insert_entry(&mut self, id: RecordId, offset: u64, summary: Summary) {
        self.by_id.insert(id, offset);
        self.add_to_buckets(id, &summary);
        self.summaries.insert(id, summary);
    }

    fn add_to_buckets(&mut self, id: RecordId, summary: &Summary) {
        self.by_name.insert(summary.name.clone(), id);
        self.by_score.insert(Score::new(summary.score), id);
        self.by_active.insert(summary.active, id);
    }

    fn remove_from_buckets(&mut self, id: RecordId, summary: &Summary) {
        self.by_name.remove(&summary.name, id);
        self.by_score.remove(&Score::new(summary.score), id);
        self.by_active.remove(&summary.active, id);
    }

    /// Removes `id` from every index. Returns false if it was not live.
    fn forget(&mut self, id: RecordId) -> bool {
        if self.by_id.remove(&id).is_none() {
            return false;
        }
        if let Some(summary) = self.summaries.remove(&id) {
            self.remove_from_buckets(id, &summary);
        }
        true
    }

    fn forget_all(&mut self, ids: &[RecordId]) -> usize {
        ids.iter().filter(|id| self.forget(**id)).count()
    }

    fn bucket_ids<K: Eq + std::hash::Hash + Clone>(
        index: &HashIndex<K>,
        key: &K,
    ) -> Option<Vec<RecordId>> {
        let set = index.lookup(key)?;
        if set.is_empty() {
            return None;
        }
        let mut ids: Vec<RecordId> = set.iter().copied().collect();
        ids.sort_unstable();
        Some(ids)
    }

    fn bucket_has<K: Eq + std::hash::Hash + Clone>(
        index: &HashIndex<K>,
        key: &K,
        id: RecordId,
    ) -> bool {
        index.lookup(key).is_some_and(|ids| ids.contains(&id))
    }

    /// Reads and parses the lines for `ids`, skipping any that fail.
    fn resolve(&self, ids: &[RecordId], backend: &dyn StorageBackend) -> CoreResult<Vec<Record>> {
        let mut records = Vec::with_capacity(ids.len());
        for &id in ids {
            let Some(&offset) = self.by_id.get(&id) else {
                debug!(id, "bucket id has no offset, skipping");
                continue;
            };
            let line = match backend.read_line_at(offset) {
                Ok(line) => line,
                Err(e) if e.is_missing_line() => {
                    debug!(id, offset, error = %e, "line out of range, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match Record::decode(&line) {
                Ok(record) if record.id == id => records.push(record),
                Ok(record) => {
                    debug!(id, offset, found = record.id, "line holds another id, skipping");
                }
                Err(e) => debug!(id, offset, error = %e, "unparsable line, skipping"),
            }
        }
        Ok(records)
    }
}
