//! Property-based test generators using proptest.
//!
//! Names and scores are drawn from small pools so that secondary-index
//! buckets regularly hold more than one id.

use proptest::prelude::*;
use rosterdb_core::{Record, RecordId};

/// Strategy for record ids, negatives included.
pub fn id_strategy() -> impl Strategy<Value = RecordId> {
    -50i64..200
}

/// Strategy for names.
///
/// Mixes a pool of common names with awkward ones that need JSON escaping.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(vec!["Ada", "Alan", "Grace", "Edsger", "Barbara"])
            .prop_map(str::to_string),
        1 => prop::sample::select(vec![
            "",
            "O'Brien",
            "Zoë",
            "quote\"name",
            "back\\slash",
            "new\nline",
            "tab\there",
        ])
        .prop_map(str::to_string),
        1 => prop::string::string_regex("[A-Za-z][A-Za-z ]{0,15}").expect("Invalid regex"),
    ]
}

/// Strategy for finite scores on a one-decimal grid between 0.0 and 4.0.
pub fn score_strategy() -> impl Strategy<Value = f64> {
    (0u8..=40).prop_map(|tenths| f64::from(tenths) / 10.0)
}

/// Strategy for a single record.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    (id_strategy(), name_strategy(), score_strategy(), any::<bool>())
        .prop_map(|(id, name, score, active)| Record::new(id, name, score, active))
}

/// Strategy for up to `max` records with pairwise distinct ids, sorted by id.
pub fn distinct_records_strategy(max: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::btree_map(
        id_strategy(),
        (name_strategy(), score_strategy(), any::<bool>()),
        0..=max,
    )
    .prop_map(|fields| {
        fields
            .into_iter()
            .map(|(id, (name, score, active))| Record::new(id, name, score, active))
            .collect()
    })
}

/// One operation against a store.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Add a record
    Add(Record),
    /// Edit the record with the same id
    Edit(Record),
    /// Delete by id
    DeleteById(RecordId),
    /// Delete every record with this name
    DeleteByName(String),
    /// Delete every record with this score
    DeleteByScore(f64),
    /// Delete every record with this flag
    DeleteByActive(bool),
    /// Rebuild the indexes from the store
    Reload,
    /// Rewrite the store with only live lines
    Compact,
}

/// Strategy for generating store operations.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        6 => record_strategy().prop_map(StoreOperation::Add),
        3 => record_strategy().prop_map(StoreOperation::Edit),
        2 => id_strategy().prop_map(StoreOperation::DeleteById),
        1 => name_strategy().prop_map(StoreOperation::DeleteByName),
        1 => score_strategy().prop_map(StoreOperation::DeleteByScore),
        1 => any::<bool>().prop_map(StoreOperation::DeleteByActive),
        1 => Just(StoreOperation::Reload),
        1 => Just(StoreOperation::Compact),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
