//! Property tests over random records and operation sequences.

use proptest::prelude::*;
use rosterdb_testkit::prelude::*;

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn distinct_adds_survive_reopen(records in distinct_records_strategy(24)) {
        let mut store = TestStore::file();
        for record in &records {
            store.add(record.clone()).unwrap();
        }
        store.reopen();

        prop_assert_eq!(store.len(), records.len());
        for record in &records {
            prop_assert_eq!(&store.find_by_id(record.id).unwrap(), record);

            let by_name = store.find_by_name(&record.name).unwrap();
            prop_assert!(by_name.iter().any(|r| r.id == record.id));
            let by_score = store.find_by_score(record.score).unwrap();
            prop_assert!(by_score.iter().any(|r| r.id == record.id));
            let by_active = store.find_by_active(record.active).unwrap();
            prop_assert!(by_active.iter().any(|r| r.id == record.id));
        }
    }

    #[test]
    fn add_then_find_round_trips(record in record_strategy()) {
        with_temp_store(|db| {
            db.add(record.clone()).unwrap();
            assert_eq!(db.find_by_id(record.id).unwrap(), record);
        });
    }

    #[test]
    fn load_is_idempotent(ops in operation_sequence_strategy(1, 40)) {
        let mut harness = StoreHarness::new();
        for op in &ops {
            harness.apply(op);
        }

        harness.db.reload().unwrap();
        let once = harness.db.index_snapshot();
        harness.db.reload().unwrap();
        let twice = harness.db.index_snapshot();

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn operations_match_model(ops in operation_sequence_strategy(1, 60)) {
        let mut harness = StoreHarness::new();
        for op in &ops {
            harness.apply(op);
            harness.verify_all();
        }
    }

    #[test]
    fn delete_removes_from_every_bucket(records in distinct_records_strategy(16), pick in any::<prop::sample::Index>()) {
        prop_assume!(!records.is_empty());
        let victim = pick.get(&records).clone();

        let store = TestStore::memory();
        for record in &records {
            store.add(record.clone()).unwrap();
        }
        store.delete_by_id(victim.id).unwrap();

        prop_assert!(store.find_by_id(victim.id).unwrap_err().is_not_found());
        let snapshot = store.index_snapshot();
        prop_assert!(snapshot.by_name.values().all(|ids| !ids.contains(&victim.id)));
        prop_assert!(snapshot.by_score.values().all(|ids| !ids.contains(&victim.id)));
        prop_assert!(snapshot.by_active.values().all(|ids| !ids.contains(&victim.id)));
        prop_assert!(snapshot.by_name.values().all(|ids| !ids.is_empty()));
        store.check_invariants().unwrap();
    }

    #[test]
    fn compaction_keeps_live_view(ops in operation_sequence_strategy(1, 40)) {
        let mut harness = StoreHarness::new();
        for op in &ops {
            harness.apply(op);
        }

        harness.apply(&StoreOperation::Compact);
        harness.verify_all();
        harness.apply(&StoreOperation::Reload);
        harness.verify_all();
    }
}
