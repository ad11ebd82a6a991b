//! Property-based tests for full synchronization and change-queue indexing.
//!
//! Runs both workers over arbitrary ID sets using the in-memory store.

use std::collections::BTreeSet;

use content_mapping_kernel::adapters::memory::{copy_fields, MemoryStore, Record};
use content_mapping_kernel::worker::Operation;
use content_mapping_kernel::{Indexer, ObjectId, Status, Synchronizer};
use proptest::prelude::*;

const TYPE: &str = "article";

fn id_set() -> impl Strategy<Value = BTreeSet<ObjectId>> {
    prop::collection::btree_set(0i64..64, 0..24)
}

fn store_with(ids: &BTreeSet<ObjectId>, version: &str) -> MemoryStore {
    let mut store = MemoryStore::new();
    for id in ids {
        store.insert(TYPE, Record::new(*id).with_field("version", version));
    }
    store
}

fn status_strategy() -> impl Strategy<Value = Status> {
    prop_oneof![Just(Status::New), Just(Status::Update), Just(Status::Delete)]
}

proptest! {
    /// S ∖ D inserted, D ∖ S deleted, S ∩ D compared; each exactly once.
    #[test]
    fn merge_is_complete(source in id_set(), destination in id_set()) {
        let mut sync = Synchronizer::new(store_with(&source, "new"), store_with(&destination, "old"));
        let log = sync.synchronize(TYPE, copy_fields).unwrap();

        let inserted: Vec<_> = source.difference(&destination).copied().collect();
        let deleted: Vec<_> = destination.difference(&source).copied().collect();
        let compared: Vec<_> = source.intersection(&destination).copied().collect();

        prop_assert_eq!(log.ids_with(Operation::Inserted), inserted);
        prop_assert_eq!(log.ids_with(Operation::Deleted), deleted);
        prop_assert_eq!(log.ids_with(Operation::Updated), compared);
        prop_assert!(log.ids_with(Operation::Kept).is_empty());

        let expected: Vec<_> = source.iter().copied().collect();
        prop_assert_eq!(sync.destination().ids(TYPE), expected);
    }

    /// No ID is processed after a strictly larger one.
    #[test]
    fn objects_are_processed_in_id_order(source in id_set(), destination in id_set()) {
        let mut sync = Synchronizer::new(store_with(&source, "v"), store_with(&destination, "v"));
        let log = sync.synchronize(TYPE, copy_fields).unwrap();

        let ids: Vec<_> = log.entries().iter().map(|entry| entry.id).collect();
        prop_assert!(ids.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    /// A second run over a mirrored destination changes nothing.
    #[test]
    fn second_run_is_a_no_op(source in id_set(), destination in id_set()) {
        let mut sync = Synchronizer::new(store_with(&source, "new"), store_with(&destination, "old"));
        sync.synchronize(TYPE, copy_fields).unwrap();
        let log = sync.synchronize(TYPE, copy_fields).unwrap();

        let stats = log.stats();
        prop_assert_eq!(stats.inserted, 0);
        prop_assert_eq!(stats.deleted, 0);
        prop_assert_eq!(stats.updated, 0);
        prop_assert_eq!(stats.kept, source.len());
        prop_assert!(!sync.destination().has_pending_writes());
    }

    /// One commit per run and one progress notification per processed object.
    #[test]
    fn commits_once_and_reports_progress(source in id_set(), destination in id_set()) {
        let mut sync = Synchronizer::new(store_with(&source, "new"), store_with(&destination, "old"));
        let log = sync.synchronize(TYPE, copy_fields).unwrap();

        prop_assert_eq!(sync.destination().commits(), 1);
        prop_assert_eq!(sync.destination().processed(), source.union(&destination).count());
        prop_assert_eq!(log.stats().processed(), sync.destination().processed());
    }

    /// Indexing touches exactly the queued IDs and ends with the last status of each.
    #[test]
    fn indexing_follows_the_queue(
        existing in id_set(),
        queue in prop::collection::vec((0i64..64, status_strategy()), 0..32),
    ) {
        let mut source = MemoryStore::new();
        for (id, status) in &queue {
            source.enqueue(TYPE, Record::new(*id).with_field("version", "queued").with_status(*status));
        }

        let mut indexer = Indexer::new(source, store_with(&existing, "old"));
        let log = indexer.index(TYPE, copy_fields).unwrap();

        prop_assert_eq!(log.entries().len(), queue.len());
        prop_assert_eq!(indexer.destination().processed(), queue.len());
        prop_assert_eq!(indexer.destination().commits(), 1);

        // The queue is stably sorted by ID, so the last entry per ID wins
        let mut expected = existing.clone();
        let mut ordered = queue.clone();
        ordered.sort_by_key(|(id, _)| *id);
        for (id, status) in ordered {
            match status {
                Status::Delete => expected.remove(&id),
                Status::New | Status::Update => expected.insert(id),
            };
        }
        let expected: Vec<_> = expected.into_iter().collect();
        prop_assert_eq!(indexer.destination().ids(TYPE), expected);
    }
}

#[test]
fn empty_sides_log_only_start_and_end() {
    let mut sync = Synchronizer::new(MemoryStore::new(), MemoryStore::new());
    let log = sync.synchronize(TYPE, copy_fields).unwrap();

    assert_eq!(
        log.messages(),
        &[
            "Start of synchronization for article",
            "End of synchronization for article",
        ]
    );
    assert_eq!(sync.destination().commits(), 1);

    let mut indexer = Indexer::new(MemoryStore::new(), MemoryStore::new());
    let log = indexer.index(TYPE, copy_fields).unwrap();
    assert_eq!(log.messages().len(), 2);
    assert_eq!(indexer.destination().commits(), 1);
}
