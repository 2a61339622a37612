//! Store-port property tests against the in-memory adapter.

use std::sync::Arc;

use crate::task::{
    adapters::memory::InMemoryTaskStore,
    domain::{ActorId, MessageId, TaskId, TaskStatus},
    ports::{TaskStore, TaskStoreError},
};
use rstest::{fixture, rstest};

#[fixture]
fn store() -> InMemoryTaskStore {
    InMemoryTaskStore::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_sighting_creates_record_and_metadata(store: InMemoryTaskStore) {
    let task_id = TaskId::new();
    let initiated_by = ActorId::new();

    let (record, is_new) = store
        .resolve_or_create(task_id, Some(MessageId::new("amq.1")), initiated_by)
        .await
        .expect("resolve should succeed");

    assert!(is_new);
    assert_eq!(record.retry_count(), 0);
    assert_eq!(record.status(), TaskStatus::InProgress);

    let metadata = store
        .find_metadata(task_id)
        .await
        .expect("lookup should succeed")
        .expect("metadata should exist");
    assert_eq!(metadata.initiated_by(), initiated_by);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn nth_sighting_counts_retries_without_new_metadata(store: InMemoryTaskStore) {
    let task_id = TaskId::new();
    let initiated_by = ActorId::new();

    let (_, first) = store
        .resolve_or_create(task_id, Some(MessageId::new("amq.1")), initiated_by)
        .await
        .expect("resolve should succeed");
    assert!(first);

    let first_metadata = store
        .find_metadata(task_id)
        .await
        .expect("lookup should succeed")
        .expect("metadata should exist");

    for expected_retry in 1..=3 {
        let (record, is_new) = store
            .resolve_or_create(task_id, Some(MessageId::new("amq.redelivered")), initiated_by)
            .await
            .expect("resolve should succeed");
        assert!(!is_new);
        assert_eq!(record.retry_count(), expected_retry);
        assert_eq!(record.status(), TaskStatus::InProgress);
    }

    let metadata = store
        .find_metadata(task_id)
        .await
        .expect("lookup should succeed")
        .expect("metadata should exist");
    assert_eq!(metadata, first_metadata);

    let record = store
        .find_by_id(task_id)
        .await
        .expect("lookup should succeed")
        .expect("record should exist");
    // The creating delivery's message identifier sticks.
    assert_eq!(record.message_id().map(MessageId::as_str), Some("amq.1"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_status_persists_terminal_fields(store: InMemoryTaskStore) {
    let task_id = TaskId::new();
    store
        .resolve_or_create(task_id, None, ActorId::new())
        .await
        .expect("resolve should succeed");

    let updated = store
        .update_status(task_id, TaskStatus::Done, Some(1.23), None)
        .await
        .expect("update should succeed");

    assert_eq!(updated.status(), TaskStatus::Done);
    assert_eq!(updated.processing_time_seconds(), Some(1.23));
    assert_eq!(updated.error_message(), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_status_on_unknown_task_creates_nothing(store: InMemoryTaskStore) {
    let task_id = TaskId::new();

    let result = store
        .update_status(task_id, TaskStatus::Done, Some(0.1), None)
        .await;

    assert!(matches!(result, Err(TaskStoreError::NotFound(id)) if id == task_id));
    let found = store
        .find_by_id(task_id)
        .await
        .expect("lookup should succeed");
    assert!(found.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_status_rejects_non_terminal_status(store: InMemoryTaskStore) {
    let task_id = TaskId::new();
    store
        .resolve_or_create(task_id, None, ActorId::new())
        .await
        .expect("resolve should succeed");

    let result = store
        .update_status(task_id, TaskStatus::InProgress, None, None)
        .await;

    assert!(matches!(result, Err(TaskStoreError::Domain(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_first_sightings_create_one_record(store: InMemoryTaskStore) {
    let task_id = TaskId::new();
    let initiated_by = ActorId::new();
    let shared = Arc::new(store);

    let left_store = Arc::clone(&shared);
    let left = tokio::spawn(async move {
        left_store
            .resolve_or_create(task_id, Some(MessageId::new("amq.a")), initiated_by)
            .await
    });
    let right_store = Arc::clone(&shared);
    let right = tokio::spawn(async move {
        right_store
            .resolve_or_create(task_id, Some(MessageId::new("amq.b")), initiated_by)
            .await
    });

    let (_, left_new) = left
        .await
        .expect("join should succeed")
        .expect("resolve should succeed");
    let (_, right_new) = right
        .await
        .expect("join should succeed")
        .expect("resolve should succeed");

    // Exactly one call observed the creation; the other took the
    // redelivery path.
    assert!(left_new ^ right_new);

    let record = shared
        .find_by_id(task_id)
        .await
        .expect("lookup should succeed")
        .expect("record should exist");
    assert_eq!(record.retry_count(), 1);

    let metadata = shared
        .find_metadata(task_id)
        .await
        .expect("lookup should succeed");
    assert!(metadata.is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closed_store_refuses_operations(store: InMemoryTaskStore) {
    store.close().await.expect("close should succeed");

    let result = store.resolve_or_create(TaskId::new(), None, ActorId::new()).await;

    assert!(matches!(result, Err(TaskStoreError::Persistence(_))));
}
