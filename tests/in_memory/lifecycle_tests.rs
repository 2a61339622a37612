//! End-to-end lifecycle scenarios through worker, interceptor, and store.

use std::time::Duration;

use conveyor::consumer::domain::TaskPayload;
use conveyor::task::domain::{ActorId, TaskId, TaskStatus};
use conveyor::task::ports::TaskStore;
use rstest::rstest;

use super::helpers::{Harness, Step};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_task_records_done_with_duration() {
    let harness = Harness::spawn(2);
    let payload = TaskPayload::new(TaskId::new(), ActorId::new());
    harness
        .handler
        .script(
            payload.task_id(),
            [Step::SucceedAfter(Duration::from_millis(500))],
        )
        .await;

    harness.publish(&payload);

    let record = harness
        .wait_for(payload.task_id(), |record| {
            record.status() == TaskStatus::Done
        })
        .await;

    assert_eq!(record.retry_count(), 0);
    assert_eq!(record.error_message(), None);
    let seconds = record
        .processing_time_seconds()
        .expect("duration should be measured");
    assert!(seconds >= 0.5, "handler slept 500ms, measured {seconds}");
    assert!(seconds < 5.0, "duration implausibly long: {seconds}");

    let metadata = harness
        .store
        .find_metadata(payload.task_id())
        .await
        .expect("lookup should succeed")
        .expect("metadata should exist");
    assert_eq!(metadata.initiated_by(), payload.initiated_by());

    // The success outcome reaches the transport as an acknowledgement.
    for _ in 0..250 {
        if harness.queue.acked() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(harness.queue.acked(), 1);

    harness.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn redelivered_task_records_failure_with_reason() {
    let harness = Harness::spawn(2);
    let payload = TaskPayload::new(TaskId::new(), ActorId::new());
    harness
        .handler
        .script(
            payload.task_id(),
            [
                Step::SucceedAfter(Duration::ZERO),
                Step::FailWith("db timeout"),
                // Exhaust the queue's redelivery budget without recovering.
                Step::FailWith("db timeout"),
                Step::FailWith("db timeout"),
                Step::FailWith("db timeout"),
            ],
        )
        .await;

    harness.publish(&payload);
    harness
        .wait_for(payload.task_id(), |record| {
            record.status() == TaskStatus::Done
        })
        .await;

    // The same task arrives again under a new message identifier.
    harness.publish(&payload);
    let record = harness
        .wait_for(payload.task_id(), |record| {
            record.status() == TaskStatus::Failed
        })
        .await;

    assert!(record.retry_count() >= 1);
    assert_eq!(record.error_message(), Some("db timeout"));

    harness.shutdown().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_tasks_do_not_cross_contaminate() {
    let harness = Harness::spawn(2);
    let fast = TaskPayload::new(TaskId::new(), ActorId::new());
    let doomed = TaskPayload::new(TaskId::new(), ActorId::new());
    harness
        .handler
        .script(
            fast.task_id(),
            [Step::SucceedAfter(Duration::from_millis(50))],
        )
        .await;
    harness
        .handler
        .script(
            doomed.task_id(),
            [
                Step::FailWith("doomed"),
                Step::FailWith("doomed"),
                Step::FailWith("doomed"),
                Step::FailWith("doomed"),
            ],
        )
        .await;

    harness.publish(&fast);
    harness.publish(&doomed);

    let fast_record = harness
        .wait_for(fast.task_id(), |record| {
            record.status() == TaskStatus::Done
        })
        .await;
    let doomed_record = harness
        .wait_for(doomed.task_id(), |record| {
            record.status() == TaskStatus::Failed
        })
        .await;

    assert_eq!(fast_record.retry_count(), 0);
    assert_eq!(fast_record.error_message(), None);
    assert_eq!(doomed_record.error_message(), Some("doomed"));

    // Two independent rows with their own metadata.
    let fast_metadata = harness
        .store
        .find_metadata(fast.task_id())
        .await
        .expect("lookup should succeed")
        .expect("metadata should exist");
    let doomed_metadata = harness
        .store
        .find_metadata(doomed.task_id())
        .await
        .expect("lookup should succeed")
        .expect("metadata should exist");
    assert_eq!(fast_metadata.initiated_by(), fast.initiated_by());
    assert_eq!(doomed_metadata.initiated_by(), doomed.initiated_by());

    harness.shutdown().await;
}
