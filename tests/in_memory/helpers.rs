//! Shared harness for the in-memory end-to-end suite.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use conveyor::consumer::adapters::InMemoryDeliveryQueue;
use conveyor::consumer::domain::{Envelope, TaskPayload};
use conveyor::consumer::ports::{HandlerError, TaskHandler};
use conveyor::consumer::services::{LifecycleInterceptor, Worker};
use conveyor::task::adapters::memory::InMemoryTaskStore;
use conveyor::task::domain::{MessageId, TaskId, TaskRecord};
use conveyor::task::ports::TaskStore;
use once_cell::sync::Lazy;
use tokio::sync::Mutex;

static TRACING: Lazy<()> = Lazy::new(conveyor::observability::init);

/// One scripted behaviour for a single handler invocation.
#[derive(Debug, Clone)]
pub enum Step {
    /// Sleep for the duration, then succeed.
    SucceedAfter(Duration),
    /// Fail with the given reason.
    FailWith(&'static str),
}

/// Handler whose behaviour is scripted per task identifier.
///
/// Each invocation pops the next step for the payload's task; a task
/// without remaining steps succeeds immediately.
#[derive(Debug, Default)]
pub struct ScriptedHandler {
    scripts: Mutex<HashMap<TaskId, VecDeque<Step>>>,
}

impl ScriptedHandler {
    /// Queues the steps a task's successive attempts should follow.
    pub async fn script(&self, task_id: TaskId, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .await
            .entry(task_id)
            .or_default()
            .extend(steps);
    }
}

#[async_trait]
impl TaskHandler for ScriptedHandler {
    async fn handle(&self, payload: &TaskPayload) -> Result<(), HandlerError> {
        let step = self
            .scripts
            .lock()
            .await
            .get_mut(&payload.task_id())
            .and_then(VecDeque::pop_front);

        match step {
            Some(Step::SucceedAfter(pause)) => {
                tokio::time::sleep(pause).await;
                Ok(())
            }
            Some(Step::FailWith(reason)) => Err(reason.into()),
            None => Ok(()),
        }
    }
}

/// A running worker over shared in-memory collaborators.
pub struct Harness {
    /// Task record store observed by assertions.
    pub store: Arc<InMemoryTaskStore>,
    /// Queue end used to publish test deliveries.
    pub queue: Arc<InMemoryDeliveryQueue>,
    /// Scripted business handler.
    pub handler: Arc<ScriptedHandler>,
    worker: Worker,
    next_delivery: AtomicU64,
}

impl Harness {
    /// Spawns a worker with the given consumer concurrency.
    pub fn spawn(consumers: usize) -> Self {
        Lazy::force(&TRACING);
        let store = Arc::new(InMemoryTaskStore::new());
        let queue = Arc::new(InMemoryDeliveryQueue::new(3));
        let handler = Arc::new(ScriptedHandler::default());
        let worker = Worker::spawn(
            consumers,
            Arc::clone(&queue),
            LifecycleInterceptor::new(Arc::clone(&store)),
            Arc::clone(&handler),
        );
        Self {
            store,
            queue,
            handler,
            worker,
            next_delivery: AtomicU64::new(1),
        }
    }

    /// Publishes a payload under a fresh transport message identifier.
    pub fn publish(&self, payload: &TaskPayload) {
        let sequence = self.next_delivery.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::to_vec(payload).expect("payload should serialise");
        self.queue
            .publish(Envelope::new(
                MessageId::new(format!("amq.{sequence}")),
                body,
            ))
            .expect("publish should succeed");
    }

    /// Polls the store until the task's record satisfies the predicate.
    pub async fn wait_for(
        &self,
        task_id: TaskId,
        predicate: impl Fn(&TaskRecord) -> bool,
    ) -> TaskRecord {
        for _ in 0..250 {
            let found = self
                .store
                .find_by_id(task_id)
                .await
                .expect("lookup should succeed");
            if let Some(record) = found {
                if predicate(&record) {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("timed out waiting for task {task_id}");
    }

    /// Stops the worker and waits for its loops.
    pub async fn shutdown(self) {
        self.worker.shutdown_and_join().await;
    }
}
