//! Thread-safe in-memory implementation of the task store port.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{ActorId, MessageId, TaskId, TaskMetadata, TaskRecord, TaskStatus},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};

/// In-memory task store.
///
/// The whole of `resolve_or_create` runs under one write lock, which makes
/// the get-or-create race atomic the same way the relational adapter's
/// unique key does.
#[derive(Debug, Clone)]
pub struct InMemoryTaskStore<C = DefaultClock> {
    state: Arc<RwLock<StoreState>>,
    clock: Arc<C>,
}

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<TaskId, TaskRecord>,
    metadata: HashMap<TaskId, TaskMetadata>,
    closed: bool,
}

impl InMemoryTaskStore<DefaultClock> {
    /// Creates an empty store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryTaskStore<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty store on the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            clock,
        }
    }

    fn write_state(&self) -> TaskStoreResult<std::sync::RwLockWriteGuard<'_, StoreState>> {
        let state = self
            .state
            .write()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))?;
        ensure_open(&state)?;
        Ok(state)
    }

    fn read_state(&self) -> TaskStoreResult<std::sync::RwLockReadGuard<'_, StoreState>> {
        let state = self
            .state
            .read()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))?;
        ensure_open(&state)?;
        Ok(state)
    }
}

fn ensure_open(state: &StoreState) -> TaskStoreResult<()> {
    if state.closed {
        return Err(TaskStoreError::persistence(std::io::Error::other(
            "task store is closed",
        )));
    }
    Ok(())
}

#[async_trait]
impl<C> TaskStore for InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    async fn resolve_or_create(
        &self,
        task_id: TaskId,
        message_id: Option<MessageId>,
        initiated_by: ActorId,
    ) -> TaskStoreResult<(TaskRecord, bool)> {
        let mut state = self.write_state()?;

        if let Some(record) = state.records.get_mut(&task_id) {
            record.register_redelivery(&*self.clock);
            return Ok((record.clone(), false));
        }

        let record = TaskRecord::new_from_delivery(task_id, message_id, &*self.clock);
        let metadata = TaskMetadata::new(task_id, initiated_by, &*self.clock);
        state.records.insert(task_id, record.clone());
        state.metadata.insert(task_id, metadata);
        Ok((record, true))
    }

    async fn update_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        processing_time_seconds: Option<f64>,
        error_message: Option<String>,
    ) -> TaskStoreResult<TaskRecord> {
        let mut state = self.write_state()?;

        let record = state
            .records
            .get_mut(&task_id)
            .ok_or(TaskStoreError::NotFound(task_id))?;
        record.record_completion(status, processing_time_seconds, error_message, &*self.clock)?;
        Ok(record.clone())
    }

    async fn find_by_id(&self, task_id: TaskId) -> TaskStoreResult<Option<TaskRecord>> {
        let state = self.read_state()?;
        Ok(state.records.get(&task_id).cloned())
    }

    async fn find_metadata(&self, task_id: TaskId) -> TaskStoreResult<Option<TaskMetadata>> {
        let state = self.read_state()?;
        Ok(state.metadata.get(&task_id).cloned())
    }

    async fn close(&self) -> TaskStoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))?;
        state.closed = true;
        Ok(())
    }
}
