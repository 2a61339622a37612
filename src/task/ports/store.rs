//! Store port for durable, idempotent task record persistence.

use crate::task::domain::{
    ActorId, MessageId, TaskDomainError, TaskId, TaskMetadata, TaskRecord, TaskStatus,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Task record persistence contract.
///
/// Implementations must be safe under concurrent use by multiple in-flight
/// deliveries; each operation is its own atomic unit and no transaction
/// spans the business handler's execution.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Resolves the record for `task_id`, creating it on first sighting.
    ///
    /// An existing record gets its retry count incremented and its status
    /// reset to [`TaskStatus::InProgress`], returning `(record, false)`. An
    /// unknown identifier creates the record together with its
    /// [`TaskMetadata`] as one atomic unit, returning `(record, true)`.
    ///
    /// Two concurrent calls for one unseen `task_id` must yield exactly one
    /// row: the store enforces uniqueness on the identifier and converts a
    /// lost create race into the increment path. Processing of one task is
    /// deliberately not serialised beyond that — a redelivery that lands
    /// while a prior attempt is still in flight resets the record, and the
    /// later completion write wins.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the underlying storage
    /// fails for any reason other than the absorbed duplicate-create race.
    async fn resolve_or_create(
        &self,
        task_id: TaskId,
        message_id: Option<MessageId>,
        initiated_by: ActorId,
    ) -> TaskStoreResult<(TaskRecord, bool)>;

    /// Writes the terminal outcome of a processing attempt.
    ///
    /// Overwrites the status; `processing_time_seconds` and `error_message`
    /// are overwritten only where supplied, so a successful completion
    /// leaves an earlier attempt's failure reason untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when no record exists for
    /// `task_id` — a completion without a prior creation is an anomaly the
    /// caller logs and survives. Returns [`TaskStoreError::Domain`] when
    /// `status` is not terminal, and [`TaskStoreError::Persistence`] on
    /// storage failure.
    async fn update_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        processing_time_seconds: Option<f64>,
        error_message: Option<String>,
    ) -> TaskStoreResult<TaskRecord>;

    /// Finds a task record by its identifier.
    ///
    /// Returns `None` when the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] on storage failure.
    async fn find_by_id(&self, task_id: TaskId) -> TaskStoreResult<Option<TaskRecord>>;

    /// Finds the metadata captured at a task's first creation.
    ///
    /// Returns `None` when no metadata exists for the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] on storage failure.
    async fn find_metadata(&self, task_id: TaskId) -> TaskStoreResult<Option<TaskMetadata>>;

    /// Releases the underlying storage resources.
    ///
    /// Further operations on a closed store fail with
    /// [`TaskStoreError::Persistence`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when teardown fails.
    async fn close(&self) -> TaskStoreResult<()>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// No record exists for the task identifier.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A domain rule rejected the write.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
