//! Task ledger aggregates: the per-task status record and its metadata row.

use super::{ActorId, MessageId, TaskDomainError, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Durable status record kept per logical task.
///
/// Created on first sighting of a task identifier and mutated on every
/// subsequent sighting (retry registration) and completion (terminal
/// status, processing time, failure reason). Never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    task_id: TaskId,
    message_id: Option<MessageId>,
    status: TaskStatus,
    retry_count: u32,
    processing_time_seconds: Option<f64>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task record.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecord {
    /// Persisted task identifier.
    pub task_id: TaskId,
    /// Persisted first-delivery message identifier, if any.
    pub message_id: Option<MessageId>,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted redelivery count.
    pub retry_count: u32,
    /// Persisted processing duration of the latest terminal attempt.
    pub processing_time_seconds: Option<f64>,
    /// Persisted failure reason of the latest failed attempt.
    pub error_message: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Creates the record for a task sighted for the first time.
    ///
    /// The record starts in [`TaskStatus::InProgress`] with a zero retry
    /// count; `message_id` captures the delivery that created it.
    #[must_use]
    pub fn new_from_delivery(
        task_id: TaskId,
        message_id: Option<MessageId>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            task_id,
            message_id,
            status: TaskStatus::InProgress,
            retry_count: 0,
            processing_time_seconds: None,
            error_message: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRecord) -> Self {
        let PersistedRecord {
            task_id,
            message_id,
            status,
            retry_count,
            processing_time_seconds,
            error_message,
            created_at,
            updated_at,
        } = data;
        Self {
            task_id,
            message_id,
            status,
            retry_count,
            processing_time_seconds,
            error_message,
            created_at,
            updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the message identifier of the delivery that created the
    /// record, if captured.
    #[must_use]
    pub const fn message_id(&self) -> Option<&MessageId> {
        self.message_id.as_ref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns how many times the task has been redelivered.
    ///
    /// Equals the number of sightings minus one.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns the processing duration of the latest terminal attempt.
    #[must_use]
    pub const fn processing_time_seconds(&self) -> Option<f64> {
        self.processing_time_seconds
    }

    /// Returns the failure reason of the latest failed attempt.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Registers a redelivery of an already-known task.
    ///
    /// Increments the retry count and re-enters [`TaskStatus::InProgress`]
    /// from whatever status the previous attempt left behind; terminal
    /// statuses are not sticky across redeliveries. The previous attempt's
    /// processing time and failure reason stay in place until the new
    /// attempt completes.
    pub fn register_redelivery(&mut self, clock: &impl Clock) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.status = TaskStatus::InProgress;
        self.touch(clock);
    }

    /// Records the outcome of a processing attempt.
    ///
    /// Overwrites the status, and the processing time and failure reason
    /// where supplied. A record already in a terminal status accepts the
    /// overwrite: under concurrent redelivery two attempts may complete out
    /// of order and the last write wins.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NonTerminalCompletion`] when `status` is
    /// not terminal; re-entering [`TaskStatus::InProgress`] is the
    /// redelivery path, not a completion.
    pub fn record_completion(
        &mut self,
        status: TaskStatus,
        processing_time_seconds: Option<f64>,
        error_message: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let permitted = self.status.can_transition_to(status)
            || (self.status.is_terminal() && status.is_terminal());
        if !permitted {
            return Err(TaskDomainError::NonTerminalCompletion {
                task_id: self.task_id,
                status,
            });
        }

        self.status = status;
        if let Some(seconds) = processing_time_seconds {
            self.processing_time_seconds = Some(seconds);
        }
        if let Some(reason) = error_message {
            self.error_message = Some(reason);
        }
        self.touch(clock);
        Ok(())
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

/// Origin metadata captured once, at a task's first creation.
///
/// Redeliveries never touch this row; it stays 1:1 with [`TaskRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    task_id: TaskId,
    initiated_by: ActorId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted task metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMetadata {
    /// Persisted task identifier.
    pub task_id: TaskId,
    /// Persisted initiating actor.
    pub initiated_by: ActorId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TaskMetadata {
    /// Captures the metadata delivered with a task's first sighting.
    #[must_use]
    pub fn new(task_id: TaskId, initiated_by: ActorId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            task_id,
            initiated_by,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs metadata from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMetadata) -> Self {
        let PersistedMetadata {
            task_id,
            initiated_by,
            created_at,
            updated_at,
        } = data;
        Self {
            task_id,
            initiated_by,
            created_at,
            updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the initiating actor.
    #[must_use]
    pub const fn initiated_by(&self) -> ActorId {
        self.initiated_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
