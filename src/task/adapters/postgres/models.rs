//! Diesel row models for task record persistence.

use super::schema::{task_metadata, tasks};
use crate::task::{
    domain::{
        ActorId, MessageId, PersistedMetadata, PersistedRecord, TaskId, TaskMetadata, TaskRecord,
        TaskStatus,
    },
    ports::{TaskStoreError, TaskStoreResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaskRow {
    /// External task identifier.
    pub task_id: uuid::Uuid,
    /// First-delivery message identifier.
    pub message_id: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Redelivery count.
    pub retry_count: i32,
    /// Processing duration in seconds.
    pub processing_time_seconds: Option<f64>,
    /// Failure reason.
    pub error_message: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub(crate) struct NewTaskRow {
    /// External task identifier.
    pub task_id: uuid::Uuid,
    /// First-delivery message identifier.
    pub message_id: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Redelivery count.
    pub retry_count: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for task metadata.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_metadata)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaskMetadataRow {
    /// External task identifier.
    pub task_id: uuid::Uuid,
    /// Initiating actor.
    pub initiated_by: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task metadata.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_metadata)]
pub(crate) struct NewTaskMetadataRow {
    /// External task identifier.
    pub task_id: uuid::Uuid,
    /// Initiating actor.
    pub initiated_by: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Changeset for terminal status updates.
///
/// `None` fields are skipped by Diesel, which keeps an earlier attempt's
/// duration and failure reason in place when a later write omits them.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
pub(super) struct CompletionChangeset {
    /// New lifecycle status.
    pub status: String,
    /// Processing duration in seconds, when measured.
    pub processing_time_seconds: Option<f64>,
    /// Failure reason, when the attempt failed.
    pub error_message: Option<String>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Maps a queried row into the domain record.
pub(crate) fn row_to_record(row: TaskRow) -> TaskStoreResult<TaskRecord> {
    let TaskRow {
        task_id,
        message_id,
        status: persisted_status,
        retry_count,
        processing_time_seconds,
        error_message,
        created_at,
        updated_at,
    } = row;

    let status =
        TaskStatus::try_from(persisted_status.as_str()).map_err(TaskStoreError::persistence)?;
    let retry_count = u32::try_from(retry_count).map_err(TaskStoreError::persistence)?;

    Ok(TaskRecord::from_persisted(PersistedRecord {
        task_id: TaskId::from_uuid(task_id),
        message_id: message_id.map(MessageId::new),
        status,
        retry_count,
        processing_time_seconds,
        error_message,
        created_at,
        updated_at,
    }))
}

/// Maps a queried metadata row into the domain type.
pub(crate) fn metadata_row_to_domain(row: TaskMetadataRow) -> TaskMetadata {
    let TaskMetadataRow {
        task_id,
        initiated_by,
        created_at,
        updated_at,
    } = row;

    TaskMetadata::from_persisted(PersistedMetadata {
        task_id: TaskId::from_uuid(task_id),
        initiated_by: ActorId::from_uuid(initiated_by),
        created_at,
        updated_at,
    })
}

/// Builds the insert rows for a task sighted for the first time.
pub(crate) fn new_record_rows(
    record: &TaskRecord,
    initiated_by: ActorId,
) -> TaskStoreResult<(NewTaskRow, NewTaskMetadataRow)> {
    let retry_count = i32::try_from(record.retry_count()).map_err(TaskStoreError::persistence)?;

    let task_row = NewTaskRow {
        task_id: record.task_id().into_inner(),
        message_id: record.message_id().map(|id| id.as_str().to_owned()),
        status: record.status().as_str().to_owned(),
        retry_count,
        created_at: record.created_at(),
        updated_at: record.updated_at(),
    };
    let metadata_row = NewTaskMetadataRow {
        task_id: record.task_id().into_inner(),
        initiated_by: initiated_by.into_inner(),
        created_at: record.created_at(),
        updated_at: record.updated_at(),
    };
    Ok((task_row, metadata_row))
}
