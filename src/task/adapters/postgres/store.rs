//! `PostgreSQL` implementation of the task store port.

use super::models::{
    CompletionChangeset, TaskMetadataRow, TaskRow, metadata_row_to_domain, new_record_rows,
    row_to_record,
};
use super::schema::{task_metadata, tasks};
use crate::task::{
    domain::{ActorId, MessageId, TaskDomainError, TaskId, TaskMetadata, TaskRecord, TaskStatus},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task store.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore<C = DefaultClock> {
    pool: TaskPgPool,
    clock: Arc<C>,
}

impl PostgresTaskStore<DefaultClock> {
    /// Creates a store on the system clock from a connection pool.
    #[must_use]
    pub fn new(pool: TaskPgPool) -> Self {
        Self::with_clock(pool, Arc::new(DefaultClock))
    }
}

impl<C> PostgresTaskStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a store on the given clock from a connection pool.
    #[must_use]
    pub const fn with_clock(pool: TaskPgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

#[async_trait]
impl<C> TaskStore for PostgresTaskStore<C>
where
    C: Clock + Send + Sync,
{
    async fn resolve_or_create(
        &self,
        task_id: TaskId,
        message_id: Option<MessageId>,
        initiated_by: ActorId,
    ) -> TaskStoreResult<(TaskRecord, bool)> {
        let record = TaskRecord::new_from_delivery(task_id, message_id, &*self.clock);
        let (task_row, metadata_row) = new_record_rows(&record, initiated_by)?;
        let now = record.updated_at();

        self.run_blocking(move |connection| {
            // Fast path: the task is already known and this is a redelivery.
            if let Some(row) = register_redelivery(connection, task_id, now)? {
                return Ok((row_to_record(row)?, false));
            }

            let inserted = connection.transaction::<TaskRow, DieselError, _>(|txn| {
                let row = diesel::insert_into(tasks::table)
                    .values(&task_row)
                    .get_result::<TaskRow>(txn)?;
                diesel::insert_into(task_metadata::table)
                    .values(&metadata_row)
                    .execute(txn)?;
                Ok(row)
            });

            match inserted {
                Ok(row) => Ok((row_to_record(row)?, true)),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    // Lost the create race to a concurrent delivery of the
                    // same task; proceed as a redelivery.
                    let row = register_redelivery(connection, task_id, now)?
                        .ok_or(TaskStoreError::NotFound(task_id))?;
                    Ok((row_to_record(row)?, false))
                }
                Err(err) => Err(TaskStoreError::persistence(err)),
            }
        })
        .await
    }

    async fn update_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        processing_time_seconds: Option<f64>,
        error_message: Option<String>,
    ) -> TaskStoreResult<TaskRecord> {
        if !status.is_terminal() {
            return Err(TaskStoreError::Domain(
                TaskDomainError::NonTerminalCompletion { task_id, status },
            ));
        }

        let changeset = CompletionChangeset {
            status: status.as_str().to_owned(),
            processing_time_seconds,
            error_message,
            updated_at: self.clock.utc(),
        };

        self.run_blocking(move |connection| {
            let row = diesel::update(tasks::table.filter(tasks::task_id.eq(task_id.into_inner())))
                .set(&changeset)
                .get_result::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?
                .ok_or(TaskStoreError::NotFound(task_id))?;
            row_to_record(row)
        })
        .await
    }

    async fn find_by_id(&self, task_id: TaskId) -> TaskStoreResult<Option<TaskRecord>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::task_id.eq(task_id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_record).transpose()
        })
        .await
    }

    async fn find_metadata(&self, task_id: TaskId) -> TaskStoreResult<Option<TaskMetadata>> {
        self.run_blocking(move |connection| {
            let row = task_metadata::table
                .filter(task_metadata::task_id.eq(task_id.into_inner()))
                .select(TaskMetadataRow::as_select())
                .first::<TaskMetadataRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            Ok(row.map(metadata_row_to_domain))
        })
        .await
    }

    async fn close(&self) -> TaskStoreResult<()> {
        // r2d2 tears the connections down when the last pool handle drops;
        // nothing to flush here.
        Ok(())
    }
}

/// Atomically increments the retry count and resets the status of an
/// existing row. Returns `None` when the task is not yet known.
fn register_redelivery(
    connection: &mut PgConnection,
    task_id: TaskId,
    now: DateTime<Utc>,
) -> TaskStoreResult<Option<TaskRow>> {
    diesel::update(tasks::table.filter(tasks::task_id.eq(task_id.into_inner())))
        .set((
            tasks::retry_count.eq(tasks::retry_count + 1),
            tasks::status.eq(TaskStatus::InProgress.as_str()),
            tasks::updated_at.eq(now),
        ))
        .get_result::<TaskRow>(connection)
        .optional()
        .map_err(TaskStoreError::persistence)
}
