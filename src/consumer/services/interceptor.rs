//! Lifecycle interceptor: task bookkeeping around an opaque handler.
//!
//! The interceptor does none of the business work itself. On receipt it
//! resolves (or creates) the task record and starts a timer; on completion
//! it writes the terminal status with the measured duration and hands the
//! outcome back unchanged. All per-invocation state lives in the
//! [`Receipt`] value, so any number of deliveries may be in flight on one
//! interceptor concurrently.

use crate::consumer::domain::{Envelope, Outcome, TaskPayload};
use crate::task::{
    domain::{MessageId, TaskId},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};
use std::sync::Arc;
use std::time::Instant;

/// Invocation-scoped state carried from receipt to completion.
///
/// Obtained from [`LifecycleInterceptor::on_receive`] and consumed by
/// [`LifecycleInterceptor::on_complete`]; never shared across deliveries.
#[derive(Debug)]
pub struct Receipt {
    task_id: TaskId,
    message_id: MessageId,
    started: Instant,
}

impl Receipt {
    /// Returns the task this invocation is processing.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the delivery's message identifier.
    #[must_use]
    pub const fn message_id(&self) -> &MessageId {
        &self.message_id
    }
}

/// Cross-cutting wrapper around message processing.
#[derive(Debug)]
pub struct LifecycleInterceptor<S> {
    store: Arc<S>,
}

// Not derived: cloning must not demand `S: Clone`, only the shared handle.
impl<S> Clone for LifecycleInterceptor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> LifecycleInterceptor<S>
where
    S: TaskStore,
{
    /// Creates an interceptor writing through the given store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Receipt hook: registers the sighting and starts the attempt timer.
    ///
    /// The payload is assumed already validated; decoding happens before
    /// this hook so that a malformed message never touches storage.
    ///
    /// # Errors
    ///
    /// Propagates [`TaskStoreError`] from the store; the caller fails the
    /// whole invocation and leaves retrying to the transport.
    pub async fn on_receive(
        &self,
        envelope: &Envelope,
        payload: &TaskPayload,
    ) -> TaskStoreResult<Receipt> {
        let started = Instant::now();
        let task_id = payload.task_id();
        let message_id = envelope.message_id().clone();

        let (record, is_new) = self
            .store
            .resolve_or_create(task_id, Some(message_id.clone()), payload.initiated_by())
            .await?;

        if is_new {
            tracing::info!(
                task_id = %task_id,
                message_id = %message_id,
                initiated_by = %payload.initiated_by(),
                "created task"
            );
        } else {
            tracing::info!(
                task_id = %task_id,
                message_id = %message_id,
                retry = record.retry_count(),
                "resumed task"
            );
        }

        Ok(Receipt {
            task_id,
            message_id,
            started,
        })
    }

    /// Completion hook: stops the timer and records the terminal status.
    ///
    /// A completion for a task the store has never seen is an anomaly, not
    /// a failure: it is logged at error level and swallowed so the
    /// processing outcome still reaches the transport unchanged.
    ///
    /// # Errors
    ///
    /// Propagates [`TaskStoreError`] other than the not-found anomaly.
    pub async fn on_complete(&self, receipt: Receipt, outcome: &Outcome) -> TaskStoreResult<()> {
        let Receipt {
            task_id,
            message_id,
            started,
        } = receipt;
        let seconds = started.elapsed().as_secs_f64();
        let status = outcome.status();

        let updated = self
            .store
            .update_status(
                task_id,
                status,
                Some(seconds),
                outcome.error_message().map(ToOwned::to_owned),
            )
            .await;

        match updated {
            Ok(_) => {
                if let Some(reason) = outcome.error_message() {
                    tracing::error!(
                        task_id = %task_id,
                        message_id = %message_id,
                        seconds,
                        reason,
                        "task failed"
                    );
                } else {
                    tracing::info!(
                        task_id = %task_id,
                        message_id = %message_id,
                        seconds,
                        "task completed"
                    );
                }
                Ok(())
            }
            Err(TaskStoreError::NotFound(_)) => {
                tracing::error!(
                    task_id = %task_id,
                    message_id = %message_id,
                    "completion for unknown task; status not recorded"
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
