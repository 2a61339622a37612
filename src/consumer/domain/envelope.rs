//! Message envelope and typed payload.

use super::PayloadError;
use crate::task::domain::{ActorId, MessageId, TaskId};
use serde::{Deserialize, Serialize};

/// One delivery as handed over by the transport: a transport-assigned
/// message identifier plus the raw payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    message_id: MessageId,
    body: Vec<u8>,
}

impl Envelope {
    /// Wraps a delivered message.
    #[must_use]
    pub fn new(message_id: MessageId, body: impl Into<Vec<u8>>) -> Self {
        Self {
            message_id,
            body: body.into(),
        }
    }

    /// Returns the transport-assigned message identifier.
    #[must_use]
    pub const fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    /// Returns the raw payload bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decodes the payload into its typed form.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Malformed`] when the body is not the
    /// expected JSON document. A malformed body is a precondition
    /// violation: the delivery is rejected before any storage is touched.
    pub fn payload(&self) -> Result<TaskPayload, PayloadError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Typed message payload: the task being requested and who asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    task_id: TaskId,
    initiated_by: ActorId,
}

impl TaskPayload {
    /// Creates a payload, mainly for publishers and tests.
    #[must_use]
    pub const fn new(task_id: TaskId, initiated_by: ActorId) -> Self {
        Self {
            task_id,
            initiated_by,
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
}
