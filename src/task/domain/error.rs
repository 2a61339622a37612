//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while mutating domain task records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// A completion write carried a non-terminal status.
    #[error("task {task_id} cannot complete with non-terminal status '{status}'")]
    NonTerminalCompletion {
        /// The task the write targeted.
        task_id: TaskId,
        /// The rejected status.
        status: TaskStatus,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
