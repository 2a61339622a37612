//! Processing outcome of one delivery.

use crate::task::domain::TaskStatus;

/// Result of running the business handler for one delivery.
///
/// The interceptor records the outcome and passes it through unchanged;
/// the transport decides acknowledgement or redelivery from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The handler finished without error.
    Success,
    /// The handler failed; the reason becomes the task's error message.
    Failure {
        /// Human-readable failure reason.
        reason: String,
    },
}

impl Outcome {
    /// Creates a failure outcome.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`Self::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Maps the outcome onto the terminal task status it records.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        match self {
            Self::Success => TaskStatus::Done,
            Self::Failure { .. } => TaskStatus::Failed,
        }
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failure { reason } => Some(reason),
        }
    }
}
