//! Domain model for task lifecycle records.
//!
//! The task domain models the ledger entry kept per logical unit of work:
//! its identifiers, its status state machine, and the metadata captured at
//! first creation, while keeping all infrastructure concerns outside of
//! the domain boundary.

mod error;
mod ids;
mod record;
mod status;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{ActorId, MessageId, TaskId};
pub use record::{PersistedMetadata, PersistedRecord, TaskMetadata, TaskRecord};
pub use status::TaskStatus;
