//! Seam towards the opaque business handler.

use crate::consumer::domain::TaskPayload;
use async_trait::async_trait;

/// Error type surfaced by business handlers.
///
/// Opaque by design; the interceptor records only its display form as the
/// task's failure reason.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Business logic executed once per delivery.
///
/// The worker wraps every invocation with the lifecycle interceptor; a
/// handler neither sees nor touches the task store.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Processes one decoded payload.
    ///
    /// # Errors
    ///
    /// Any error fails the attempt and becomes the task's recorded
    /// failure reason.
    async fn handle(&self, payload: &TaskPayload) -> Result<(), HandlerError>;
}
