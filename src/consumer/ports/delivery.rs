//! Transport seam: leasing deliveries and reporting their fate.

use crate::consumer::domain::Envelope;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// One leased delivery.
///
/// Exactly one of [`Delivery::ack`], [`Delivery::requeue`], or
/// [`Delivery::reject`] consumes the lease; the transport's redelivery
/// policy acts on that report.
#[async_trait]
pub trait Delivery: Send {
    /// Returns the delivered envelope.
    fn envelope(&self) -> &Envelope;

    /// Acknowledges successful processing.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Closed`] when the transport is gone.
    async fn ack(self: Box<Self>) -> DeliveryResult<()>;

    /// Returns the delivery for another attempt.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Closed`] when the transport is gone.
    async fn requeue(self: Box<Self>) -> DeliveryResult<()>;

    /// Drops the delivery without retry (precondition violations).
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Closed`] when the transport is gone.
    async fn reject(self: Box<Self>) -> DeliveryResult<()>;
}

/// Source of inbound deliveries.
#[async_trait]
pub trait DeliverySource: Send + Sync {
    /// Waits for the next delivery.
    ///
    /// Returns `None` when the source is closed and drained; consumers
    /// treat that as a shutdown signal.
    async fn lease(&self) -> Option<Box<dyn Delivery>>;
}

/// Errors returned by delivery implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The transport channel is closed.
    #[error("delivery channel closed")]
    Closed,
}
