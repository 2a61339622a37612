//! Port contracts for message consumption.
//!
//! Ports define the seams towards the transport (delivery leasing and
//! acknowledgement) and towards the opaque business handler.

pub mod delivery;
pub mod handler;

pub use delivery::{Delivery, DeliveryError, DeliveryResult, DeliverySource};
pub use handler::{HandlerError, TaskHandler};
