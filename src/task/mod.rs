//! Task record store for Conveyor.
//!
//! Every inbound queue message names a logical task; this module owns the
//! durable, idempotent record of that task's lifecycle: creation on first
//! sighting, retry counting across redeliveries, and terminal status with
//! processing time and failure reason. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
