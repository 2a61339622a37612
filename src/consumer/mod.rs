//! Message consumption for Conveyor.
//!
//! This module owns everything between the transport and the task store:
//! the message envelope and its typed payload, the lifecycle interceptor
//! that brackets each handler invocation with bookkeeping writes, and the
//! worker loop that leases deliveries and acknowledges them according to
//! the processing outcome. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
