//! Adapter implementations of the consumer ports.

pub mod memory;

pub use memory::InMemoryDeliveryQueue;
