//! Orchestration services for message consumption.

pub mod interceptor;
pub mod worker;

pub use interceptor::{LifecycleInterceptor, Receipt};
pub use worker::Worker;
