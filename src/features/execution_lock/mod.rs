//! # Execution Lock Feature
//!
//! Single-flight policies that stop an invocation from overlapping a
//! previous one still in flight.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

pub mod table;

pub use table::{ExecutionLocks, LockGuard};
