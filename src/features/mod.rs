//! # Features Layer
//!
//! Runtime services the dispatcher leans on: scheduling, execution locks and
//! cooldowns.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Add execution_lock
//! - 1.1.0: Add scheduling
//! - 1.0.0: Initial cooldown feature

pub mod cooldown;
pub mod execution_lock;
pub mod scheduling;

pub use cooldown::{CooldownEntry, CooldownTracker};
pub use execution_lock::{ExecutionLocks, LockGuard};
pub use scheduling::{ManualScheduler, Repeat, TaskScheduler, TokioScheduler};
