//! # Feature: Scheduling
//!
//! Primary, background and periodic execution for dispatched handlers.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add ManualScheduler for deterministic hosts and tests
//! - 1.0.0: Initial tokio scheduler

pub mod manual;
pub mod scheduler;

pub use manual::ManualScheduler;
pub use scheduler::{Repeat, RepeatingTask, Task, TaskScheduler, TokioScheduler};
