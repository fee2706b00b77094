//! # Core Module
//!
//! Core domain types, configuration, and error handling for the dispatcher.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add actor abstraction and dispatch error taxonomy
//! - 1.0.0: Initial creation with config module

pub mod actor;
pub mod config;
pub mod error;

// Re-export commonly used items
pub use actor::{Actor, ActorId, ActorKind, CommandInfo, ConsoleActor, TargetKind};
pub use config::Config;
pub use error::{BindError, CheckResult, DispatchError, LockScope};
