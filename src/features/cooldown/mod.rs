//! # Cooldown Feature
//!
//! Timed suppression window after a successful invocation, scoped per actor.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod tracker;

pub use tracker::{CooldownEntry, CooldownTracker};
