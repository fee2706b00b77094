//! # Command System
//!
//! Pattern routed command dispatch: routes, matching, binding, guards,
//! completion and the host-facing registry.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Pattern routes, guard pipeline and suggestion resolver
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod binder;
pub mod executor;
pub mod guards;
pub mod handler;
pub mod hooks;
pub mod parsers;
pub mod pattern;
pub mod registry;
pub mod routing;
pub mod suggest;

#[cfg(test)]
pub(crate) mod test_support;

pub use binder::{BoundArgs, BoundValue};
pub use executor::{CommandExecutor, DispatchOutcome, ExecutorBuilder};
pub use guards::{ExecutorMeta, GuardKind};
pub use handler::{Invocation, Param, Route, RouteMeta, SingleFlight, SuggestSource};
pub use hooks::{ExecutorHooks, UsageHelp};
pub use parsers::ParserRegistry;
pub use pattern::{Pattern, PatternTable};
pub use registry::{CommandRegistry, RegistryChange};
pub use routing::{CommandRegistration, RoutingConfig};
pub use suggest::{SuggestContext, SuggestionProviders};
