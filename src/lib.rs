// Core layer - actors, configuration and the dispatch error taxonomy
pub mod core;

// Features layer - scheduling, execution locks and cooldowns
pub mod features;

// Application layer - routes, matching, guards and the command registry
pub mod commands;

pub use crate::core::{Actor, ActorId, ActorKind, CommandInfo, Config, DispatchError, TargetKind};

pub use crate::commands::{
    CommandExecutor, CommandRegistration, CommandRegistry, DispatchOutcome, ExecutorHooks,
    Invocation, Param, Route, RoutingConfig, SuggestionProviders, UsageHelp,
};

pub use crate::features::{ManualScheduler, TaskScheduler, TokioScheduler};
