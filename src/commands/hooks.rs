//! Executor extension hooks
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use crate::core::{Actor, CommandInfo, DispatchError};

use super::suggest::SuggestContext;

/// Presentation hooks an executor calls back into
///
/// Only `handle_help` is required. Every error hook defaults to sending the
/// rendered message to the actor.
pub trait ExecutorHooks: Send + Sync {
    /// Called for the help keyword and for lines no pattern matches
    fn handle_help(&self, actor: &dyn Actor, command: &CommandInfo, usage: &[String]);

    fn handle_parameter_error(&self, actor: &dyn Actor, message: &str) {
        actor.send_message(message);
    }

    fn handle_sender_error(&self, actor: &dyn Actor, message: &str) {
        actor.send_message(message);
    }

    fn handle_permission_error(&self, actor: &dyn Actor, message: &str) {
        actor.send_message(message);
    }

    fn handle_operator_error(&self, actor: &dyn Actor, message: &str) {
        actor.send_message(message);
    }

    fn handle_lock_error(&self, actor: &dyn Actor, message: &str) {
        actor.send_message(message);
    }

    fn handle_cooldown_error(&self, actor: &dyn Actor, message: &str) {
        actor.send_message(message);
    }

    fn handle_bind_error(&self, actor: &dyn Actor, message: &str) {
        actor.send_message(message);
    }

    /// Replace the built-in completion resolver when `Some`
    fn suggest(&self, _ctx: &SuggestContext<'_>) -> Option<Vec<String>> {
        None
    }
}

/// Route a rejection to the hook for its category
pub fn report(hooks: &dyn ExecutorHooks, actor: &dyn Actor, err: &DispatchError) {
    let message = err.to_string();
    match err {
        DispatchError::MissingParameters { .. } | DispatchError::ArgumentMismatch { .. } => {
            hooks.handle_parameter_error(actor, &message)
        }
        DispatchError::SenderKindRejected(_) => hooks.handle_sender_error(actor, &message),
        DispatchError::PermissionDenied { .. } => hooks.handle_permission_error(actor, &message),
        DispatchError::OperatorRequired => hooks.handle_operator_error(actor, &message),
        DispatchError::LockedByPreviousInvocation(_) => hooks.handle_lock_error(actor, &message),
        DispatchError::OnCooldown => hooks.handle_cooldown_error(actor, &message),
        DispatchError::Bind(_) => hooks.handle_bind_error(actor, &message),
    }
}

/// Stock hooks that answer help with one usage line per pattern
#[derive(Debug, Clone, Default)]
pub struct UsageHelp {
    header: Option<String>,
}

impl UsageHelp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
        }
    }
}

impl ExecutorHooks for UsageHelp {
    fn handle_help(&self, actor: &dyn Actor, command: &CommandInfo, usage: &[String]) {
        if let Some(header) = &self.header {
            actor.send_message(header);
        }
        for pattern in usage {
            if pattern.is_empty() {
                actor.send_message(&format!("/{}", command.label));
            } else {
                actor.send_message(&format!("/{} {pattern}", command.label));
            }
        }
    }
}
