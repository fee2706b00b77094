//! Guard pipeline
//!
//! Ordered, short-circuiting admission checks run before a handler is bound
//! and scheduled. Order is fixed: sender kind, permission, operator,
//! execution lock, cooldown.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Executor-level permission applies when the route declares none
//! - 1.0.0: Initial pipeline

use log::debug;

use super::handler::RouteMeta;
use crate::core::{Actor, ActorKind, CheckResult, DispatchError, TargetKind};
use crate::features::{CooldownTracker, ExecutionLocks};

/// Executor-wide defaults that routes may override
#[derive(Debug, Clone, Default)]
pub struct ExecutorMeta {
    pub permission: Option<String>,
    pub require_op: Option<bool>,
    pub target: Option<TargetKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    SenderKind,
    Permission,
    Operator,
    ExecutionLock,
    Cooldown,
}

/// Everything a guard may look at
pub struct GuardContext<'a> {
    pub actor: &'a dyn Actor,
    pub pattern: &'a str,
    pub route: &'a RouteMeta,
    pub executor: &'a ExecutorMeta,
    pub locks: &'a ExecutionLocks,
    pub cooldowns: &'a CooldownTracker,
}

type GuardFn = fn(&GuardContext<'_>) -> Result<(), DispatchError>;

const PIPELINE: [(GuardKind, GuardFn); 5] = [
    (GuardKind::SenderKind, check_sender_kind),
    (GuardKind::Permission, check_permission),
    (GuardKind::Operator, check_operator),
    (GuardKind::ExecutionLock, check_lock),
    (GuardKind::Cooldown, check_cooldown),
];

impl GuardContext<'_> {
    /// Run every guard in order, stopping at the first denial
    pub fn admit(&self) -> Result<(), (GuardKind, DispatchError)> {
        for (kind, guard) in PIPELINE {
            if let Err(err) = guard(self) {
                debug!(
                    "Guard {kind:?} denied '{}' for {}: {err}",
                    self.pattern,
                    self.actor.name()
                );
                return Err((kind, err));
            }
        }
        Ok(())
    }

    /// Run a single guard as a plain check result
    pub fn check(&self, kind: GuardKind) -> CheckResult {
        let guard = PIPELINE
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, guard)| *guard);
        match guard.map(|g| g(self)) {
            Some(Err(err)) => CheckResult::denied(err.to_string()),
            _ => CheckResult::Admitted,
        }
    }
}

/// Permission and operator checks only, as used for completions
pub fn admits_listing(actor: &dyn Actor, route: &RouteMeta, executor: &ExecutorMeta) -> bool {
    permission_denial(actor, route, executor).is_none()
        && operator_denial(actor, route, executor).is_none()
}

fn check_sender_kind(ctx: &GuardContext<'_>) -> Result<(), DispatchError> {
    let Some(target) = ctx.route.target.or(ctx.executor.target) else {
        return Ok(());
    };
    let kind = ctx.actor.kind();
    if target.accepts(kind) {
        return Ok(());
    }
    let reason = match kind {
        ActorKind::Console => "This command can only be executed by a user.",
        ActorKind::Interactive => "This command can only be executed by the console.",
    };
    Err(DispatchError::SenderKindRejected(reason.to_string()))
}

fn check_permission(ctx: &GuardContext<'_>) -> Result<(), DispatchError> {
    match permission_denial(ctx.actor, ctx.route, ctx.executor) {
        Some(permission) => Err(DispatchError::PermissionDenied { permission }),
        None => Ok(()),
    }
}

fn check_operator(ctx: &GuardContext<'_>) -> Result<(), DispatchError> {
    match operator_denial(ctx.actor, ctx.route, ctx.executor) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn check_lock(ctx: &GuardContext<'_>) -> Result<(), DispatchError> {
    let Some(policy) = ctx.route.single_flight else {
        return Ok(());
    };
    if !policy.applies_to(ctx.actor.kind()) {
        return Ok(());
    }
    if ctx.locks.is_locked(policy.scope, ctx.actor.id(), ctx.pattern) {
        return Err(DispatchError::LockedByPreviousInvocation(policy.scope));
    }
    Ok(())
}

fn check_cooldown(ctx: &GuardContext<'_>) -> Result<(), DispatchError> {
    if ctx.actor.kind().is_interactive() && ctx.cooldowns.is_cooling(ctx.actor.id()) {
        return Err(DispatchError::OnCooldown);
    }
    Ok(())
}

/// Required permission the actor lacks, if any
fn permission_denial(actor: &dyn Actor, route: &RouteMeta, executor: &ExecutorMeta) -> Option<String> {
    let permission = route
        .permission
        .as_deref()
        .or(executor.permission.as_deref())
        .filter(|p| !p.is_empty())?;
    (!actor.has_permission(permission)).then(|| permission.to_string())
}

fn operator_denial(actor: &dyn Actor, route: &RouteMeta, executor: &ExecutorMeta) -> Option<DispatchError> {
    let required = route.require_op.or(executor.require_op).unwrap_or(false);
    (required && !actor.is_operator()).then_some(DispatchError::OperatorRequired)
}
