//! Command executor
//!
//! Owns one command's pattern table and drives every line typed against it:
//! help keyword, pattern match, arity check, guard pipeline, binding, lock and
//! cooldown installation, then scheduling on the primary context or a worker.
//! Every line is reported to the host as handled.
//!
//! - **Version**: 2.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.2.0: Contain handler panics, count the partial tick before a cooldown's first tick
//! - 2.1.0: Observable `DispatchOutcome`, completion hook override
//! - 2.0.0: Builder-declared routes replace name-keyed dispatch
//! - 1.0.0: Initial dispatcher

use anyhow::{bail, Context, Result};
use log::{debug, error, info};
use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use super::binder::bind;
use super::guards::{ExecutorMeta, GuardContext};
use super::handler::{Invocation, Param, Route, RouteHandler};
use super::hooks::{report, ExecutorHooks, UsageHelp};
use super::parsers::ParserRegistry;
use super::pattern::{Pattern, PatternTable};
use super::suggest::{Resolver, SuggestContext, SuggestionProviders};
use crate::core::config::{DEFAULT_COOLDOWN_TICK_MS, DEFAULT_HELP_KEYWORD};
use crate::core::{Actor, CommandInfo, Config, DispatchError, TargetKind};
use crate::features::{
    CooldownTracker, ExecutionLocks, LockGuard, Repeat, TaskScheduler, TokioScheduler,
};

/// What one dispatch attempt ended in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The help hook ran, either for the keyword or an unmatched line
    Help,
    /// The actor was told why nothing ran
    Rejected(DispatchError),
    /// The handler of `pattern` was handed to the scheduler
    Scheduled { pattern: String },
}

impl DispatchOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, DispatchOutcome::Scheduled { .. })
    }
}

pub struct CommandExecutor {
    help_keyword: String,
    meta: ExecutorMeta,
    table: PatternTable,
    routes: Vec<Route>,
    handlers: Vec<RouteHandler>,
    usage: Vec<String>,
    parsers: ParserRegistry,
    providers: SuggestionProviders,
    linked: Vec<Arc<SuggestionProviders>>,
    hooks: Arc<dyn ExecutorHooks>,
    scheduler: Arc<dyn TaskScheduler>,
    locks: Arc<ExecutionLocks>,
    cooldowns: Arc<CooldownTracker>,
    cooldown_tick: Duration,
}

impl CommandExecutor {
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::default()
    }

    /// Host entry point; always claims the line
    pub fn on_command(&self, actor: Arc<dyn Actor>, command: &CommandInfo, tokens: &[String]) -> bool {
        let outcome = self.execute(actor, command, tokens);
        debug!("/{} {} -> {outcome:?}", command.label, tokens.join(" "));
        true
    }

    /// Dispatch one line and report what happened
    pub fn execute(
        &self,
        actor: Arc<dyn Actor>,
        command: &CommandInfo,
        tokens: &[String],
    ) -> DispatchOutcome {
        if tokens.len() == 1 && tokens[0] == self.help_keyword {
            return self.help(actor.as_ref(), command);
        }

        let Some(index) = self.table.find(tokens) else {
            debug!("No pattern of /{} matches {tokens:?}", command.label);
            return self.help(actor.as_ref(), command);
        };
        let (Some(pattern), Some(route), Some(handler)) = (
            self.table.get(index),
            self.routes.get(index),
            self.handlers.get(index),
        ) else {
            return self.help(actor.as_ref(), command);
        };

        let (invocation, lock) = match self.prepare(&actor, command, pattern, route, tokens) {
            Ok(prepared) => prepared,
            Err(err) => {
                debug!(
                    "Rejected '{}' for {}: {}",
                    pattern,
                    actor.name(),
                    err.category()
                );
                report(self.hooks.as_ref(), actor.as_ref(), &err);
                return DispatchOutcome::Rejected(err);
            }
        };

        let handler = Arc::clone(handler);
        let task = Box::new(move || {
            // released when the task finishes, panics included
            let _lock: Option<LockGuard> = lock;
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&invocation))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(
                    "Handler for '{}' failed for {}: {err:#}",
                    invocation.pattern,
                    invocation.actor.name()
                ),
                Err(payload) => error!(
                    "Handler for '{}' panicked for {}: {}",
                    invocation.pattern,
                    invocation.actor.name(),
                    panic_message(payload.as_ref())
                ),
            }
        });

        if route.meta().run_async {
            debug!("Scheduling '{pattern}' on a worker");
            self.scheduler.run_async(task);
        } else {
            self.scheduler.run_now(task);
        }
        DispatchOutcome::Scheduled {
            pattern: pattern.to_string(),
        }
    }

    /// Arity, guards and binding, then lock and cooldown installation
    fn prepare(
        &self,
        actor: &Arc<dyn Actor>,
        command: &CommandInfo,
        pattern: &Pattern,
        route: &Route,
        tokens: &[String],
    ) -> Result<(Invocation, Option<LockGuard>), DispatchError> {
        pattern.check_arity(&command.label, tokens)?;

        GuardContext {
            actor: actor.as_ref(),
            pattern: pattern.as_str(),
            route: route.meta(),
            executor: &self.meta,
            locks: &self.locks,
            cooldowns: &self.cooldowns,
        }
        .admit()
        .map_err(|(_, err)| err)?;

        let captured = pattern.extract(tokens);
        let args = bind(route.params(), &captured, actor, &self.parsers)?;

        let lock = match route.meta().single_flight {
            Some(policy) if policy.applies_to(actor.kind()) => Some(
                self.locks
                    .try_acquire(policy.scope, actor.id(), pattern.as_str())
                    .ok_or(DispatchError::LockedByPreviousInvocation(policy.scope))?,
            ),
            _ => None,
        };

        let cooldown = route.meta().cooldown_secs;
        if cooldown > 0 && actor.kind().is_interactive() {
            self.cooldowns
                .arm(actor.id(), pattern.as_str(), self.cooldown_ticks(cooldown));
        }

        let invocation = Invocation {
            actor: Arc::clone(actor),
            command: command.clone(),
            pattern: pattern.to_string(),
            args,
        };
        Ok((invocation, lock))
    }

    fn help(&self, actor: &dyn Actor, command: &CommandInfo) -> DispatchOutcome {
        self.hooks.handle_help(actor, command, &self.usage);
        DispatchOutcome::Help
    }

    /// Ticks needed to cover `seconds` at the configured tick period
    ///
    /// The shared ticker may fire right after arming, so one tick on top of
    /// the full periods covers the partial period before it.
    fn cooldown_ticks(&self, seconds: u64) -> u64 {
        let tick_ms = (self.cooldown_tick.as_millis() as u64).max(1);
        seconds
            .saturating_mul(1000)
            .div_ceil(tick_ms)
            .saturating_add(1)
    }

    /// Completion candidates, or `None` when completion does not apply
    pub fn on_tab_complete(
        &self,
        actor: &dyn Actor,
        command: &CommandInfo,
        tokens: &[String],
    ) -> Option<Vec<String>> {
        if !actor.kind().is_interactive() || self.meta.target == Some(TargetKind::Console) {
            return None;
        }
        let ctx = SuggestContext {
            actor,
            command,
            tokens,
        };
        if let Some(candidates) = self.hooks.suggest(&ctx) {
            return Some(candidates);
        }
        let resolver = Resolver {
            table: &self.table,
            routes: &self.routes,
            meta: &self.meta,
            own: &self.providers,
            linked: &self.linked,
        };
        Some(resolver.suggest(&ctx))
    }

    pub fn help_keyword(&self) -> &str {
        &self.help_keyword
    }

    /// Normalized patterns in registration order
    pub fn patterns(&self) -> &[String] {
        &self.usage
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub fn locks(&self) -> &ExecutionLocks {
        &self.locks
    }
}

pub struct ExecutorBuilder {
    help_keyword: String,
    meta: ExecutorMeta,
    routes: Vec<Route>,
    parsers: ParserRegistry,
    providers: SuggestionProviders,
    linked: Vec<Arc<SuggestionProviders>>,
    hooks: Option<Arc<dyn ExecutorHooks>>,
    scheduler: Option<Arc<dyn TaskScheduler>>,
    cooldown_tick: Duration,
}

impl Default for ExecutorBuilder {
    fn default() -> Self {
        Self {
            help_keyword: DEFAULT_HELP_KEYWORD.to_string(),
            meta: ExecutorMeta::default(),
            routes: Vec::new(),
            parsers: ParserRegistry::with_builtins(),
            providers: SuggestionProviders::new(),
            linked: Vec::new(),
            hooks: None,
            scheduler: None,
            cooldown_tick: Duration::from_millis(DEFAULT_COOLDOWN_TICK_MS),
        }
    }
}

impl ExecutorBuilder {
    /// Take the help keyword and cooldown tick from `config`
    pub fn config(mut self, config: &Config) -> Self {
        self.help_keyword = config.help_keyword.clone();
        self.cooldown_tick = config.cooldown_tick;
        self
    }

    pub fn help_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.help_keyword = keyword.into();
        self
    }

    /// Permission required by routes that declare none
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        let permission = permission.into();
        self.meta.permission = (!permission.is_empty()).then_some(permission);
        self
    }

    pub fn require_op(mut self, required: bool) -> Self {
        self.meta.require_op = Some(required);
        self
    }

    pub fn target(mut self, target: TargetKind) -> Self {
        self.meta.target = Some(target);
        self
    }

    /// Consult `shared` for provider names this executor does not define
    pub fn suggest_from(mut self, shared: Arc<SuggestionProviders>) -> Self {
        self.linked.push(shared);
        self
    }

    pub fn provider<F, I>(mut self, name: &str, provider: F) -> Self
    where
        F: Fn(&SuggestContext<'_>) -> I + Send + Sync + 'static,
        I: IntoIterator,
        I::Item: ToString,
    {
        self.providers.register(name, provider);
        self
    }

    pub fn parser<T, E, F>(mut self, parse: F) -> Self
    where
        T: Any + Send + Sync,
        E: Display,
        F: Fn(&str) -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        self.parsers.register(parse);
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn hooks(mut self, hooks: impl ExecutorHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    pub fn shared_hooks(mut self, hooks: Arc<dyn ExecutorHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn TaskScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn cooldown_tick(mut self, tick: Duration) -> Self {
        self.cooldown_tick = tick;
        self
    }

    /// Validate every route and start the cooldown ticker
    ///
    /// Without an explicit scheduler the current tokio runtime is used.
    pub fn build(self) -> Result<CommandExecutor> {
        if self.help_keyword.trim().is_empty() {
            bail!("Help keyword must not be empty");
        }
        if self.cooldown_tick.is_zero() {
            bail!("Cooldown tick must be greater than zero");
        }

        let mut patterns = Vec::with_capacity(self.routes.len());
        let mut handlers = Vec::with_capacity(self.routes.len());
        for route in &self.routes {
            let pattern = Pattern::parse(route.pattern())
                .with_context(|| format!("Invalid pattern '{}'", route.pattern()))?;
            let Some(handler) = &route.handler else {
                bail!("Route '{pattern}' has no handler");
            };
            self.validate_params(&pattern, route)?;
            handlers.push(Arc::clone(handler));
            patterns.push(pattern);
        }
        let table = PatternTable::new(patterns)?;
        let usage = table.iter().map(|(_, p)| p.to_string()).collect();

        let scheduler = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::current()?),
        };

        let cooldowns = Arc::new(CooldownTracker::new());
        let ticker = Arc::downgrade(&cooldowns);
        scheduler.run_repeating(
            self.cooldown_tick,
            Box::new(move || match ticker.upgrade() {
                Some(cooldowns) => {
                    cooldowns.tick();
                    Repeat::Continue
                }
                None => Repeat::Stop,
            }),
        );

        info!(
            "Built command executor with {} route(s), help keyword '{}'",
            table.len(),
            self.help_keyword
        );

        Ok(CommandExecutor {
            help_keyword: self.help_keyword,
            meta: self.meta,
            table,
            routes: self.routes,
            handlers,
            usage,
            parsers: self.parsers,
            providers: self.providers,
            linked: self.linked,
            hooks: self.hooks.unwrap_or_else(|| Arc::new(UsageHelp::new())),
            scheduler,
            locks: Arc::new(ExecutionLocks::new()),
            cooldowns,
            cooldown_tick: self.cooldown_tick,
        })
    }

    fn validate_params(&self, pattern: &Pattern, route: &Route) -> Result<()> {
        for param in route.params() {
            let Param::Arg { name, ty, .. } = param else {
                continue;
            };
            if !pattern.placeholder_names().any(|p| p == name) {
                bail!("Route '{pattern}' binds <{name}>, which the pattern does not declare");
            }
            if !self.parsers.supports(ty.id) {
                bail!(
                    "Route '{pattern}' binds <{name}> as {}, which has no parser",
                    ty.name
                );
            }
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
