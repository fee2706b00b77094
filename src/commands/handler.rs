//! Route declarations
//!
//! A route ties one pattern to one handler closure plus the metadata the
//! guard pipeline and scheduler read: permission, operator flag, allowed actor
//! kind, async marker, cooldown and single-flight policy.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Pattern routes with declared parameters replace name-keyed handlers
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use super::binder::BoundArgs;
use super::parsers::ArgType;
use crate::core::{Actor, ActorKind, CommandInfo, LockScope, TargetKind};

/// Everything a handler receives for one invocation
pub struct Invocation {
    pub actor: Arc<dyn Actor>,
    pub command: CommandInfo,
    /// Pattern of the route being invoked
    pub pattern: String,
    pub args: BoundArgs,
}

pub type RouteHandler = Arc<dyn Fn(&Invocation) -> Result<()> + Send + Sync>;

/// Where completions for a placeholder come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestSource {
    /// Returned verbatim as the only candidate
    Hint(String),
    /// Name of a registered suggestion provider
    Provider(String),
}

/// One declared handler parameter, bound in declaration order
#[derive(Debug, Clone)]
pub enum Param {
    /// Receives the invoking actor when `bind` is set and the kind fits
    Sender {
        bind: bool,
        kind: Option<ActorKind>,
    },
    /// Converted from the placeholder group `name`
    Arg {
        name: String,
        ty: ArgType,
        suggest: Option<SuggestSource>,
    },
    /// Always absent
    Unbound,
}

impl Param {
    pub fn sender() -> Self {
        Param::Sender {
            bind: true,
            kind: None,
        }
    }

    /// Sender slot that is only filled for actors of `kind`
    pub fn sender_of(kind: ActorKind) -> Self {
        Param::Sender {
            bind: true,
            kind: Some(kind),
        }
    }

    pub fn arg<T: 'static>(name: impl Into<String>) -> Self {
        Param::Arg {
            name: name.into(),
            ty: ArgType::of::<T>(),
            suggest: None,
        }
    }

    pub fn unbound() -> Self {
        Param::Unbound
    }

    /// Complete this argument from the provider registered under `name`
    pub fn suggest(self, name: impl Into<String>) -> Self {
        self.with_source(SuggestSource::Provider(name.into()))
    }

    /// Complete this argument with a fixed hint
    pub fn hint(self, text: impl Into<String>) -> Self {
        self.with_source(SuggestSource::Hint(text.into()))
    }

    pub fn arg_name(&self) -> Option<&str> {
        match self {
            Param::Arg { name, .. } => Some(name),
            _ => None,
        }
    }

    fn with_source(self, source: SuggestSource) -> Self {
        match self {
            Param::Arg { name, ty, .. } => Param::Arg {
                name,
                ty,
                suggest: Some(source),
            },
            other => other,
        }
    }
}

/// Single-flight policy of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleFlight {
    pub scope: LockScope,
    /// Console actors are exempt unless this is set
    pub include_console: bool,
}

impl SingleFlight {
    pub fn applies_to(&self, kind: ActorKind) -> bool {
        kind.is_interactive() || self.include_console
    }
}

/// Routing metadata attached to one handler
#[derive(Debug, Clone, Default)]
pub struct RouteMeta {
    pub permission: Option<String>,
    pub require_op: Option<bool>,
    pub target: Option<TargetKind>,
    pub run_async: bool,
    /// Zero disables the cooldown
    pub cooldown_secs: u64,
    pub single_flight: Option<SingleFlight>,
}

/// A pattern, its parameters, its metadata and its handler
#[derive(Clone)]
pub struct Route {
    pub(crate) pattern: String,
    pub(crate) params: Vec<Param>,
    pub(crate) meta: RouteMeta,
    pub(crate) handler: Option<RouteHandler>,
}

impl Route {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            params: Vec::new(),
            meta: RouteMeta::default(),
            handler: None,
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Required permission; an empty string defers to the executor
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

    /// Run the handler on a background worker
    pub fn run_async(mut self) -> Self {
        self.meta.run_async = true;
        self
    }

    pub fn cooldown(mut self, seconds: u64) -> Self {
        self.meta.cooldown_secs = seconds;
        self
    }

    pub fn single_flight(mut self, scope: LockScope) -> Self {
        self.meta.single_flight = Some(SingleFlight {
            scope,
            include_console: false,
        });
        self
    }

    /// Like `single_flight`, but console invocations are locked too
    pub fn single_flight_with_console(mut self, scope: LockScope) -> Self {
        self.meta.single_flight = Some(SingleFlight {
            scope,
            include_console: true,
        });
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn meta(&self) -> &RouteMeta {
        &self.meta
    }

    /// Suggestion source declared for the placeholder `name`
    pub fn suggest_source(&self, name: &str) -> Option<&SuggestSource> {
        self.params.iter().find_map(|param| match param {
            Param::Arg {
                name: arg,
                suggest: Some(source),
                ..
            } if arg == name => Some(source),
            _ => None,
        })
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .field("meta", &self.meta)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_builder_records_meta() {
        let route = Route::new("heal <target>")
            .param(Param::arg::<String>("target").suggest("online_players"))
            .permission("kit.heal")
            .require_op(false)
            .target(TargetKind::Interactive)
            .run_async()
            .cooldown(30)
            .single_flight(LockScope::Sender)
            .handler(|_| Ok(()));

        assert_eq!(route.pattern(), "heal <target>");
        let meta = route.meta();
        assert_eq!(meta.permission.as_deref(), Some("kit.heal"));
        assert_eq!(meta.require_op, Some(false));
        assert_eq!(meta.target, Some(TargetKind::Interactive));
        assert!(meta.run_async);
        assert_eq!(meta.cooldown_secs, 30);
        assert_eq!(
            meta.single_flight,
            Some(SingleFlight {
                scope: LockScope::Sender,
                include_console: false
            })
        );
        assert!(route.handler.is_some());
    }

    #[test]
    fn test_empty_permission_defers() {
        let route = Route::new("list").permission("");
        assert_eq!(route.meta().permission, None);
    }

    #[test]
    fn test_suggest_source_lookup() {
        let route = Route::new("tp <player> <world>")
            .param(Param::arg::<String>("player").suggest("players"))
            .param(Param::arg::<String>("world").hint("<world name>"));

        assert_eq!(
            route.suggest_source("player"),
            Some(&SuggestSource::Provider("players".to_string()))
        );
        assert_eq!(
            route.suggest_source("world"),
            Some(&SuggestSource::Hint("<world name>".to_string()))
        );
        assert_eq!(route.suggest_source("missing"), None);
    }

    #[test]
    fn test_suggest_ignored_on_sender() {
        let param = Param::sender().suggest("players");
        assert!(matches!(param, Param::Sender { bind: true, .. }));
    }

    #[test]
    fn test_single_flight_console_exemption() {
        let exempt = SingleFlight {
            scope: LockScope::Global,
            include_console: false,
        };
        assert!(exempt.applies_to(ActorKind::Interactive));
        assert!(!exempt.applies_to(ActorKind::Console));

        let strict = SingleFlight {
            include_console: true,
            ..exempt
        };
        assert!(strict.applies_to(ActorKind::Console));
    }
}
