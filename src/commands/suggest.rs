//! Suggestion providers and the completion resolver
//!
//! Providers are plain callbacks registered under a name. A placeholder that
//! declares `Param::suggest(name)` is completed by the first provider found
//! under that name, looking at the executor's own providers before any linked
//! shared registries.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Linked shared provider registries
//! - 1.0.0: Initial resolver

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::debug;

use super::guards::{admits_listing, ExecutorMeta};
use super::handler::{Route, SuggestSource};
use super::pattern::{Pattern, PatternTable, Token};
use crate::core::{Actor, CommandInfo};

/// What a provider is told about the completion request
pub struct SuggestContext<'a> {
    pub actor: &'a dyn Actor,
    pub command: &'a CommandInfo,
    /// Raw tokens typed so far, the last one possibly partial
    pub tokens: &'a [String],
}

pub type Provider = Arc<dyn Fn(&SuggestContext<'_>) -> Vec<String> + Send + Sync>;

/// Named suggestion callbacks
#[derive(Default, Clone)]
pub struct SuggestionProviders {
    providers: HashMap<String, Provider>,
}

impl SuggestionProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `name`; a trailing `()` on the name is ignored
    pub fn register<F, I>(&mut self, name: &str, provider: F) -> &mut Self
    where
        F: Fn(&SuggestContext<'_>) -> I + Send + Sync + 'static,
        I: IntoIterator,
        I::Item: ToString,
    {
        let wrapped: Provider = Arc::new(move |ctx: &SuggestContext<'_>| {
            provider(ctx).into_iter().map(|c| c.to_string()).collect()
        });
        self.providers.insert(normalize(name).to_string(), wrapped);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Provider> {
        self.providers.get(normalize(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for SuggestionProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("SuggestionProviders")
            .field("names", &names)
            .finish()
    }
}

fn normalize(name: &str) -> &str {
    name.strip_suffix("()").unwrap_or(name)
}

/// Read-only view over one executor's routes for completion
pub struct Resolver<'a> {
    pub table: &'a PatternTable,
    pub routes: &'a [Route],
    pub meta: &'a ExecutorMeta,
    pub own: &'a SuggestionProviders,
    pub linked: &'a [Arc<SuggestionProviders>],
}

impl Resolver<'_> {
    /// Candidates for the last token in `ctx.tokens`, deduplicated in order
    pub fn suggest(&self, ctx: &SuggestContext<'_>) -> Vec<String> {
        let mut out = Candidates::default();
        if ctx.tokens.len() <= 1 {
            self.first_position(ctx, &mut out);
        } else {
            self.later_position(ctx, &mut out);
        }
        out.into_vec()
    }

    fn first_position(&self, ctx: &SuggestContext<'_>, out: &mut Candidates) {
        for (index, pattern) in self.listable(ctx.actor) {
            match pattern.token_at(0) {
                Some(Token::Literal(text)) => out.push(text.clone()),
                Some(token) => self.resolve_placeholder(ctx, index, token, out),
                None => {}
            }
        }
    }

    fn later_position(&self, ctx: &SuggestContext<'_>, out: &mut Candidates) {
        let position = ctx.tokens.len() - 1;
        let typed = &ctx.tokens[..position];

        let (perfect, relaxed): (Vec<_>, Vec<_>) = self
            .listable(ctx.actor)
            .filter(|(_, pattern)| {
                pattern.has_variadic_tail() || pattern.len() > position
            })
            .filter_map(|(index, pattern)| {
                if is_perfect_prefix(pattern, typed) {
                    Some((index, true))
                } else if is_relaxed_prefix(pattern, typed) {
                    Some((index, false))
                } else {
                    None
                }
            })
            .partition(|(_, perfect)| *perfect);

        let selected = if perfect.is_empty() { relaxed } else { perfect };
        debug!(
            "Completing position {position} of '{}' from {} route(s)",
            ctx.command.label,
            selected.len()
        );

        for (index, _) in selected {
            let Some(pattern) = self.table.get(index) else {
                continue;
            };
            match token_for_position(pattern, position) {
                Some(Token::Literal(_)) => self.literals_at(position, out),
                Some(token) => self.resolve_placeholder(ctx, index, token, out),
                None => {}
            }
        }
    }

    /// Literal tokens any route declares at `position`
    fn literals_at(&self, position: usize, out: &mut Candidates) {
        for (_, pattern) in self.table.iter() {
            if let Some(Token::Literal(text)) = pattern.token_at(position) {
                out.push(text.clone());
            }
        }
    }

    fn resolve_placeholder(
        &self,
        ctx: &SuggestContext<'_>,
        index: usize,
        token: &Token,
        out: &mut Candidates,
    ) {
        let Some(name) = token.placeholder_name() else {
            return;
        };
        let Some(route) = self.routes.get(index) else {
            return;
        };
        match route.suggest_source(name) {
            Some(SuggestSource::Hint(text)) => out.push(text.clone()),
            Some(SuggestSource::Provider(provider)) => match self.provider(provider) {
                Some(callback) => out.extend(callback(ctx)),
                None => {
                    debug!("No suggestion provider named '{provider}', using the name itself");
                    out.push(provider.clone());
                }
            },
            None => {}
        }
    }

    fn provider(&self, name: &str) -> Option<&Provider> {
        self.own
            .get(name)
            .or_else(|| self.linked.iter().find_map(|shared| shared.get(name)))
    }

    /// Routes the actor passes the permission and operator checks for
    fn listable<'s>(
        &'s self,
        actor: &'s dyn Actor,
    ) -> impl Iterator<Item = (usize, &'s Pattern)> + 's {
        let table: &'s PatternTable = self.table;
        let routes: &'s [Route] = self.routes;
        let meta: &'s ExecutorMeta = self.meta;
        table.iter().filter(move |(index, _)| {
            routes
                .get(*index)
                .is_some_and(|route| admits_listing(actor, route.meta(), meta))
        })
    }
}

/// Completed tokens equal the pattern's literal tokens one for one
fn is_perfect_prefix(pattern: &Pattern, typed: &[String]) -> bool {
    typed.iter().enumerate().all(|(i, arg)| match pattern.token_at(i) {
        Some(Token::Literal(text)) => text.eq_ignore_ascii_case(arg),
        _ => false,
    })
}

/// Completed tokens fit the pattern, placeholders accepting anything
fn is_relaxed_prefix(pattern: &Pattern, typed: &[String]) -> bool {
    typed.iter().enumerate().all(|(i, arg)| {
        token_for_position(pattern, i).is_some_and(|token| token.matches(arg))
    })
}

/// Token governing `position`, extending a variadic tail past the end
fn token_for_position(pattern: &Pattern, position: usize) -> Option<&Token> {
    pattern.token_at(position).or_else(|| {
        pattern
            .tokens()
            .last()
            .filter(|last| last.is_variadic())
    })
}

#[derive(Default)]
struct Candidates {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl Candidates {
    fn push(&mut self, candidate: String) {
        if self.seen.insert(candidate.clone()) {
            self.items.push(candidate);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}

impl Extend<String> for Candidates {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        for candidate in iter {
            self.push(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handler::Param;
    use crate::commands::test_support::{tokens, TestActor};

    struct Fixture {
        table: PatternTable,
        routes: Vec<Route>,
        meta: ExecutorMeta,
        own: SuggestionProviders,
        linked: Vec<Arc<SuggestionProviders>>,
    }

    impl Fixture {
        fn new(routes: Vec<Route>) -> Self {
            let table = PatternTable::new(
                routes
                    .iter()
                    .map(|r| Pattern::parse(r.pattern()).unwrap())
                    .collect(),
            )
            .unwrap();
            Self {
                table,
                routes,
                meta: ExecutorMeta::default(),
                own: SuggestionProviders::new(),
                linked: Vec::new(),
            }
        }

        fn suggest(&self, actor: &dyn Actor, typed: &[&str]) -> Vec<String> {
            let command = CommandInfo::new("warp");
            let typed = tokens(typed);
            let resolver = Resolver {
                table: &self.table,
                routes: &self.routes,
                meta: &self.meta,
                own: &self.own,
                linked: &self.linked,
            };
            resolver.suggest(&SuggestContext {
                actor,
                command: &command,
                tokens: &typed,
            })
        }
    }

    fn warp_routes() -> Vec<Route> {
        vec![
            Route::new("set <name>").param(Param::arg::<String>("name").hint("<warp name>")),
            Route::new("remove <name>").param(Param::arg::<String>("name").suggest("warps")),
            Route::new("list"),
            Route::new("<name>").param(Param::arg::<String>("name").suggest("warps()")),
        ]
    }

    #[test]
    fn test_first_position_lists_literals_and_providers() {
        let mut fx = Fixture::new(warp_routes());
        fx.own.register("warps", |_| vec!["spawn", "mine"]);
        let actor = TestActor::interactive("alice");

        assert_eq!(
            fx.suggest(&actor, &[""]),
            tokens(&["set", "remove", "list", "spawn", "mine"])
        );
    }

    #[test]
    fn test_first_position_respects_permissions() {
        let mut routes = warp_routes();
        routes[0] = routes[0].clone().permission("warp.admin");
        let fx = Fixture::new(routes);

        let user = TestActor::interactive("bob");
        assert!(!fx.suggest(&user, &[""]).contains(&"set".to_string()));
        let admin = TestActor::interactive("root").with_permission("warp.admin");
        assert!(fx.suggest(&admin, &[""]).contains(&"set".to_string()));
    }

    #[test]
    fn test_later_position_prefers_perfect_prefix() {
        let mut fx = Fixture::new(warp_routes());
        fx.own.register("warps", |_| vec!["spawn", "mine"]);
        let actor = TestActor::interactive("alice");

        assert_eq!(fx.suggest(&actor, &["set", ""]), tokens(&["<warp name>"]));
        assert_eq!(fx.suggest(&actor, &["remove", "sp"]), tokens(&["spawn", "mine"]));
    }

    #[test]
    fn test_relaxed_fallback_through_placeholder() {
        let fx = Fixture::new(vec![
            Route::new("<player> give <item>")
                .param(Param::arg::<String>("player"))
                .param(Param::arg::<String>("item").hint("<item id>")),
            Route::new("<player> take <item>")
                .param(Param::arg::<String>("player"))
                .param(Param::arg::<String>("item")),
        ]);
        let actor = TestActor::interactive("alice");

        assert_eq!(fx.suggest(&actor, &["steve", ""]), tokens(&["give", "take"]));
        assert_eq!(fx.suggest(&actor, &["steve", "give", ""]), tokens(&["<item id>"]));
    }

    #[test]
    fn test_variadic_tail_keeps_suggesting() {
        let mut fx = Fixture::new(vec![Route::new("invite <players...>")
            .param(Param::arg::<Vec<String>>("players").suggest("online"))]);
        fx.own.register("online", |ctx: &SuggestContext<'_>| {
            vec![format!("{}-friend", ctx.actor.name())]
        });
        let actor = TestActor::interactive("alice");

        assert_eq!(fx.suggest(&actor, &["invite", "a", "b", ""]), tokens(&["alice-friend"]));
    }

    #[test]
    fn test_past_end_without_variadic_is_empty() {
        let fx = Fixture::new(warp_routes());
        let actor = TestActor::interactive("alice");
        assert!(fx.suggest(&actor, &["list", "x", ""]).is_empty());
    }

    #[test]
    fn test_unresolved_provider_falls_back_to_name() {
        let fx = Fixture::new(warp_routes());
        let actor = TestActor::interactive("alice");
        assert_eq!(fx.suggest(&actor, &["remove", ""]), tokens(&["warps"]));
        assert_eq!(
            fx.suggest(&actor, &[""]),
            tokens(&["set", "remove", "list", "warps()"])
        );
    }

    #[test]
    fn test_linked_registries_searched_after_own() {
        let mut fx = Fixture::new(warp_routes());
        let mut shared = SuggestionProviders::new();
        shared.register("warps", |_| vec!["shared"]);
        fx.linked.push(Arc::new(shared));
        let actor = TestActor::interactive("alice");

        assert_eq!(fx.suggest(&actor, &["remove", ""]), tokens(&["shared"]));

        fx.own.register("warps()", |_| vec!["local"]);
        assert_eq!(fx.suggest(&actor, &["remove", ""]), tokens(&["local"]));
    }

    #[test]
    fn test_placeholder_without_source_yields_nothing() {
        let fx = Fixture::new(vec![Route::new("kick <player>").param(Param::arg::<String>("player"))]);
        let actor = TestActor::interactive("alice");
        assert!(fx.suggest(&actor, &["kick", ""]).is_empty());
    }

    #[test]
    fn test_providers_stringify_items() {
        let mut providers = SuggestionProviders::new();
        providers.register("levels", |_| 1..=3);
        let actor = TestActor::interactive("alice");
        let command = CommandInfo::new("lvl");
        let ctx = SuggestContext {
            actor: &actor,
            command: &command,
            tokens: &[],
        };
        assert_eq!(providers.get("levels()").unwrap()(&ctx), tokens(&["1", "2", "3"]));
        assert_eq!(providers.len(), 1);
    }
}
