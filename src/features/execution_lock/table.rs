//! Single-flight lock table
//!
//! Tracks which routes are currently executing, either per actor or across
//! all actors. Entries are released by dropping the returned guard, so a
//! handler that errors or panics can never leave a lock behind.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;

use crate::core::{ActorId, LockScope};

#[derive(Debug, Default)]
pub struct ExecutionLocks {
    per_sender: DashMap<(ActorId, String), ()>,
    global: DashMap<String, ActorId>,
}

impl ExecutionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `route` is in flight for `actor` under `scope`
    pub fn is_locked(&self, scope: LockScope, actor: ActorId, route: &str) -> bool {
        match scope {
            LockScope::Sender => self.per_sender.contains_key(&(actor, route.to_string())),
            LockScope::Global => self.global.contains_key(route),
        }
    }

    /// Install an entry, or `None` when one already exists
    pub fn try_acquire(
        self: &Arc<Self>,
        scope: LockScope,
        actor: ActorId,
        route: &str,
    ) -> Option<LockGuard> {
        let acquired = match scope {
            LockScope::Sender => match self.per_sender.entry((actor, route.to_string())) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(());
                    true
                }
            },
            LockScope::Global => match self.global.entry(route.to_string()) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(actor);
                    true
                }
            },
        };

        if !acquired {
            return None;
        }
        debug!("Lock {scope:?} installed for '{route}' by {actor}");
        Some(LockGuard {
            table: Arc::clone(self),
            scope,
            actor,
            route: route.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.per_sender.len() + self.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, scope: LockScope, actor: ActorId, route: &str) {
        match scope {
            LockScope::Sender => {
                self.per_sender.remove(&(actor, route.to_string()));
            }
            LockScope::Global => {
                self.global.remove_if(route, |_, holder| *holder == actor);
            }
        }
        debug!("Lock {scope:?} released for '{route}' by {actor}");
    }
}

/// Held for the lifetime of one invocation
#[derive(Debug)]
pub struct LockGuard {
    table: Arc<ExecutionLocks>,
    scope: LockScope,
    actor: ActorId,
    route: String,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.table.release(self.scope, self.actor, &self.route);
    }
}
