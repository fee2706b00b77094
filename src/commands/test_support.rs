//! Shared fixtures for command tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::core::{Actor, ActorId, ActorKind};

/// Actor that records messages and counts permission lookups
pub struct TestActor {
    id: ActorId,
    name: String,
    kind: ActorKind,
    permissions: HashSet<String>,
    operator: bool,
    messages: Mutex<Vec<String>>,
    permission_checks: AtomicUsize,
}

impl TestActor {
    pub fn interactive(name: &str) -> Self {
        Self::new(ActorId::new(), name, ActorKind::Interactive)
    }

    pub fn console() -> Self {
        Self::new(ActorId::console(), "console", ActorKind::Console)
    }

    fn new(id: ActorId, name: &str, kind: ActorKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            permissions: HashSet::new(),
            operator: false,
            messages: Mutex::new(Vec::new()),
            permission_checks: AtomicUsize::new(0),
        }
    }

    pub fn with_permission(mut self, permission: &str) -> Self {
        self.permissions.insert(permission.to_string());
        self
    }

    pub fn as_operator(mut self) -> Self {
        self.operator = true;
        self
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn last_message(&self) -> Option<String> {
        self.messages.lock().unwrap().last().cloned()
    }

    pub fn permission_checks(&self) -> usize {
        self.permission_checks.load(Ordering::SeqCst)
    }
}

impl Actor for TestActor {
    fn id(&self) -> ActorId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActorKind {
        self.kind
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permission_checks.fetch_add(1, Ordering::SeqCst);
        self.permissions.contains(permission)
    }

    fn is_operator(&self) -> bool {
        self.operator
    }

    fn send_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

pub fn tokens(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
