//! Actor abstraction consumed by the dispatcher
//!
//! The dispatcher never owns actors. It only asks whether an actor is an
//! interactive user or the console, whether it holds a permission, and hands
//! it messages.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Add `ConsoleActor` for hosts without their own console type
//! - 1.0.0: Initial actor trait

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of an actor, used as the key of lock and cooldown tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Fresh random identity
    pub fn new() -> Self {
        ActorId(Uuid::new_v4())
    }

    /// Identity shared by every console actor
    pub const fn console() -> Self {
        ActorId(Uuid::nil())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of actor issued a command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    /// A connected user typing commands
    Interactive,
    /// The server console
    Console,
}

impl ActorKind {
    pub fn is_interactive(self) -> bool {
        matches!(self, ActorKind::Interactive)
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorKind::Interactive => write!(f, "interactive"),
            ActorKind::Console => write!(f, "console"),
        }
    }
}

/// Which actor kinds a route or executor accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Interactive,
    Console,
    Any,
}

impl TargetKind {
    pub fn accepts(self, kind: ActorKind) -> bool {
        match self {
            TargetKind::Interactive => kind == ActorKind::Interactive,
            TargetKind::Console => kind == ActorKind::Console,
            TargetKind::Any => true,
        }
    }
}

/// The entity issuing a command line
///
/// Implemented by the host for its users and its console.
pub trait Actor: Send + Sync {
    fn id(&self) -> ActorId;

    /// Display name, used in log lines only
    fn name(&self) -> &str;

    fn kind(&self) -> ActorKind;

    fn has_permission(&self, permission: &str) -> bool;

    /// Whether the actor is a server operator
    fn is_operator(&self) -> bool;

    /// Deliver a human-readable message to the actor
    fn send_message(&self, message: &str);
}

/// The command object a line was typed against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    /// Primary command name
    pub name: String,
    /// Alias the actor actually typed
    pub label: String,
}

impl CommandInfo {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
        }
    }

    pub fn with_label(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Console actor that writes every message to the log
///
/// Holds every permission and is always an operator.
#[derive(Debug, Clone, Default)]
pub struct ConsoleActor;

impl Actor for ConsoleActor {
    fn id(&self) -> ActorId {
        ActorId::console()
    }

    fn name(&self) -> &str {
        "console"
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Console
    }

    fn has_permission(&self, _permission: &str) -> bool {
        true
    }

    fn is_operator(&self) -> bool {
        true
    }

    fn send_message(&self, message: &str) {
        info!("[console] {message}");
    }
}
