//! Host command registry
//!
//! Maps command names and aliases to executors, forwards command lines and
//! completion requests, and publishes every registration change so a host can
//! mirror it into its own command table.
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Executors with aliases and change events replace slash handlers
//! - 1.0.0: Initial implementation for handler dispatch

use anyhow::{bail, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::executor::{CommandExecutor, DispatchOutcome};
use super::routing::{CommandRegistration, RoutingConfig};
use crate::core::{Actor, CommandInfo};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Registration events published to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegistryChange {
    Registered {
        name: String,
        aliases: Vec<String>,
        permission: Option<String>,
        description: String,
    },
    Unregistered {
        name: String,
    },
}

struct Registered {
    registration: CommandRegistration,
    executor: Arc<CommandExecutor>,
}

/// Registry mapping command labels to executors
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new();
/// registry.register(CommandRegistration::new("warp").alias("w"), Arc::new(executor))?;
///
/// registry.dispatch_line(actor, "w set home");
/// ```
pub struct CommandRegistry {
    commands: HashMap<String, Registered>,
    /// Every label, primary names included, to its primary name
    labels: HashMap<String, String>,
    changes: broadcast::Sender<RegistryChange>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            commands: HashMap::new(),
            labels: HashMap::new(),
            changes,
        }
    }

    /// Receive every later registration change
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryChange> {
        self.changes.subscribe()
    }

    /// Attach `executor` under the registration's name and aliases
    ///
    /// Fails without side effects if any label is already taken.
    pub fn register(
        &mut self,
        registration: CommandRegistration,
        executor: Arc<CommandExecutor>,
    ) -> Result<()> {
        for label in registration.labels() {
            if let Some(owner) = self.labels.get(&label.to_lowercase()) {
                bail!("Label '{label}' is already registered by /{owner}");
            }
        }

        for label in registration.labels() {
            self.labels
                .insert(label.to_lowercase(), registration.name.clone());
        }
        info!(
            "Registered /{} with {} alias(es)",
            registration.name,
            registration.aliases.len()
        );
        self.publish(RegistryChange::Registered {
            name: registration.name.clone(),
            aliases: registration.aliases.clone(),
            permission: registration.permission.clone(),
            description: registration.description.clone(),
        });
        self.commands.insert(
            registration.name.clone(),
            Registered {
                registration,
                executor,
            },
        );
        Ok(())
    }

    /// Register every enabled command in `routing` that has an executor
    ///
    /// Returns the number registered. Commands without an executor are skipped.
    pub fn register_from_config(
        &mut self,
        routing: &RoutingConfig,
        executors: &HashMap<String, Arc<CommandExecutor>>,
    ) -> Result<usize> {
        let mut registered = 0;
        for registration in routing.enabled() {
            let Some(executor) = executors.get(&registration.name) else {
                warn!("No executor for configured command /{}", registration.name);
                continue;
            };
            self.register(registration.clone(), Arc::clone(executor))?;
            registered += 1;
        }
        Ok(registered)
    }

    /// Remove a command and its aliases
    ///
    /// `name` may be the primary name or an alias, in any case.
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(primary) = self.labels.get(&name.to_lowercase()).cloned() else {
            return false;
        };
        let Some(removed) = self.commands.remove(&primary) else {
            return false;
        };
        for label in removed.registration.labels() {
            self.labels.remove(&label.to_lowercase());
        }
        info!("Unregistered /{primary}");
        self.publish(RegistryChange::Unregistered { name: primary });
        true
    }

    pub fn unregister_all(&mut self) {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        for name in names {
            self.unregister(&name);
        }
    }

    /// Forward a command line; `false` only when no command owns `label`
    pub fn on_command_line(&self, actor: Arc<dyn Actor>, label: &str, tokens: &[String]) -> bool {
        match self.resolve(label) {
            Some((command, executor)) => executor.on_command(actor, &command, tokens),
            None => false,
        }
    }

    /// Forward a completion request
    pub fn on_completion_request(
        &self,
        actor: &dyn Actor,
        label: &str,
        tokens: &[String],
    ) -> Option<Vec<String>> {
        let (command, executor) = self.resolve(label)?;
        executor.on_tab_complete(actor, &command, tokens)
    }

    /// Split a raw line on whitespace and dispatch it
    ///
    /// A leading `/` on the label is ignored. Returns `None` for unknown labels.
    pub fn dispatch_line(&self, actor: Arc<dyn Actor>, line: &str) -> Option<DispatchOutcome> {
        let mut parts = line.split_whitespace();
        let label = parts.next()?;
        let label = label.strip_prefix('/').unwrap_or(label);
        let tokens: Vec<String> = parts.map(str::to_string).collect();
        let (command, executor) = self.resolve(label)?;
        Some(executor.execute(actor, &command, &tokens))
    }

    /// Check if a label is registered
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains_key(&label.to_lowercase())
    }

    /// Number of registered commands, aliases not counted
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Primary command names, sorted
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn registration(&self, name: &str) -> Option<&CommandRegistration> {
        self.commands.get(name).map(|r| &r.registration)
    }

    fn resolve(&self, label: &str) -> Option<(CommandInfo, &Arc<CommandExecutor>)> {
        let label = label.to_lowercase();
        let name = self.labels.get(&label)?;
        let entry = self.commands.get(name)?;
        Some((CommandInfo::with_label(name.clone(), label), &entry.executor))
    }

    fn publish(&self, change: RegistryChange) {
        // no subscribers is fine
        let _ = self.changes.send(change);
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
