//! # Command Routing File
//!
//! YAML list of command registrations: the name a host exposes, its aliases,
//! the permission it advertises and a short description.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Root of the routing file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub commands: Vec<CommandRegistration>,
}

impl RoutingConfig {
    /// Load and validate a routing file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read routing file {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Invalid routing file {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: RoutingConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        let mut labels = HashSet::new();
        for command in &self.commands {
            validate_label(&command.name)?;

            if command.description.len() > 100 {
                return Err(anyhow::anyhow!(
                    "Command description too long (max 100 chars): {}",
                    command.name
                ));
            }

            for label in std::iter::once(&command.name).chain(&command.aliases) {
                validate_label(label)?;
                if !labels.insert(label.as_str()) {
                    return Err(anyhow::anyhow!(
                        "Label '{label}' is claimed by more than one command"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Registrations that are switched on
    pub fn enabled(&self) -> impl Iterator<Item = &CommandRegistration> {
        self.commands.iter().filter(|c| c.enabled)
    }
}

/// One named command as the host sees it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandRegistration {
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// Advertised to the host; route-level checks still apply
    #[serde(default)]
    pub permission: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl CommandRegistration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            permission: None,
            description: String::new(),
            enabled: true,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Primary name followed by every alias
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

fn default_true() -> bool {
    true
}

fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(anyhow::anyhow!("Command name must not be empty"));
    }
    if label.chars().any(char::is_whitespace) {
        return Err(anyhow::anyhow!("Command name must not contain whitespace: '{label}'"));
    }
    if label.chars().any(char::is_uppercase) {
        return Err(anyhow::anyhow!("Command name must be lowercase: {label}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
commands:
  - name: warp
    aliases: [w, warps]
    permission: kit.warp
    description: Teleport between saved points
  - name: team
    description: Manage teams
  - name: legacy
    enabled: false
"#;

    #[test]
    fn test_parse_sample() {
        let config = RoutingConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.commands.len(), 3);

        let warp = &config.commands[0];
        assert_eq!(warp.labels().collect::<Vec<_>>(), vec!["warp", "w", "warps"]);
        assert_eq!(warp.permission.as_deref(), Some("kit.warp"));
        assert!(warp.enabled);

        let enabled: Vec<_> = config.enabled().map(|c| c.name.as_str()).collect();
        assert_eq!(enabled, vec!["warp", "team"]);
    }

    #[test]
    fn test_rejects_uppercase_and_whitespace() {
        assert!(RoutingConfig::from_yaml("commands:\n  - name: Warp\n").is_err());
        assert!(RoutingConfig::from_yaml("commands:\n  - name: \"my warp\"\n").is_err());
        assert!(RoutingConfig::from_yaml("commands:\n  - name: warp\n    aliases: [W]\n").is_err());
    }

    #[test]
    fn test_rejects_duplicate_labels() {
        let yaml = "commands:\n  - name: warp\n    aliases: [home]\n  - name: home\n";
        let err = RoutingConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("home"));
    }

    #[test]
    fn test_rejects_long_description() {
        let config = RoutingConfig {
            commands: vec![CommandRegistration::new("warp").description("x".repeat(101))],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("routing-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, SAMPLE).unwrap();
        let config = RoutingConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.commands[1].name, "team");

        assert!(RoutingConfig::load(std::env::temp_dir().join("missing-routing.yaml")).is_err());
    }
}
