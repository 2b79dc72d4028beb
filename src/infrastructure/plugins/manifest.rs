//! Plugin manifest definition

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::application::errors::PluginError;
use crate::domain::entities::PluginFlags;

/// One command name or a list of them
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CommandNames {
    One(String),
    Many(Vec<String>),
}

impl Default for CommandNames {
    fn default() -> Self {
        CommandNames::Many(Vec::new())
    }
}

/// Plugin manifest as written in `<category>/<name>.yaml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginManifest {
    /// Primary command name, or a list whose first entry is primary
    #[serde(default)]
    pub command: CommandNames,

    /// Extra names
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Handler id in the handler catalog
    pub handler: Option<String>,

    pub description: Option<String>,

    pub usage: Option<String>,

    /// Overrides the directory name
    pub category: Option<String>,

    /// Seconds between invocations per user
    pub cooldown: Option<u64>,

    #[serde(default)]
    pub owner_only: bool,

    #[serde(default)]
    pub group_only: bool,

    #[serde(default)]
    pub private_only: bool,

    #[serde(default)]
    pub admin_only: bool,

    #[serde(default)]
    pub bot_admin: bool,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl PluginManifest {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::Load(format!("Failed to read manifest: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, PluginError> {
        serde_yaml::from_str(content)
            .map_err(|e| PluginError::Load(format!("Failed to parse manifest: {}", e)))
    }

    /// Lowercased, trimmed command names with empties and repeats dropped
    pub fn command_names(&self) -> Vec<String> {
        let declared = match &self.command {
            CommandNames::One(name) => std::slice::from_ref(name),
            CommandNames::Many(names) => names.as_slice(),
        };

        let mut names: Vec<String> = Vec::new();
        for name in declared.iter().chain(self.aliases.iter()) {
            let name = name.trim().to_lowercase();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn flags(&self) -> PluginFlags {
        PluginFlags {
            owner_only: self.owner_only,
            group_only: self.group_only,
            private_only: self.private_only,
            admin_only: self.admin_only,
            bot_admin_required: self.bot_admin,
        }
    }
}
