use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::plugins::CommandHandler;

/// Cooldown applied when a manifest does not declare one
pub const DEFAULT_COOLDOWN_SECS: u64 = 3;

/// Access restrictions declared by a plugin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PluginFlags {
    pub owner_only: bool,
    pub group_only: bool,
    pub private_only: bool,
    pub admin_only: bool,
    pub bot_admin_required: bool,
}

/// One loadable command unit: names, restrictions, and the handler behind them
pub struct PluginDescriptor {
    /// Primary command first, then aliases; lowercase, non-empty, no duplicates
    pub command_names: Vec<String>,
    pub handler_id: String,
    pub handler: Arc<dyn CommandHandler>,
    pub flags: PluginFlags,
    pub cooldown_seconds: u64,
    pub category: String,
    pub description: String,
    pub usage: Option<String>,
    /// Manifest this descriptor was built from
    pub file_path: PathBuf,
}

impl PluginDescriptor {
    pub fn new(command_names: Vec<String>, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            command_names,
            handler_id: handler.id().to_string(),
            handler,
            flags: PluginFlags::default(),
            cooldown_seconds: DEFAULT_COOLDOWN_SECS,
            category: "misc".to_string(),
            description: "No description".to_string(),
            usage: None,
            file_path: PathBuf::new(),
        }
    }

    pub fn with_flags(mut self, flags: PluginFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_cooldown(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn primary_name(&self) -> &str {
        self.command_names.first().map(String::as_str).unwrap_or_default()
    }

    /// Cooldown window identity, shared by every name of this descriptor and
    /// by no other descriptor
    pub fn cooldown_key(&self) -> String {
        if self.file_path.as_os_str().is_empty() {
            self.primary_name().to_string()
        } else {
            self.file_path.display().to_string()
        }
    }

    pub fn aliases(&self) -> &[String] {
        self.command_names.get(1..).unwrap_or_default()
    }

    /// Case-insensitive match on any command name or the description
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.command_names.iter().any(|n| n.contains(&query))
            || self.description.to_lowercase().contains(&query)
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("command_names", &self.command_names)
            .field("handler_id", &self.handler_id)
            .field("flags", &self.flags)
            .field("cooldown_seconds", &self.cooldown_seconds)
            .field("category", &self.category)
            .field("file_path", &self.file_path)
            .finish()
    }
}
