use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::jid::{normalize_number, Jid};

/// Per-group feature toggles, keyed by setting name
pub type GroupSettings = BTreeMap<String, Value>;

/// Process-wide settings persisted as `settings.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalSettings {
    pub prefix: String,
    /// Owner phone numbers
    pub owners: Vec<String>,
    /// Banned phone numbers
    pub banned: Vec<String>,
    /// Only owners are answered
    pub private_mode: bool,
    /// Messages sent by the bot account itself are dispatched too
    pub developer_mode: bool,
    /// Anything else, kept verbatim
    #[serde(flatten)]
    pub features: BTreeMap<String, Value>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            prefix: ".".to_string(),
            owners: Vec::new(),
            banned: Vec::new(),
            private_mode: false,
            developer_mode: false,
            features: BTreeMap::new(),
        }
    }
}

impl GlobalSettings {
    pub fn is_owner(&self, jid: &Jid) -> bool {
        contains_number(&self.owners, jid)
    }

    pub fn is_banned(&self, jid: &Jid) -> bool {
        contains_number(&self.banned, jid)
    }

    /// Reject states the dispatcher cannot work with
    pub fn validate(&self) -> Result<(), String> {
        if self.prefix.trim().is_empty() {
            return Err("prefix must not be empty".to_string());
        }
        if self.prefix.chars().any(char::is_whitespace) {
            return Err("prefix must not contain whitespace".to_string());
        }
        Ok(())
    }
}

fn contains_number(list: &[String], jid: &Jid) -> bool {
    let user = jid.user();
    !user.is_empty() && list.iter().any(|n| normalize_number(n) == user)
}
