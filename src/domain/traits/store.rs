use async_trait::async_trait;
use serde_json::Value;

use crate::application::errors::StorageError;
use crate::domain::entities::{GlobalSettings, Jid};

/// Settings store - durable, process-wide configuration
///
/// Reads are served from memory. Writes mutate memory and persist the whole
/// store before returning.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Typed copy of the global settings
    async fn snapshot(&self) -> GlobalSettings;

    /// Global setting by its persisted (camelCase) key
    async fn get(&self, key: &str) -> Option<Value>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    async fn get_group_setting(&self, group: &Jid, key: &str) -> Option<Value>;

    async fn set_group_setting(&self, group: &Jid, key: &str, value: Value) -> Result<(), StorageError>;
}
