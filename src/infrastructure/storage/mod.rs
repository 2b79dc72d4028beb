//! File-based settings store
//!
//! Two JSON documents under the storage directory:
//! - `settings.json`: global settings (prefix, owners, banned, toggles)
//! - `groups.json`: per-group settings keyed by group jid
//!
//! Both are read fully at startup and rewritten fully on every change.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::{GlobalSettings, GroupSettings, Jid};
use crate::domain::traits::SettingsStore;

pub const SETTINGS_FILE: &str = "settings.json";
pub const GROUPS_FILE: &str = "groups.json";

#[derive(Debug, Clone, Default)]
struct SettingsState {
    global: GlobalSettings,
    groups: BTreeMap<String, GroupSettings>,
}

/// JSON file-based settings store
pub struct JsonSettingsStore {
    base_path: PathBuf,
    state: RwLock<SettingsState>,
}

impl JsonSettingsStore {
    /// Load persisted settings, writing defaults for missing documents
    pub async fn load(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::load_with_defaults(base_path, GlobalSettings::default()).await
    }

    /// Like `load`, with `defaults` used when `settings.json` does not exist yet
    pub async fn load_with_defaults(
        base_path: impl Into<PathBuf>,
        defaults: GlobalSettings,
    ) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        tokio::fs::create_dir_all(&base_path).await?;

        let settings_path = base_path.join(SETTINGS_FILE);
        let groups_path = base_path.join(GROUPS_FILE);
        let missing = !settings_path.exists() || !groups_path.exists();

        let global = read_or(&settings_path, defaults).await?;
        let groups = read_or(&groups_path, BTreeMap::new()).await?;

        let store = Self {
            base_path,
            state: RwLock::new(SettingsState { global, groups }),
        };

        if missing {
            tracing::info!("Writing default settings to {}", store.base_path.display());
            let state = store.state.read().await;
            store.persist(&state).await?;
        }

        Ok(store)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    async fn persist(&self, state: &SettingsState) -> Result<(), StorageError> {
        write_json(&self.base_path.join(SETTINGS_FILE), &state.global).await?;
        write_json(&self.base_path.join(GROUPS_FILE), &state.groups).await?;
        Ok(())
    }

    /// Persist after an in-memory change; failures are logged and returned,
    /// the in-memory state keeps the change
    async fn persist_logged(&self, state: &SettingsState, what: &str) -> Result<(), StorageError> {
        self.persist(state).await.inspect_err(|e| {
            tracing::error!("Failed to persist settings after updating {}: {}", what, e);
        })
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn snapshot(&self) -> GlobalSettings {
        self.state.read().await.global.clone()
    }

    async fn get(&self, key: &str) -> Option<Value> {
        let state = self.state.read().await;
        match serde_json::to_value(&state.global) {
            Ok(Value::Object(map)) => map.get(key).cloned(),
            _ => None,
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut state = self.state.write().await;

        let mut map = match serde_json::to_value(&state.global)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert(key.to_string(), value);

        let updated: GlobalSettings =
            serde_json::from_value(Value::Object(map)).map_err(|e| StorageError::InvalidValue {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        updated.validate().map_err(|reason| StorageError::InvalidValue {
            key: key.to_string(),
            reason,
        })?;

        state.global = updated;
        self.persist_logged(&state, key).await
    }

    async fn get_group_setting(&self, group: &Jid, key: &str) -> Option<Value> {
        let state = self.state.read().await;
        state.groups.get(group.as_str()).and_then(|g| g.get(key)).cloned()
    }

    async fn set_group_setting(&self, group: &Jid, key: &str, value: Value) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state
            .groups
            .entry(group.as_str().to_string())
            .or_default()
            .insert(key.to_string(), value);

        self.persist_logged(&state, key).await
    }
}

async fn read_or<T: DeserializeOwned>(path: &Path, default: T) -> Result<T, StorageError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(default),
        Err(e) => Err(e.into()),
    }
}

/// Write to a sibling temp file, then rename over the target
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
