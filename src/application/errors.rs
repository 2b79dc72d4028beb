//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session ended: {0}")]
    SessionEnded(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by command handlers
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Settings unavailable: {0}")]
    Storage(#[from] StorageError),

    #[error("Plugin reload failed: {0}")]
    Plugin(#[from] PluginError),
}

impl From<BotError> for CommandError {
    fn from(err: BotError) -> Self {
        match err {
            BotError::Storage(e) => CommandError::Storage(e),
            BotError::Plugin(e) => CommandError::Plugin(e),
            BotError::Command(e) => e,
            other => CommandError::Send(other.to_string()),
        }
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Plugin manifest loading errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Failed to load plugin: {0}")]
    Load(String),

    #[error("Invalid plugin {path}: {reason}")]
    Invalid { path: String, reason: String },

    #[error("Unknown handler '{0}'")]
    UnknownHandler(String),

    #[error("Plugin directory not found: {0}")]
    MissingDirectory(String),

    #[error("Watcher error: {0}")]
    Watch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
