//! Plugin discovery for mahachi-bot
//!
//! Plugins are YAML manifests grouped in category directories. Each manifest
//! names its commands, access flags and cooldown, and binds them to a handler
//! registered in the `HandlerCatalog`.

pub mod loader;
pub mod manifest;
pub mod registry;
pub mod watcher;

pub use loader::{LoadFailure, LoadReport, PluginLoader, PluginTable};
pub use manifest::PluginManifest;
pub use registry::PluginRegistry;
pub use watcher::{reload_on_change, PluginWatcher};
