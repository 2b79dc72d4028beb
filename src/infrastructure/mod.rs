//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Settings persistence
//! - Plugins: Manifest discovery, the command registry and hot reload
//! - Adapters: Connection implementations (console)

pub mod adapters;
pub mod config;
pub mod plugins;
pub mod storage;
