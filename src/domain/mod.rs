//! Domain layer - Core business objects and the seams to infrastructure
//!
//! This layer contains:
//! - Entities: identities, messages, group metadata, plugin descriptors, settings
//! - Traits: Abstractions for infrastructure (Connection, SettingsStore)

pub mod entities;
pub mod traits;
