//! Domain traits - Abstractions for infrastructure implementations

pub mod connection;
pub mod store;

pub use connection::{BotInfo, Connection, ConnectionEvent, DisconnectReason};
pub use store::SettingsStore;
