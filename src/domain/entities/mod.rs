//! Domain entities - Core business objects

pub mod group;
pub mod jid;
pub mod message;
pub mod plugin;
pub mod settings;

pub use group::{GroupMetadata, Participant, ParticipantAction, ParticipantRole};
pub use jid::{normalize_number, Jid};
pub use message::{InboundMessage, MessageContent, OutgoingMessage, QuotedMessage};
pub use plugin::{PluginDescriptor, PluginFlags, DEFAULT_COOLDOWN_SECS};
pub use settings::{GlobalSettings, GroupSettings};
