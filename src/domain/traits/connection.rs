use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{GroupMetadata, InboundMessage, Jid, OutgoingMessage, ParticipantAction};

/// Connection trait - abstraction over the messaging-protocol session
///
/// Implementations own the socket, credentials and decoding. The bot only
/// consumes decoded events and calls the send primitives below.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Open (or re-open) the session
    async fn connect(&self) -> Result<(), BotError> {
        Ok(())
    }

    /// Next decoded event; `None` once the event stream has ended for good
    async fn next_event(&self) -> Option<ConnectionEvent> {
        None
    }

    /// Send a message to a chat, returning the id assigned to it
    async fn send(&self, chat: &Jid, message: OutgoingMessage) -> Result<String, BotError>;

    /// Fetch group metadata (participants and their roles)
    async fn group_metadata(&self, group: &Jid) -> Result<GroupMetadata, BotError>;

    /// Add, remove, promote or demote group participants
    async fn update_participants(
        &self,
        group: &Jid,
        participants: &[Jid],
        action: ParticipantAction,
    ) -> Result<(), BotError>;

    /// Restrict sending to admins (`true`) or open the group to everyone (`false`)
    async fn set_announce(&self, group: &Jid, announce: bool) -> Result<(), BotError>;

    /// Identity of the logged-in account
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub jid: Jid,
    pub name: String,
}

/// Events surfaced by a connection
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    Open,
    Message(InboundMessage),
    /// Members joined, left, or changed role in a group
    Participants {
        group: Jid,
        participants: Vec<Jid>,
        action: ParticipantAction,
    },
    Closed(DisconnectReason),
}

/// Why a session was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    BadSession,
    ConnectionClosed,
    ConnectionLost,
    ConnectionReplaced,
    LoggedOut,
    RestartRequired,
    TimedOut,
    Unknown(u16),
}

impl DisconnectReason {
    /// Whether reconnecting can help
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            DisconnectReason::BadSession
                | DisconnectReason::ConnectionReplaced
                | DisconnectReason::LoggedOut
        )
    }

    /// Reconnect immediately, without the usual backoff interval
    pub fn is_restart(&self) -> bool {
        matches!(self, DisconnectReason::RestartRequired)
    }

    /// Stored credentials can no longer be used
    pub fn invalidates_session(&self) -> bool {
        matches!(self, DisconnectReason::BadSession | DisconnectReason::LoggedOut)
    }
}
