//! Invocation context handed to a command handler

use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::domain::entities::{GroupMetadata, InboundMessage, Jid, OutgoingMessage, QuotedMessage};
use crate::domain::traits::{Connection, SettingsStore};
use crate::infrastructure::plugins::PluginRegistry;

/// Everything a handler knows about one invocation
///
/// Built by the dispatcher per message and moved into exactly one handler call.
pub struct Context {
    pub connection: Arc<dyn Connection>,
    pub message: InboundMessage,
    /// Lowercased command name as typed (may be an alias)
    pub command: String,
    pub args: Vec<String>,
    pub text: String,
    /// Prefix in effect for this invocation
    pub prefix: String,
    pub sender: Jid,
    pub chat: Jid,
    pub push_name: String,
    pub is_group: bool,
    pub is_owner: bool,
    pub is_admin: bool,
    pub is_bot_admin: bool,
    /// Present for group chats when metadata could be fetched
    pub group: Option<GroupMetadata>,
    pub settings: Arc<dyn SettingsStore>,
    pub registry: Arc<PluginRegistry>,
}

impl Context {
    pub fn quoted(&self) -> Option<&QuotedMessage> {
        self.message.quoted.as_ref()
    }

    pub fn mentioned(&self) -> &[Jid] {
        &self.message.mentioned
    }

    /// Reply in the originating chat, quoting the command message
    pub async fn reply(&self, text: impl Into<String>) -> Result<(), CommandError> {
        self.send(OutgoingMessage::text(text).quoting(&self.message)).await
    }

    /// Reply with mentions, without quoting
    pub async fn reply_with_mentions(
        &self,
        text: impl Into<String>,
        mentions: Vec<Jid>,
    ) -> Result<(), CommandError> {
        self.send(OutgoingMessage::text(text).with_mentions(mentions)).await
    }

    pub async fn send(&self, message: OutgoingMessage) -> Result<(), CommandError> {
        self.connection
            .send(&self.chat, message)
            .await
            .map(|_| ())
            .map_err(CommandError::from)
    }

    /// `<prefix><command>`, for usage lines
    pub fn invocation(&self) -> String {
        format!("{}{}", self.prefix, self.command)
    }
}
