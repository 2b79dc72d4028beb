//! Plugin trait definitions

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::CommandError;
use crate::application::messaging::Context;
use crate::domain::entities::{InboundMessage, Jid, ParticipantAction};
use crate::domain::traits::{Connection, SettingsStore};

/// Capability contract every command handler implements
///
/// Manifests on disk refer to handlers by `id()`; the handler itself never
/// sees authorization or cooldown, the dispatcher has applied both already.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Identifier referenced by the `handler` field of a manifest
    fn id(&self) -> &str;

    /// Run the command for one invocation
    async fn run(&self, ctx: Context) -> Result<(), CommandError>;
}

/// Passive hook that sees every inbound message carrying text
#[async_trait]
pub trait MessageObserver: Send + Sync {
    fn name(&self) -> &str;

    async fn observe(&self, event: &ObservedMessage<'_>) -> Result<(), CommandError>;
}

/// What an observer gets to look at
pub struct ObservedMessage<'a> {
    pub message: &'a InboundMessage,
    pub text: &'a str,
    pub connection: &'a Arc<dyn Connection>,
    pub settings: &'a Arc<dyn SettingsStore>,
}

/// Hook run when group membership changes
#[async_trait]
pub trait ParticipantObserver: Send + Sync {
    fn name(&self) -> &str;

    async fn on_participants(&self, update: &ParticipantUpdate<'_>) -> Result<(), CommandError>;
}

/// One membership change as seen by participant observers
pub struct ParticipantUpdate<'a> {
    pub group: &'a Jid,
    pub participants: &'a [Jid],
    pub action: ParticipantAction,
    pub connection: &'a Arc<dyn Connection>,
    pub settings: &'a Arc<dyn SettingsStore>,
}
