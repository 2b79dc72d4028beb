//! Command dispatcher - turns one inbound message into at most one handler call
//!
//! Extract text → classify by prefix → parse → resolve in the registry →
//! authorize → cooldown → invoke. Every step either stops silently, stops
//! with a reply, or (for handler failures) reports and moves on. Nothing a
//! plugin does can take the dispatcher down.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::authorize::{authorize, AccessFacts, Denial, SilentReason};
use super::context::Context;
use super::cooldown::CooldownTracker;
use super::parser::CommandParser;
use crate::domain::entities::{GroupMetadata, InboundMessage, Jid, OutgoingMessage, ParticipantAction};
use crate::domain::traits::{Connection, SettingsStore};
use crate::infrastructure::plugins::PluginRegistry;
use crate::plugins::{MessageObserver, ObservedMessage, ParticipantObserver, ParticipantUpdate};

pub const FAILURE_REPLY: &str = "❌ Something went wrong while running that command.";

pub fn cooldown_reply(remaining_secs: u64) -> String {
    format!(
        "⏳ Please wait {} seconds before using this command again.",
        remaining_secs
    )
}

/// Why a message produced no invocation and no reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    StatusBroadcast,
    OwnMessage,
    NoText,
    NotCommand,
    UnknownCommand(String),
    Banned,
    PrivateMode,
}

/// What happened to one inbound message
///
/// `command` is the name as typed, which may be an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    Denied { command: String, reason: String },
    CoolingDown { command: String, remaining_secs: u64 },
    Executed { command: String },
    Failed { command: String, error: String },
}

impl DispatchOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, DispatchOutcome::Executed { .. })
    }
}

/// Command dispatcher
pub struct CommandDispatcher {
    connection: Arc<dyn Connection>,
    registry: Arc<PluginRegistry>,
    settings: Arc<dyn SettingsStore>,
    cooldowns: CooldownTracker,
    observers: Vec<Arc<dyn MessageObserver>>,
    participant_observers: Vec<Arc<dyn ParticipantObserver>>,
}

impl CommandDispatcher {
    pub fn new(
        connection: Arc<dyn Connection>,
        registry: Arc<PluginRegistry>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            connection,
            registry,
            settings,
            cooldowns: CooldownTracker::new(),
            observers: Vec::new(),
            participant_observers: Vec::new(),
        }
    }

    /// Add a passive observer run on every message carrying text
    pub fn with_observer(mut self, observer: Arc<dyn MessageObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Add a hook run on group membership changes
    pub fn with_participant_observer(mut self, observer: Arc<dyn ParticipantObserver>) -> Self {
        self.participant_observers.push(observer);
        self
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Process one inbound message
    pub async fn dispatch(&self, message: InboundMessage) -> DispatchOutcome {
        if message.chat.is_status_broadcast() {
            return DispatchOutcome::Ignored(IgnoreReason::StatusBroadcast);
        }

        let settings = self.settings.snapshot().await;

        if message.from_me && !settings.developer_mode {
            return DispatchOutcome::Ignored(IgnoreReason::OwnMessage);
        }

        // Extract
        let Some(text) = message.text().map(str::to_string) else {
            return DispatchOutcome::Ignored(IgnoreReason::NoText);
        };

        self.run_observers(&message, &text).await;

        // Classify + parse
        let parser = CommandParser::new(settings.prefix.as_str());
        let Some(parsed) = parser.parse(&text) else {
            return DispatchOutcome::Ignored(IgnoreReason::NotCommand);
        };

        // Resolve
        let Some(descriptor) = self.registry.lookup(&parsed.name) else {
            debug!(command = %parsed.name, "Unknown command, ignoring");
            return DispatchOutcome::Ignored(IgnoreReason::UnknownCommand(parsed.name));
        };
        let command = parsed.name.clone();

        // Authorize
        let sender = message.sender.clone();
        let is_group = message.is_group();
        let is_owner = settings.is_owner(&sender);
        let is_banned = settings.is_banned(&sender);

        let group = if is_group && !is_banned {
            self.fetch_group(&message.chat).await
        } else {
            None
        };
        let bot_jid = self.connection.bot_info().jid;
        let is_admin = group.as_ref().map(|g| g.is_admin(&sender)).unwrap_or(false);
        let is_bot_admin = group.as_ref().map(|g| g.is_admin(&bot_jid)).unwrap_or(false);

        let facts = AccessFacts {
            is_owner,
            is_banned,
            private_mode: settings.private_mode,
            is_group,
            is_admin,
            is_bot_admin,
        };

        if let Err(denial) = authorize(&descriptor.flags, &facts) {
            return match denial {
                Denial::Silent(reason) => {
                    debug!(command = %command, sender = %sender, "Dropping command: {}", denial);
                    DispatchOutcome::Ignored(match reason {
                        SilentReason::Banned => IgnoreReason::Banned,
                        SilentReason::PrivateMode => IgnoreReason::PrivateMode,
                    })
                }
                Denial::Reply(text) => {
                    info!(command = %command, sender = %sender, "Command denied: {}", text);
                    self.reply(&message, text).await;
                    DispatchOutcome::Denied {
                        command,
                        reason: text.to_string(),
                    }
                }
            };
        }

        // Cooldown
        if !is_owner && descriptor.cooldown_seconds > 0 {
            if let Err(remaining_secs) =
                self.cooldowns
                    .try_start(sender.as_str(), &descriptor.cooldown_key(), descriptor.cooldown_seconds)
            {
                self.reply(&message, cooldown_reply(remaining_secs)).await;
                return DispatchOutcome::CoolingDown {
                    command,
                    remaining_secs,
                };
            }
        }

        // Invoke
        let push_name = message
            .push_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        info!(command = %command, sender = %sender, chat = %message.chat, "Executing: {} by {}", descriptor.primary_name(), push_name);

        let ctx = Context {
            connection: Arc::clone(&self.connection),
            message: message.clone(),
            command: parsed.name,
            args: parsed.args,
            text: parsed.text,
            prefix: settings.prefix.clone(),
            sender,
            chat: message.chat.clone(),
            push_name,
            is_group,
            is_owner,
            is_admin,
            is_bot_admin,
            group,
            settings: Arc::clone(&self.settings),
            registry: Arc::clone(&self.registry),
        };

        let handler = Arc::clone(&descriptor.handler);
        let error = match tokio::spawn(async move { handler.run(ctx).await }).await {
            Ok(Ok(())) => return DispatchOutcome::Executed { command },
            Ok(Err(e)) => {
                error!(command = %command, "Command error: {}", e);
                e.to_string()
            }
            Err(e) => {
                error!(command = %command, "Command handler panicked: {}", e);
                e.to_string()
            }
        };

        self.reply(&message, FAILURE_REPLY).await;
        DispatchOutcome::Failed { command, error }
    }

    async fn fetch_group(&self, chat: &Jid) -> Option<GroupMetadata> {
        match self.connection.group_metadata(chat).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(chat = %chat, "Failed to fetch group metadata: {}", e);
                None
            }
        }
    }

    async fn run_observers(&self, message: &InboundMessage, text: &str) {
        if self.observers.is_empty() {
            return;
        }

        let event = ObservedMessage {
            message,
            text,
            connection: &self.connection,
            settings: &self.settings,
        };

        for observer in &self.observers {
            if let Err(e) = observer.observe(&event).await {
                warn!(observer = observer.name(), "Observer error: {}", e);
            }
        }
    }

    /// Run participant observers for one membership change in a group
    ///
    /// Observer failures are logged and do not stop the remaining observers.
    pub async fn participants_changed(&self, group: &Jid, participants: &[Jid], action: ParticipantAction) {
        if !group.is_group() || participants.is_empty() {
            return;
        }
        debug!(chat = %group, "Participants {}: {}", action.as_str(), participants.len());

        let update = ParticipantUpdate {
            group,
            participants,
            action,
            connection: &self.connection,
            settings: &self.settings,
        };

        for observer in &self.participant_observers {
            if let Err(e) = observer.on_participants(&update).await {
                warn!(observer = observer.name(), chat = %group, "Participant observer error: {}", e);
            }
        }
    }

    async fn reply(&self, message: &InboundMessage, text: impl Into<String>) {
        let outgoing = OutgoingMessage::text(text).quoting(message);
        if let Err(e) = self.connection.send(&message.chat, outgoing).await {
            error!(chat = %message.chat, "Failed to send reply: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::CommandError;
    use crate::domain::entities::GlobalSettings;
    use crate::plugins::{CommandHandler, HandlerCatalog};
    use crate::test_support::{self, FakeConnection, ALICE, GROUP};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl CommandHandler for Counting {
        fn id(&self) -> &str {
            "count"
        }

        async fn run(&self, ctx: Context) -> Result<(), CommandError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            ctx.reply(format!("ok {}", ctx.args.join(","))).await
        }
    }

    struct Panicking;

    #[async_trait]
    impl CommandHandler for Panicking {
        fn id(&self) -> &str {
            "boom"
        }

        async fn run(&self, _ctx: Context) -> Result<(), CommandError> {
            panic!("handler bug");
        }
    }

    struct Recorder(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl MessageObserver for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn observe(&self, event: &ObservedMessage<'_>) -> Result<(), CommandError> {
            self.0.lock().unwrap().push(event.text.to_string());
            Err(CommandError::ExecutionFailed("observer failure is only logged".to_string()))
        }
    }

    struct Membership(Arc<Mutex<Vec<(String, usize)>>>);

    #[async_trait]
    impl ParticipantObserver for Membership {
        fn name(&self) -> &str {
            "membership"
        }

        async fn on_participants(&self, update: &ParticipantUpdate<'_>) -> Result<(), CommandError> {
            self.0
                .lock()
                .unwrap()
                .push((update.action.as_str().to_string(), update.participants.len()));
            Err(CommandError::ExecutionFailed("participant observer failure is only logged".to_string()))
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        connection: Arc<FakeConnection>,
        calls: Arc<AtomicUsize>,
        dispatcher: CommandDispatcher,
    }

    async fn harness(settings: GlobalSettings, connection: Arc<FakeConnection>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("plugins");
        test_support::write_manifest(&root, "general/count.yaml", "command: [count, c]\nhandler: count\ncooldown: 5\n");
        test_support::write_manifest(&root, "general/boom.yaml", "command: boom\nhandler: boom\ncooldown: 0\n");
        test_support::write_manifest(
            &root,
            "group/guard.yaml",
            "command: guard\nhandler: count\ngroup-only: true\nadmin-only: true\n",
        );

        let calls = Arc::new(AtomicUsize::new(0));
        let mut catalog = HandlerCatalog::new();
        catalog.register(Counting(Arc::clone(&calls))).unwrap();
        catalog.register(Panicking).unwrap();
        let registry = Arc::new(PluginRegistry::new(&root, Arc::new(catalog)));
        registry.load().unwrap();

        let settings = test_support::settings_store(dir.path(), settings).await;
        let dispatcher = CommandDispatcher::new(connection.clone(), registry, settings);

        Harness {
            _dir: dir,
            connection,
            calls,
            dispatcher,
        }
    }

    fn private(text: &str) -> InboundMessage {
        InboundMessage::from_text(Jid::new(ALICE), Jid::new(ALICE), text)
    }

    fn in_group(text: &str) -> InboundMessage {
        InboundMessage::from_text(Jid::new(GROUP), Jid::new(ALICE), text)
    }

    #[tokio::test]
    async fn test_plain_text_is_ignored_without_reply() {
        let h = harness(GlobalSettings::default(), FakeConnection::new()).await;
        let outcome = h.dispatcher.dispatch(private("hello there")).await;

        assert_eq!(outcome, DispatchOutcome::Ignored(IgnoreReason::NotCommand));
        assert!(h.connection.sent().is_empty());
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_alias_resolves_and_runs_handler() {
        let h = harness(GlobalSettings::default(), FakeConnection::new()).await;
        let outcome = h.dispatcher.dispatch(private(".C one two")).await;

        assert_eq!(outcome, DispatchOutcome::Executed { command: "c".to_string() });
        assert_eq!(h.connection.sent_texts(), vec!["ok one,two".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_command_is_silent() {
        let h = harness(GlobalSettings::default(), FakeConnection::new()).await;
        let outcome = h.dispatcher.dispatch(private(".nope")).await;

        assert_eq!(outcome, DispatchOutcome::Ignored(IgnoreReason::UnknownCommand("nope".to_string())));
        assert!(h.connection.sent().is_empty());
    }

    #[tokio::test]
    async fn test_own_and_status_messages_are_skipped() {
        let h = harness(GlobalSettings::default(), FakeConnection::new()).await;
        let own = private(".count").sent_by_me();
        assert_eq!(h.dispatcher.dispatch(own).await, DispatchOutcome::Ignored(IgnoreReason::OwnMessage));

        let status = InboundMessage::from_text(Jid::new("status@broadcast"), Jid::new(ALICE), ".count");
        assert_eq!(
            h.dispatcher.dispatch(status).await,
            DispatchOutcome::Ignored(IgnoreReason::StatusBroadcast)
        );

        let dev = harness(
            GlobalSettings {
                developer_mode: true,
                ..GlobalSettings::default()
            },
            FakeConnection::new(),
        )
        .await;
        assert!(dev.dispatcher.dispatch(private(".count").sent_by_me()).await.is_executed());
    }

    #[tokio::test]
    async fn test_custom_prefix_from_settings() {
        let h = harness(
            GlobalSettings {
                prefix: "!".to_string(),
                ..GlobalSettings::default()
            },
            FakeConnection::new(),
        )
        .await;
        assert_eq!(
            h.dispatcher.dispatch(private(".count")).await,
            DispatchOutcome::Ignored(IgnoreReason::NotCommand)
        );
        assert!(h.dispatcher.dispatch(private("!count")).await.is_executed());
    }

    #[tokio::test]
    async fn test_banned_and_private_mode_are_silent() {
        let banned = harness(
            GlobalSettings {
                banned: vec!["628111111111".to_string()],
                ..GlobalSettings::default()
            },
            FakeConnection::new(),
        )
        .await;
        assert_eq!(
            banned.dispatcher.dispatch(private(".count")).await,
            DispatchOutcome::Ignored(IgnoreReason::Banned)
        );
        assert!(banned.connection.sent().is_empty());

        let private_mode = harness(
            GlobalSettings {
                private_mode: true,
                ..GlobalSettings::default()
            },
            FakeConnection::new(),
        )
        .await;
        assert_eq!(
            private_mode.dispatcher.dispatch(private(".count")).await,
            DispatchOutcome::Ignored(IgnoreReason::PrivateMode)
        );
        assert!(private_mode.connection.sent().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_failure_means_not_admin() {
        let h = harness(GlobalSettings::default(), FakeConnection::new()).await;
        let outcome = h.dispatcher.dispatch(in_group(".guard")).await;

        assert!(matches!(outcome, DispatchOutcome::Denied { .. }));
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.connection.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_group_admin_passes_admin_check() {
        let connection = FakeConnection::with_group(test_support::group(&[ALICE], &[]));
        let h = harness(GlobalSettings::default(), connection).await;
        assert!(h.dispatcher.dispatch(in_group(".guard")).await.is_executed());
    }

    #[tokio::test]
    async fn test_cooldown_applies_to_aliases_and_not_owners() {
        let h = harness(GlobalSettings::default(), FakeConnection::new()).await;
        assert!(h.dispatcher.dispatch(private(".count")).await.is_executed());

        match h.dispatcher.dispatch(private(".c")).await {
            DispatchOutcome::CoolingDown { command, remaining_secs } => {
                assert_eq!(command, "c");
                assert!(remaining_secs > 0 && remaining_secs <= 5);
            }
            other => panic!("expected cooldown, got {:?}", other),
        }
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);

        let owner = harness(
            GlobalSettings {
                owners: vec!["628111111111".to_string()],
                ..GlobalSettings::default()
            },
            FakeConnection::new(),
        )
        .await;
        for _ in 0..3 {
            assert!(owner.dispatcher.dispatch(private(".count")).await.is_executed());
        }
        assert!(owner.dispatcher.cooldowns().is_empty());
    }

    #[tokio::test]
    async fn test_overridden_plugin_keeps_a_separate_cooldown() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("plugins");
        test_support::write_manifest(&root, "a_first/x.yaml", "command: [count, alpha]\nhandler: count\ncooldown: 30\n");
        test_support::write_manifest(&root, "b_second/y.yaml", "command: count\nhandler: count\ncooldown: 30\n");

        let calls = Arc::new(AtomicUsize::new(0));
        let mut catalog = HandlerCatalog::new();
        catalog.register(Counting(Arc::clone(&calls))).unwrap();
        let registry = Arc::new(PluginRegistry::new(&root, Arc::new(catalog)));
        registry.load().unwrap();

        let settings = test_support::settings_store(dir.path(), GlobalSettings::default()).await;
        let dispatcher = CommandDispatcher::new(FakeConnection::new(), registry, settings);

        assert_eq!(
            dispatcher.dispatch(private(".alpha")).await,
            DispatchOutcome::Executed { command: "alpha".to_string() }
        );
        assert_eq!(
            dispatcher.dispatch(private(".count")).await,
            DispatchOutcome::Executed { command: "count".to_string() }
        );
        assert!(matches!(
            dispatcher.dispatch(private(".alpha")).await,
            DispatchOutcome::CoolingDown { ref command, .. } if command == "alpha"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let h = harness(GlobalSettings::default(), FakeConnection::new()).await;
        let outcome = h.dispatcher.dispatch(private(".boom")).await;

        assert!(matches!(outcome, DispatchOutcome::Failed { ref command, .. } if command == "boom"));
        assert_eq!(h.connection.sent_texts(), vec![FAILURE_REPLY.to_string()]);

        assert!(h.dispatcher.dispatch(private(".count")).await.is_executed());
    }

    #[tokio::test]
    async fn test_observers_see_text_and_failures_do_not_block() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let h = harness(GlobalSettings::default(), FakeConnection::new()).await;
        let dispatcher = h.dispatcher.with_observer(Arc::new(Recorder(Arc::clone(&seen))));

        dispatcher.dispatch(private("just chatting")).await;
        assert!(dispatcher.dispatch(private(".count")).await.is_executed());

        assert_eq!(*seen.lock().unwrap(), vec!["just chatting".to_string(), ".count".to_string()]);
    }

    #[tokio::test]
    async fn test_participant_observers_run_for_groups_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let h = harness(GlobalSettings::default(), FakeConnection::new()).await;
        let dispatcher = h
            .dispatcher
            .with_participant_observer(Arc::new(Membership(Arc::clone(&seen))))
            .with_participant_observer(Arc::new(Membership(Arc::clone(&seen))));

        let joined = [Jid::new(ALICE), Jid::new(test_support::BOB)];
        dispatcher.participants_changed(&Jid::new(GROUP), &joined, ParticipantAction::Add).await;
        dispatcher.participants_changed(&Jid::new(ALICE), &joined, ParticipantAction::Remove).await;
        dispatcher.participants_changed(&Jid::new(GROUP), &[], ParticipantAction::Remove).await;

        // the first observer failing does not skip the second
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("add".to_string(), 2), ("add".to_string(), 2)]
        );
    }
}
