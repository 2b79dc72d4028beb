//! Group moderation commands and the antilink observer

use async_trait::async_trait;
use chrono::Local;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde_json::json;
use tracing::{info, warn};

use super::{resolve_targets, ANTILINK_SETTING};
use crate::application::errors::CommandError;
use crate::application::messaging::Context;
use crate::domain::entities::{GroupMetadata, OutgoingMessage, ParticipantAction, ParticipantRole};
use crate::plugins::{CommandHandler, MessageObserver, ObservedMessage};

static LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://|www\.)\S+|\b[a-z0-9][a-z0-9-]*\.(?:com|net|org|io|me|co|gg|ly|app|xyz|link)\b")
        .expect("valid regex")
});

/// Metadata fetched by the dispatcher, or a fresh fetch when it had none
async fn group_of(ctx: &Context) -> Result<GroupMetadata, CommandError> {
    match &ctx.group {
        Some(group) => Ok(group.clone()),
        None => Ok(ctx.connection.group_metadata(&ctx.chat).await?),
    }
}

pub(super) fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `kick` - remove members named by mention, reply, or number
pub struct Kick;

#[async_trait]
impl CommandHandler for Kick {
    fn id(&self) -> &str {
        "kick"
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        let targets = resolve_targets(&ctx);
        if targets.is_empty() {
            return ctx
                .reply(format!(
                    "❌ *Usage:* {0} @user or reply to a message\n\n📝 *Examples:*\n{0} @user\n{0} 263771234567",
                    ctx.invocation()
                ))
                .await;
        }

        let group = group_of(&ctx).await?;
        let bot = ctx.connection.bot_info().jid;
        let mut results = Vec::new();
        let mut kicked = 0;

        for target in &targets {
            let Some(participant) = group.participant(target) else {
                results.push(format!("❌ {} is not in this group.", target.mention()));
                continue;
            };

            if target.same_user(&ctx.sender) {
                results.push(format!("🤔 {} tried to kick themselves.", target.mention()));
            } else if target.same_user(&bot) {
                results.push("🤖 Nice try! I can't kick myself.".to_string());
            } else if participant.is_admin() {
                results.push(format!("🛡️ Cannot kick {}, they're an admin.", target.mention()));
            } else {
                let removal = ctx
                    .connection
                    .update_participants(&ctx.chat, std::slice::from_ref(&participant.id), ParticipantAction::Remove)
                    .await;
                match removal {
                    Ok(()) => {
                        info!(chat = %ctx.chat, "{} kicked by {}", target.user(), ctx.sender.user());
                        results.push(format!("✅ {} has been *kicked*.", target.mention()));
                        kicked += 1;
                    }
                    Err(e) => {
                        warn!(chat = %ctx.chat, "Failed to kick {}: {}", target.user(), e);
                        results.push(format!("❌ Failed to kick {}.", target.mention()));
                    }
                }
            }
        }

        let text = format!(
            "👢 *Kick complete*\n\n✅ Successful: {}\n❌ Failed: {}\n\n{}\n\n👤 *Executor:* {}\n⏰ *Time:* {}",
            kicked,
            targets.len() - kicked,
            results.iter().map(|r| format!("• {}", r)).collect::<Vec<_>>().join("\n"),
            ctx.sender.mention(),
            timestamp()
        );

        let mut mentions = vec![ctx.sender.clone()];
        mentions.extend(targets);
        ctx.reply_with_mentions(text, mentions).await
    }
}

/// `antilink on|off` - per-group link enforcement toggle
pub struct Antilink;

#[async_trait]
impl CommandHandler for Antilink {
    fn id(&self) -> &str {
        "antilink"
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        let choice = ctx.args.first().map(|a| a.to_lowercase());
        let enable = match choice.as_deref() {
            Some("on") => true,
            Some("off") => false,
            _ => {
                let enabled = ctx
                    .settings
                    .get_group_setting(&ctx.chat, ANTILINK_SETTING)
                    .await
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                return ctx
                    .reply(format!(
                        "⚙️ *Usage:* {} on/off\nCurrently: *{}*",
                        ctx.invocation(),
                        if enabled { "enabled" } else { "disabled" }
                    ))
                    .await;
            }
        };

        ctx.settings
            .set_group_setting(&ctx.chat, ANTILINK_SETTING, json!(enable))
            .await?;

        let text = if enable {
            "✅ Antilink is now *enabled*."
        } else {
            "❌ Antilink is now *disabled*."
        };
        ctx.reply(text).await
    }
}

/// Removes non-admins who post links in groups with antilink enabled
pub struct LinkObserver;

impl LinkObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinkObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageObserver for LinkObserver {
    fn name(&self) -> &str {
        "antilink"
    }

    async fn observe(&self, event: &ObservedMessage<'_>) -> Result<(), CommandError> {
        let message = event.message;
        if !message.is_group() || message.from_me || !LINK.is_match(event.text) {
            return Ok(());
        }

        let enabled = event
            .settings
            .get_group_setting(&message.chat, ANTILINK_SETTING)
            .await
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !enabled || event.settings.snapshot().await.is_owner(&message.sender) {
            return Ok(());
        }

        let group = event.connection.group_metadata(&message.chat).await?;
        let sender = &message.sender;
        let mentions = vec![sender.clone()];

        if group.is_admin(sender) {
            let notice = format!("⚠️ Admin {} sent a link. Not removing.", sender.mention());
            event
                .connection
                .send(&message.chat, OutgoingMessage::text(notice).with_mentions(mentions))
                .await?;
            return Ok(());
        }

        if !group.is_admin(&event.connection.bot_info().jid) {
            let notice = format!(
                "🚫 Link detected from {}, but I need to be *admin* to remove them.",
                sender.mention()
            );
            event
                .connection
                .send(&message.chat, OutgoingMessage::text(notice).with_mentions(mentions))
                .await?;
            return Ok(());
        }

        let notice = format!("🚫 Link detected from {}! Removing...", sender.mention());
        event
            .connection
            .send(&message.chat, OutgoingMessage::text(notice).with_mentions(mentions))
            .await?;
        event
            .connection
            .update_participants(&message.chat, std::slice::from_ref(sender), ParticipantAction::Remove)
            .await?;
        info!(chat = %message.chat, "Removed {} for posting a link", sender.user());
        Ok(())
    }
}

/// `tagall [message]` - mention every participant
pub struct TagAll;

#[async_trait]
impl CommandHandler for TagAll {
    fn id(&self) -> &str {
        "tagall"
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        let group = group_of(&ctx).await?;
        if group.participants.is_empty() {
            return ctx.reply("⚠️ No participants found in this group.").await;
        }

        let announcement = if ctx.text.is_empty() {
            "📢 *Attention everyone!*".to_string()
        } else {
            ctx.text.clone()
        };

        let admins = group.participants.iter().filter(|p| p.is_admin()).count();
        let list: Vec<String> = group
            .participants
            .iter()
            .map(|p| {
                let role = match p.role {
                    ParticipantRole::SuperAdmin => "👑",
                    ParticipantRole::Admin => "👮",
                    ParticipantRole::Member => "👤",
                };
                format!("{} {}", role, p.id.mention())
            })
            .collect();

        let text = format!(
            "📢 *Group Announcement*\n\n📋 *Message:* {}\n\n👥 *Participants:* {}\n👮 *Admins:* {}\n👤 *Members:* {}\n🏷️ *Group:* {}\n\n{}",
            announcement,
            group.participants.len(),
            admins,
            group.participants.len() - admins,
            group.subject,
            list.join("\n")
        );

        let mentions = group.participants.iter().map(|p| p.id.clone()).collect();
        ctx.send(OutgoingMessage::text(text).with_mentions(mentions).quoting(&ctx.message))
            .await
    }
}

/// `closegc` / `opengc` - restrict sending to admins or open it to everyone
pub struct GroupLock {
    id: &'static str,
    announce: bool,
}

impl GroupLock {
    pub fn close() -> Self {
        Self {
            id: "group-close",
            announce: true,
        }
    }

    pub fn open() -> Self {
        Self {
            id: "group-open",
            announce: false,
        }
    }
}

#[async_trait]
impl CommandHandler for GroupLock {
    fn id(&self) -> &str {
        self.id
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        let group = group_of(&ctx).await?;

        if group.announce == self.announce {
            let text = if self.announce {
                "🔒 *Group is already closed!*\nOnly admins can send messages."
            } else {
                "🔓 *Group is already open!*\nEveryone can send messages."
            };
            return ctx.reply(text).await;
        }

        ctx.connection.set_announce(&ctx.chat, self.announce).await?;
        info!(chat = %ctx.chat, announce = self.announce, "Group settings changed by {}", ctx.sender.user());

        let (title, status) = if self.announce {
            ("✅ *Group Closed!*", "Closed (admins only)")
        } else {
            ("✅ *Group Opened!*", "Open (everyone)")
        };
        let text = format!(
            "{}\n\n🔐 *Status:* {}\n👤 *By:* {}\n⏰ *Time:* {}",
            title,
            status,
            ctx.sender.mention(),
            timestamp()
        );
        ctx.reply_with_mentions(text, vec![ctx.sender.clone()]).await
    }
}
