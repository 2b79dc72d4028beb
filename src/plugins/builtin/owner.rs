//! Owner commands: private/public mode, ban/unban, setprefix

use async_trait::async_trait;
use serde_json::json;

use super::resolve_targets;
use crate::application::errors::{CommandError, StorageError};
use crate::application::messaging::Context;
use crate::domain::entities::normalize_number;
use crate::plugins::CommandHandler;

/// `private` / `public` - toggle answering non-owners
pub struct Mode {
    id: &'static str,
    private: bool,
}

impl Mode {
    pub fn private() -> Self {
        Self {
            id: "mode-private",
            private: true,
        }
    }

    pub fn public() -> Self {
        Self {
            id: "mode-public",
            private: false,
        }
    }

    fn label(&self) -> &'static str {
        if self.private {
            "private"
        } else {
            "public"
        }
    }
}

#[async_trait]
impl CommandHandler for Mode {
    fn id(&self) -> &str {
        self.id
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        if ctx.settings.snapshot().await.private_mode == self.private {
            return ctx
                .reply(format!("⚠️ Bot is already in {} mode.", self.label()))
                .await;
        }

        ctx.settings.set("privateMode", json!(self.private)).await?;
        tracing::info!(sender = %ctx.sender, "Switched to {} mode", self.label());

        let text = if self.private {
            "✅ Bot is now in *private mode* and will only respond to owners."
        } else {
            "✅ Bot is now in *public mode* and will respond to everyone."
        };
        ctx.reply(text).await
    }
}

/// `ban` / `unban` - maintain the banned numbers list
pub struct Ban {
    id: &'static str,
    ban: bool,
}

impl Ban {
    pub fn ban() -> Self {
        Self { id: "ban", ban: true }
    }

    pub fn unban() -> Self {
        Self {
            id: "unban",
            ban: false,
        }
    }
}

#[async_trait]
impl CommandHandler for Ban {
    fn id(&self) -> &str {
        self.id
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        let targets = resolve_targets(&ctx);
        if targets.is_empty() {
            return ctx
                .reply(format!(
                    "❌ *Usage:* {} @user, a number, or reply to a message",
                    ctx.invocation()
                ))
                .await;
        }

        let settings = ctx.settings.snapshot().await;
        let mut banned = settings.banned.clone();
        let mut lines = Vec::new();

        for target in &targets {
            let number = normalize_number(target.user());
            let listed = banned.iter().any(|b| normalize_number(b) == number);

            if self.ban {
                if settings.is_owner(target) {
                    lines.push(format!("🛡️ {} is an owner.", target.mention()));
                } else if listed {
                    lines.push(format!("⚠️ {} is already banned.", target.mention()));
                } else {
                    banned.push(number);
                    lines.push(format!("⛔ {} is now banned.", target.mention()));
                }
            } else if listed {
                banned.retain(|b| normalize_number(b) != number);
                lines.push(format!("✅ {} is no longer banned.", target.mention()));
            } else {
                lines.push(format!("⚠️ {} was not banned.", target.mention()));
            }
        }

        if banned != settings.banned {
            ctx.settings.set("banned", json!(banned)).await?;
        }

        ctx.reply_with_mentions(lines.join("\n"), targets).await
    }
}

/// `setprefix` - change the command prefix
pub struct SetPrefix;

#[async_trait]
impl CommandHandler for SetPrefix {
    fn id(&self) -> &str {
        "setprefix"
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        let Some(prefix) = ctx.args.first() else {
            return ctx
                .reply(format!("⚙️ *Usage:* {} <new prefix>\nCurrent prefix: [{}]", ctx.invocation(), ctx.prefix))
                .await;
        };

        match ctx.settings.set("prefix", json!(prefix)).await {
            Ok(()) => ctx.reply(format!("✅ Prefix changed to [{}]", prefix)).await,
            Err(StorageError::InvalidValue { reason, .. }) => {
                ctx.reply(format!("❌ Invalid prefix: {}", reason)).await
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::application::messaging::{DispatchOutcome, IgnoreReason};
    use crate::domain::entities::{InboundMessage, Jid};
    use crate::plugins::builtin::tests::Bot;
    use crate::test_support::{FakeConnection, ALICE};

    fn from_alice(text: &str) -> InboundMessage {
        InboundMessage::from_text(Jid::new(ALICE), Jid::new(ALICE), text)
    }

    #[tokio::test]
    async fn test_private_mode_round_trip() {
        let bot = Bot::new(FakeConnection::new()).await;

        assert!(bot.owner_says(".private").await.is_executed());
        assert_eq!(
            bot.send(from_alice(".ping")).await,
            DispatchOutcome::Ignored(IgnoreReason::PrivateMode)
        );

        bot.owner_says(".private").await;
        assert!(bot.last_text().contains("already"));

        bot.owner_says(".public").await;
        assert!(bot.send(from_alice(".ping")).await.is_executed());
    }

    #[tokio::test]
    async fn test_ban_silences_user_until_unban() {
        let bot = Bot::new(FakeConnection::new()).await;

        bot.owner_says(".ban 628111111111").await;
        assert!(bot.last_text().contains("now banned"));
        assert_eq!(
            bot.send(from_alice(".ping")).await,
            DispatchOutcome::Ignored(IgnoreReason::Banned)
        );

        bot.owner_says(".unban 628222222222").await;
        assert!(bot.last_text().contains("was not banned"));

        bot.owner_says(".unban 628111111111").await;
        assert!(bot.last_text().contains("no longer banned"));
        assert!(bot.send(from_alice(".ping")).await.is_executed());
    }

    #[tokio::test]
    async fn test_owner_cannot_be_banned() {
        let bot = Bot::new(FakeConnection::new()).await;
        bot.owner_says(".ban 628999999999").await;
        assert!(bot.last_text().contains("is an owner"));
    }

    #[tokio::test]
    async fn test_setprefix_validates_and_applies() {
        let bot = Bot::new(FakeConnection::new()).await;

        bot.owner_says(".setprefix !").await;
        assert!(bot.last_text().contains("Prefix changed to [!]"));
        assert!(bot.send(from_alice("!ping")).await.is_executed());
        assert_eq!(
            bot.send(from_alice(".ping")).await,
            DispatchOutcome::Ignored(IgnoreReason::NotCommand)
        );

        bot.owner_says("!setprefix").await;
        assert!(bot.last_text().contains("Usage"));
    }
}
