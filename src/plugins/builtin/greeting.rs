//! Welcome and goodbye messages for group membership changes

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use super::group::timestamp;
use crate::application::errors::CommandError;
use crate::application::messaging::Context;
use crate::domain::entities::{GroupMetadata, Jid, OutgoingMessage, ParticipantAction};
use crate::domain::traits::SettingsStore;
use crate::plugins::{CommandHandler, ParticipantObserver, ParticipantUpdate};

/// Group settings toggled by `welcome` and `goodbye`
pub const WELCOME_SETTING: &str = "welcome";
pub const WELCOME_MESSAGE_SETTING: &str = "welcomeMessage";
pub const GOODBYE_SETTING: &str = "goodbye";
pub const GOODBYE_MESSAGE_SETTING: &str = "goodbyeMessage";

const DEFAULT_WELCOME: &str = "👋 Hi {user}, welcome to *{group}* 🎉\n\n\
We're glad to have you here! Say hello, read the group description, and keep it friendly.\n\n\
👥 *Members:* {members}\n⏰ *Joined:* {time}";

const DEFAULT_GOODBYE: &str = "👋 {user} just left *{group}*. Take care!\n\n⏰ *Time:* {time}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Greeting {
    Welcome,
    Goodbye,
}

impl Greeting {
    fn for_action(action: ParticipantAction) -> Option<Self> {
        match action {
            ParticipantAction::Add => Some(Greeting::Welcome),
            ParticipantAction::Remove => Some(Greeting::Goodbye),
            ParticipantAction::Promote | ParticipantAction::Demote => None,
        }
    }

    fn toggle_key(self) -> &'static str {
        match self {
            Greeting::Welcome => WELCOME_SETTING,
            Greeting::Goodbye => GOODBYE_SETTING,
        }
    }

    fn message_key(self) -> &'static str {
        match self {
            Greeting::Welcome => WELCOME_MESSAGE_SETTING,
            Greeting::Goodbye => GOODBYE_MESSAGE_SETTING,
        }
    }

    fn default_template(self) -> &'static str {
        match self {
            Greeting::Welcome => DEFAULT_WELCOME,
            Greeting::Goodbye => DEFAULT_GOODBYE,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Greeting::Welcome => "Welcome",
            Greeting::Goodbye => "Goodbye",
        }
    }

    async fn enabled(self, settings: &dyn SettingsStore, group: &Jid) -> bool {
        settings
            .get_group_setting(group, self.toggle_key())
            .await
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    async fn custom_template(self, settings: &dyn SettingsStore, group: &Jid) -> Option<String> {
        settings
            .get_group_setting(group, self.message_key())
            .await
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|t| !t.trim().is_empty())
    }
}

/// Fill `{user}`, `{group}`, `{members}` and `{time}`
fn render(template: &str, user: &Jid, group: &GroupMetadata) -> String {
    template
        .replace("{user}", &user.mention())
        .replace("{group}", &group.subject)
        .replace("{members}", &group.participants.len().to_string())
        .replace("{time}", &timestamp())
}

/// Greets members who join and sees off members who leave, per group toggle
pub struct Greeter;

impl Greeter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Greeter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParticipantObserver for Greeter {
    fn name(&self) -> &str {
        "greeter"
    }

    async fn on_participants(&self, update: &ParticipantUpdate<'_>) -> Result<(), CommandError> {
        let Some(greeting) = Greeting::for_action(update.action) else {
            return Ok(());
        };

        let settings = update.settings.as_ref();
        if !greeting.enabled(settings, update.group).await {
            return Ok(());
        }

        let template = greeting
            .custom_template(settings, update.group)
            .await
            .unwrap_or_else(|| greeting.default_template().to_string());
        let metadata = update.connection.group_metadata(update.group).await?;
        let bot = update.connection.bot_info().jid;

        for user in update.participants {
            if user.same_user(&bot) {
                continue;
            }

            let text = render(&template, user, &metadata);
            let message = OutgoingMessage::text(text).with_mentions(vec![user.clone()]);
            match update.connection.send(update.group, message).await {
                Ok(_) => info!(chat = %update.group, "{} message sent for {}", greeting.label(), user.user()),
                Err(e) => warn!(chat = %update.group, "Failed to send {} message for {}: {}", greeting.label(), user.user(), e),
            }
        }
        Ok(())
    }
}

/// `welcome` / `goodbye` - `on`, `off`, `custom <message>`, or show status
pub struct GreetingToggle {
    id: &'static str,
    greeting: Greeting,
}

impl GreetingToggle {
    pub fn welcome() -> Self {
        Self {
            id: "welcome",
            greeting: Greeting::Welcome,
        }
    }

    pub fn goodbye() -> Self {
        Self {
            id: "goodbye",
            greeting: Greeting::Goodbye,
        }
    }

    async fn status(&self, ctx: &Context) -> Result<(), CommandError> {
        let settings = ctx.settings.as_ref();
        let enabled = self.greeting.enabled(settings, &ctx.chat).await;
        let custom = self.greeting.custom_template(settings, &ctx.chat).await;

        let mut text = format!(
            "⚙️ *{} Settings*\n\n📊 *Status:* {}\n🎮 *Type:* {}\n",
            self.greeting.label(),
            if enabled { "✅ *ENABLED*" } else { "❌ *DISABLED*" },
            if custom.is_some() { "custom" } else { "default" }
        );
        if let Some(custom) = custom {
            text.push_str(&format!("📝 *Custom Message:* {}\n", custom));
        }
        text.push_str(&format!(
            "\n📝 *Usage:*\n{0} on\n{0} off\n{0} custom <message>\n\n💡 *Placeholders:* {{user}} {{group}} {{members}} {{time}}",
            ctx.invocation()
        ));
        ctx.reply(text).await
    }
}

#[async_trait]
impl CommandHandler for GreetingToggle {
    fn id(&self) -> &str {
        self.id
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        let key = self.greeting.toggle_key();
        let label = self.greeting.label();

        match ctx.args.first().map(|a| a.to_lowercase()).as_deref() {
            Some("on") => {
                ctx.settings.set_group_setting(&ctx.chat, key, json!(true)).await?;
                ctx.reply(format!("✅ *{} messages enabled!*", label)).await
            }
            Some("off") => {
                ctx.settings.set_group_setting(&ctx.chat, key, json!(false)).await?;
                ctx.reply(format!("❌ *{} messages disabled.*", label)).await
            }
            Some("custom") => {
                let message = ctx.args[1..].join(" ");
                if message.is_empty() {
                    return ctx
                        .reply(format!(
                            "📝 *Usage:* {} custom <your message>\n\n💡 *Placeholders:* {{user}} {{group}} {{members}} {{time}}",
                            ctx.invocation()
                        ))
                        .await;
                }

                ctx.settings
                    .set_group_setting(&ctx.chat, self.greeting.message_key(), json!(message))
                    .await?;
                ctx.settings.set_group_setting(&ctx.chat, key, json!(true)).await?;
                ctx.reply(format!("✅ *Custom {} message set!*\n\n📝 Message: {}", label.to_lowercase(), message))
                    .await
            }
            _ => self.status(&ctx).await,
        }
    }
}
