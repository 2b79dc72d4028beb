//! System commands: ping, menu, reload

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::errors::CommandError;
use crate::application::format::format_duration;
use crate::application::messaging::Context;
use crate::domain::entities::PluginDescriptor;
use crate::plugins::CommandHandler;

/// `ping` - liveness and latency
pub struct Ping {
    started: Instant,
}

impl Ping {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for Ping {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandHandler for Ping {
    fn id(&self) -> &str {
        "ping"
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        let latency = (Utc::now() - ctx.message.timestamp).num_milliseconds().max(0);
        ctx.reply(format!(
            "🏓 *Pong!*\n⚡ Latency: {} ms\n⏱️ Uptime: {}",
            latency,
            format_duration(self.started.elapsed())
        ))
        .await
    }
}

/// `menu` - command listing, or search with an argument
pub struct Menu {
    bot_name: String,
    started: Instant,
}

impl Menu {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            started: Instant::now(),
        }
    }

    fn listing(&self, ctx: &Context, descriptors: &[Arc<PluginDescriptor>]) -> String {
        let mut by_category: BTreeMap<&str, Vec<&PluginDescriptor>> = BTreeMap::new();
        for descriptor in descriptors {
            by_category
                .entry(descriptor.category.as_str())
                .or_default()
                .push(descriptor);
        }

        let mut text = format!(
            "*{}*\n\n> Prefix: [{}]\n> User: {}\n> Commands: {}\n> Uptime: {}\n",
            self.bot_name,
            ctx.prefix,
            ctx.push_name,
            descriptors.len(),
            format_duration(self.started.elapsed())
        );

        for (category, commands) in by_category {
            text.push_str(&format!("\n*{}*\n", category.to_uppercase()));
            for descriptor in commands {
                text.push_str(&format!("> {}{}\n", ctx.prefix, descriptor.primary_name()));
            }
        }

        text.push_str(&format!("\n_Type {}menu <word> to search._", ctx.prefix));
        text
    }

    fn results(ctx: &Context, query: &str, hits: &[Arc<PluginDescriptor>]) -> String {
        if hits.is_empty() {
            return format!("🔍 No commands match *{}*.", query);
        }

        let mut text = format!("🔍 *{} result(s) for {}*\n", hits.len(), query);
        for descriptor in hits {
            text.push_str(&format!(
                "\n*{}{}* - {}",
                ctx.prefix,
                descriptor.primary_name(),
                descriptor.description
            ));
            if !descriptor.aliases().is_empty() {
                text.push_str(&format!("\n  Aliases: {}", descriptor.aliases().join(", ")));
            }
            if let Some(usage) = &descriptor.usage {
                text.push_str(&format!("\n  Usage: {}", usage));
            }
        }
        text
    }
}

#[async_trait]
impl CommandHandler for Menu {
    fn id(&self) -> &str {
        "menu"
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        let text = if ctx.text.is_empty() {
            self.listing(&ctx, &ctx.registry.descriptors())
        } else {
            Self::results(&ctx, &ctx.text, &ctx.registry.search(&ctx.text))
        };
        ctx.reply(text).await
    }
}

/// `reload` - rebuild the command table from disk
pub struct Reload;

#[async_trait]
impl CommandHandler for Reload {
    fn id(&self) -> &str {
        "reload"
    }

    async fn run(&self, ctx: Context) -> Result<(), CommandError> {
        let registry = Arc::clone(&ctx.registry);
        let result = tokio::task::spawn_blocking(move || registry.reload())
            .await
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                return ctx
                    .reply(format!("❌ Reload failed, keeping the current commands.\n{}", e))
                    .await
            }
        };

        let mut text = format!(
            "♻️ *Plugins reloaded*\n✅ Loaded: {}\n❌ Failed: {}\n⏭️ Skipped: {}\n📋 Commands: {}",
            report.loaded, report.failed, report.skipped, report.commands
        );
        for failure in &report.failures {
            text.push_str(&format!("\n• {}: {}", failure.path.display(), failure.reason));
        }
        ctx.reply(text).await
    }
}
