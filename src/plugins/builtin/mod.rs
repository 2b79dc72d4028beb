//! Built-in command handlers
//!
//! Every handler here is registered under a fixed id. The manifests shipped
//! in `plugins/` bind command names to these ids.

pub mod ai;
pub mod greeting;
pub mod group;
pub mod owner;
pub mod system;

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::application::errors::PluginError;
use crate::application::messaging::Context;
use crate::domain::entities::Jid;
use crate::plugins::{HandlerCatalog, MessageObserver, ParticipantObserver};

pub use ai::{AiChat, AiSettings};
pub use greeting::{Greeter, GreetingToggle};
pub use group::{Antilink, GroupLock, Kick, LinkObserver, TagAll};
pub use owner::{Ban, Mode, SetPrefix};
pub use system::{Menu, Ping, Reload};

/// Group setting toggled by `antilink` and read by `LinkObserver`
pub const ANTILINK_SETTING: &str = "antilink";

static PHONE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{5,}").expect("valid regex"));

/// Knobs for the built-in handlers
#[derive(Debug, Clone)]
pub struct BuiltinOptions {
    /// Shown in the menu header
    pub bot_name: String,
    /// `None` leaves the AI command answering that it is not configured
    pub ai: Option<AiSettings>,
}

impl Default for BuiltinOptions {
    fn default() -> Self {
        Self {
            bot_name: "Mahachi Bot".to_string(),
            ai: None,
        }
    }
}

/// Register every built-in handler
pub fn register_all(catalog: &mut HandlerCatalog, options: &BuiltinOptions) -> Result<(), PluginError> {
    catalog.register(Ping::new())?;
    catalog.register(Menu::new(options.bot_name.clone()))?;
    catalog.register(Reload)?;

    catalog.register(Mode::private())?;
    catalog.register(Mode::public())?;
    catalog.register(Ban::ban())?;
    catalog.register(Ban::unban())?;
    catalog.register(SetPrefix)?;

    catalog.register(Kick)?;
    catalog.register(Antilink)?;
    catalog.register(TagAll)?;
    catalog.register(GroupLock::close())?;
    catalog.register(GroupLock::open())?;
    catalog.register(GreetingToggle::welcome())?;
    catalog.register(GreetingToggle::goodbye())?;

    catalog.register(AiChat::new(options.ai.clone())?)?;
    Ok(())
}

/// Catalog holding only the built-in handlers
pub fn catalog(options: &BuiltinOptions) -> Result<HandlerCatalog, PluginError> {
    let mut catalog = HandlerCatalog::new();
    register_all(&mut catalog, options)?;
    Ok(catalog)
}

/// Observers that back built-in features
pub fn observers() -> Vec<Arc<dyn MessageObserver>> {
    vec![Arc::new(LinkObserver::new())]
}

/// Observers notified when group membership changes
pub fn participant_observers() -> Vec<Arc<dyn ParticipantObserver>> {
    vec![Arc::new(Greeter::new())]
}

/// Users a moderation command targets: quoted sender, mentions, then bare
/// numbers of five or more digits in the arguments. Duplicates removed.
pub(crate) fn resolve_targets(ctx: &Context) -> Vec<Jid> {
    let mut targets: Vec<Jid> = Vec::new();

    let quoted = ctx.quoted().map(|q| q.sender.clone());
    let mentioned = ctx.mentioned().iter().cloned();
    let numbers = PHONE_NUMBER
        .find_iter(&ctx.text)
        .map(|m| Jid::from_number(m.as_str()));

    for jid in quoted.into_iter().chain(mentioned).chain(numbers) {
        let jid = jid.normalized();
        if !targets.iter().any(|t| t.same_user(&jid)) {
            targets.push(jid);
        }
    }
    targets
}
