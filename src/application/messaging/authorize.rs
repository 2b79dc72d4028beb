//! Authorization checks applied before a command runs

use std::fmt;

use crate::domain::entities::PluginFlags;

pub const OWNER_ONLY_REPLY: &str = "❌ This command is only for owners.";
pub const GROUP_ONLY_REPLY: &str = "❌ This command only works in groups.";
pub const PRIVATE_ONLY_REPLY: &str = "❌ This command only works in private chat.";
pub const ADMIN_ONLY_REPLY: &str = "❌ You must be an *admin* to use this command.";
pub const BOT_ADMIN_REPLY: &str = "❌ I need to be *admin* to do that.";

/// Facts about the sender and chat that the checks depend on
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessFacts {
    pub is_owner: bool,
    pub is_banned: bool,
    pub private_mode: bool,
    pub is_group: bool,
    pub is_admin: bool,
    pub is_bot_admin: bool,
}

/// Why a command was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// Drop without answering
    Silent(SilentReason),
    /// Answer with this text
    Reply(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilentReason {
    Banned,
    PrivateMode,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::Silent(SilentReason::Banned) => write!(f, "sender is banned"),
            Denial::Silent(SilentReason::PrivateMode) => write!(f, "private mode"),
            Denial::Reply(msg) => write!(f, "{}", msg),
        }
    }
}

/// Run the checks in order; the first failing one decides
///
/// Banned → private mode → owner-only → group/private context → sender
/// admin → bot admin. Owners pass the owner-only and admin checks.
pub fn authorize(flags: &PluginFlags, facts: &AccessFacts) -> Result<(), Denial> {
    if facts.is_banned {
        return Err(Denial::Silent(SilentReason::Banned));
    }

    if facts.private_mode && !facts.is_owner {
        return Err(Denial::Silent(SilentReason::PrivateMode));
    }

    if flags.owner_only && !facts.is_owner {
        return Err(Denial::Reply(OWNER_ONLY_REPLY));
    }

    if flags.group_only && !facts.is_group {
        return Err(Denial::Reply(GROUP_ONLY_REPLY));
    }

    if flags.private_only && facts.is_group {
        return Err(Denial::Reply(PRIVATE_ONLY_REPLY));
    }

    if flags.admin_only && !(facts.is_admin || facts.is_owner) {
        return Err(Denial::Reply(ADMIN_ONLY_REPLY));
    }

    if flags.bot_admin_required && facts.is_group && !facts.is_bot_admin {
        return Err(Denial::Reply(BOT_ADMIN_REPLY));
    }

    Ok(())
}
