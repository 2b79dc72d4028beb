use serde::{Deserialize, Serialize};
use std::fmt;

/// Server part used by regular user accounts
pub const USER_SERVER: &str = "s.whatsapp.net";

/// Server part used by group chats
pub const GROUP_SERVER: &str = "g.us";

/// Pseudo-chat that carries status updates
pub const STATUS_BROADCAST: &str = "status@broadcast";

/// WhatsApp identity (`user[:device]@server`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Jid(String);

impl Jid {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a user jid from a phone number, dropping anything that is not a digit
    pub fn from_number(number: &str) -> Self {
        Self(format!("{}@{}", normalize_number(number), USER_SERVER))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// User part without the device suffix (`263771234567:3@s.whatsapp.net` -> `263771234567`)
    pub fn user(&self) -> &str {
        let user = self.0.split('@').next().unwrap_or_default();
        user.split(':').next().unwrap_or_default()
    }

    pub fn server(&self) -> &str {
        self.0.split_once('@').map(|(_, server)| server).unwrap_or_default()
    }

    pub fn is_group(&self) -> bool {
        self.server() == GROUP_SERVER
    }

    pub fn is_status_broadcast(&self) -> bool {
        self.0 == STATUS_BROADCAST
    }

    /// Same account, ignoring device suffixes
    pub fn same_user(&self, other: &Jid) -> bool {
        self.user() == other.user() && self.server() == other.server()
    }

    /// `user@server` with the device suffix removed
    pub fn normalized(&self) -> Jid {
        Jid(format!("{}@{}", self.user(), self.server()))
    }

    /// Mention handle as rendered in message text
    pub fn mention(&self) -> String {
        format!("@{}", self.user())
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Jid {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Strip everything but digits from a phone number
pub fn normalize_number(number: &str) -> String {
    number.chars().filter(|c| c.is_ascii_digit()).collect()
}
