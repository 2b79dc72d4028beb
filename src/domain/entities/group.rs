use super::Jid;

/// Role of a participant inside a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Member,
    Admin,
    SuperAdmin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: Jid,
    pub role: ParticipantRole,
}

impl Participant {
    pub fn member(id: Jid) -> Self {
        Self {
            id,
            role: ParticipantRole::Member,
        }
    }

    pub fn admin(id: Jid) -> Self {
        Self {
            id,
            role: ParticipantRole::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, ParticipantRole::Admin | ParticipantRole::SuperAdmin)
    }
}

/// Group metadata as reported by the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMetadata {
    pub id: Jid,
    pub subject: String,
    pub participants: Vec<Participant>,
    /// Only admins may send messages
    pub announce: bool,
}

impl GroupMetadata {
    pub fn participant(&self, jid: &Jid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id.same_user(jid))
    }

    pub fn is_admin(&self, jid: &Jid) -> bool {
        self.participant(jid).map(Participant::is_admin).unwrap_or(false)
    }
}

/// Membership change requested from the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantAction {
    Add,
    Remove,
    Promote,
    Demote,
}

impl ParticipantAction {
    pub fn as_str(&self) -> &str {
        match self {
            ParticipantAction::Add => "add",
            ParticipantAction::Remove => "remove",
            ParticipantAction::Promote => "promote",
            ParticipantAction::Demote => "demote",
        }
    }
}
