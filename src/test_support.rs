//! Shared fixtures for unit tests

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{
    GlobalSettings, GroupMetadata, Jid, OutgoingMessage, Participant, ParticipantAction,
};
use crate::domain::traits::{BotInfo, Connection, ConnectionEvent};
use crate::infrastructure::storage::JsonSettingsStore;

pub const GROUP: &str = "120363000000000000@g.us";
pub const BOT: &str = "628000000000@s.whatsapp.net";
pub const ALICE: &str = "628111111111@s.whatsapp.net";
pub const BOB: &str = "628222222222@s.whatsapp.net";
pub const OWNER: &str = "628999999999@s.whatsapp.net";

/// In-memory connection that records everything sent through it
#[derive(Default)]
pub struct FakeConnection {
    sent: Mutex<Vec<(Jid, OutgoingMessage)>>,
    group: Mutex<Option<GroupMetadata>>,
    updates: Mutex<Vec<(Vec<Jid>, ParticipantAction)>>,
    announces: Mutex<Vec<bool>>,
    events: Mutex<VecDeque<ConnectionEvent>>,
    connects: AtomicUsize,
    refuse_after: Mutex<Option<usize>>,
}

impl FakeConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_group(group: GroupMetadata) -> Arc<Self> {
        let connection = Self::default();
        *connection.group.lock().unwrap() = Some(group);
        Arc::new(connection)
    }

    pub fn with_events(events: Vec<ConnectionEvent>) -> Arc<Self> {
        let connection = Self::default();
        *connection.events.lock().unwrap() = events.into();
        Arc::new(connection)
    }

    pub fn set_group(&self, group: GroupMetadata) {
        *self.group.lock().unwrap() = Some(group);
    }

    /// Let the first `n` calls to `connect` succeed and refuse the rest
    pub fn refuse_connects_after(&self, n: usize) {
        *self.refuse_after.lock().unwrap() = Some(n);
    }

    pub fn sent(&self) -> Vec<(Jid, OutgoingMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, m)| m.text.clone()).collect()
    }

    pub fn updates(&self) -> Vec<(Vec<Jid>, ParticipantAction)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn announces(&self) -> Vec<bool> {
        self.announces.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn connect(&self) -> Result<(), BotError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        match *self.refuse_after.lock().unwrap() {
            Some(allowed) if attempt > allowed => Err(BotError::Connection("refused".to_string())),
            _ => Ok(()),
        }
    }

    async fn next_event(&self) -> Option<ConnectionEvent> {
        self.events.lock().unwrap().pop_front()
    }

    async fn send(&self, chat: &Jid, message: OutgoingMessage) -> Result<String, BotError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((chat.clone(), message));
        Ok(format!("MSG{}", sent.len()))
    }

    async fn group_metadata(&self, _group: &Jid) -> Result<GroupMetadata, BotError> {
        self.group
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BotError::Connection("metadata unavailable".to_string()))
    }

    async fn update_participants(
        &self,
        _group: &Jid,
        participants: &[Jid],
        action: ParticipantAction,
    ) -> Result<(), BotError> {
        self.updates.lock().unwrap().push((participants.to_vec(), action));
        Ok(())
    }

    async fn set_announce(&self, _group: &Jid, announce: bool) -> Result<(), BotError> {
        self.announces.lock().unwrap().push(announce);
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            jid: Jid::new(BOT),
            name: "Test Bot".to_string(),
        }
    }
}

/// Group with the given admins; everyone in `members` joins as a plain member
pub fn group(admins: &[&str], members: &[&str]) -> GroupMetadata {
    let participants = admins
        .iter()
        .map(|id| Participant::admin(Jid::new(*id)))
        .chain(members.iter().map(|id| Participant::member(Jid::new(*id))))
        .collect();

    GroupMetadata {
        id: Jid::new(GROUP),
        subject: "Test Group".to_string(),
        participants,
        announce: false,
    }
}

pub fn write_manifest(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

pub async fn settings_store(dir: &Path, settings: GlobalSettings) -> Arc<JsonSettingsStore> {
    Arc::new(
        JsonSettingsStore::load_with_defaults(dir.join("data"), settings)
            .await
            .unwrap(),
    )
}
