//! Console adapter for development/testing
//!
//! Each stdin line becomes an inbound message from the configured sender.
//! `/join <number>` and `/leave <number>` simulate membership changes in the
//! configured group. Replies and group actions are printed to stdout.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::application::errors::BotError;
use crate::domain::entities::{
    GroupMetadata, InboundMessage, Jid, OutgoingMessage, Participant, ParticipantAction,
};
use crate::domain::traits::{BotInfo, Connection, ConnectionEvent};
use crate::infrastructure::config::ConsoleConfig;

/// Typing this line ends the session
pub const QUIT_COMMAND: &str = "/quit";
pub const JOIN_COMMAND: &str = "/join";
pub const LEAVE_COMMAND: &str = "/leave";

struct ReaderState<R> {
    reader: R,
    opened: bool,
}

/// Console connection for local development
pub struct ConsoleAdapter<R = BufReader<Stdin>> {
    info: BotInfo,
    sender: Jid,
    chat: Jid,
    push_name: String,
    state: Mutex<ReaderState<R>>,
    announce: Mutex<bool>,
}

impl ConsoleAdapter {
    /// Console reading from the process stdin
    pub fn stdin(config: &ConsoleConfig, bot_name: &str, bot_number: Option<&str>) -> Self {
        Self::with_reader(config, bot_name, bot_number, BufReader::new(tokio::io::stdin()))
    }
}

impl<R> ConsoleAdapter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn with_reader(config: &ConsoleConfig, bot_name: &str, bot_number: Option<&str>, reader: R) -> Self {
        let sender = parse_jid(&config.sender);
        let chat = config.chat.as_deref().map(parse_jid).unwrap_or_else(|| sender.clone());

        Self {
            info: BotInfo {
                jid: Jid::from_number(bot_number.unwrap_or("0")),
                name: bot_name.to_string(),
            },
            sender,
            chat,
            push_name: config.push_name.clone(),
            state: Mutex::new(ReaderState { reader, opened: false }),
            announce: Mutex::new(false),
        }
    }

    pub fn chat(&self) -> &Jid {
        &self.chat
    }

    /// `None` when the line is not a membership command
    fn membership_event(&self, line: &str) -> Option<Result<ConnectionEvent, String>> {
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let action = match command {
            JOIN_COMMAND => ParticipantAction::Add,
            LEAVE_COMMAND => ParticipantAction::Remove,
            _ => return None,
        };

        if !self.chat.is_group() {
            return Some(Err(format!("{} needs a group chat in the console config", command)));
        }
        let participants: Vec<Jid> = rest.split_whitespace().map(parse_jid).collect();
        if participants.is_empty() {
            return Some(Err(format!("Usage: {} <number> [number...]", command)));
        }

        Some(Ok(ConnectionEvent::Participants {
            group: self.chat.clone(),
            participants,
            action,
        }))
    }
}

fn parse_jid(raw: &str) -> Jid {
    if raw.contains('@') {
        Jid::new(raw)
    } else {
        Jid::from_number(raw)
    }
}

#[async_trait]
impl<R> Connection for ConsoleAdapter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn connect(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode), chatting as {} in {}", self.sender, self.chat);
        Ok(())
    }

    async fn next_event(&self) -> Option<ConnectionEvent> {
        let mut state = self.state.lock().await;

        if !state.opened {
            state.opened = true;
            return Some(ConnectionEvent::Open);
        }

        loop {
            let mut line = String::new();
            match state.reader.read_line(&mut line).await {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    return None;
                }
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == QUIT_COMMAND {
                return None;
            }
            if let Some(event) = self.membership_event(line) {
                match event {
                    Ok(event) => return Some(event),
                    Err(reason) => {
                        println!("[CONSOLE] {}", reason);
                        continue;
                    }
                }
            }

            let message = InboundMessage::from_text(self.chat.clone(), self.sender.clone(), line)
                .with_push_name(self.push_name.clone());
            return Some(ConnectionEvent::Message(message));
        }
    }

    async fn send(&self, chat: &Jid, message: OutgoingMessage) -> Result<String, BotError> {
        println!("[BOT -> {}] {}", chat.user(), message.text);
        if !message.mentions.is_empty() {
            let mentions: Vec<String> = message.mentions.iter().map(Jid::mention).collect();
            println!("  [Mentions] {}", mentions.join(" "));
        }
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn group_metadata(&self, group: &Jid) -> Result<GroupMetadata, BotError> {
        if !group.is_group() {
            return Err(BotError::Connection(format!("{} is not a group", group)));
        }

        Ok(GroupMetadata {
            id: group.clone(),
            subject: "Console Group".to_string(),
            participants: vec![
                Participant::admin(self.sender.clone()),
                Participant::admin(self.info.jid.clone()),
            ],
            announce: *self.announce.lock().await,
        })
    }

    async fn update_participants(
        &self,
        group: &Jid,
        participants: &[Jid],
        action: ParticipantAction,
    ) -> Result<(), BotError> {
        let users: Vec<String> = participants.iter().map(Jid::mention).collect();
        println!("[GROUP {}] {} {}", group.user(), action.as_str(), users.join(" "));
        Ok(())
    }

    async fn set_announce(&self, group: &Jid, announce: bool) -> Result<(), BotError> {
        *self.announce.lock().await = announce;
        println!(
            "[GROUP {}] {}",
            group.user(),
            if announce { "closed to admins" } else { "opened to everyone" }
        );
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
