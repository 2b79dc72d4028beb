use super::Jid;
use chrono::{DateTime, Utc};

/// Decoded message payload, one variant per content kind the bot understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Conversation(String),
    ExtendedText { text: String },
    Image { caption: Option<String> },
    Video { caption: Option<String> },
    Other { kind: String },
}

impl MessageContent {
    /// Displayable text: direct text, extended text, or a media caption
    pub fn text(&self) -> Option<&str> {
        let text = match self {
            MessageContent::Conversation(text) => Some(text.as_str()),
            MessageContent::ExtendedText { text } => Some(text.as_str()),
            MessageContent::Image { caption } | MessageContent::Video { caption } => {
                caption.as_deref()
            }
            MessageContent::Other { .. } => None,
        };
        text.filter(|t| !t.is_empty())
    }

    pub fn kind(&self) -> &str {
        match self {
            MessageContent::Conversation(_) => "conversation",
            MessageContent::ExtendedText { .. } => "extendedText",
            MessageContent::Image { .. } => "image",
            MessageContent::Video { .. } => "video",
            MessageContent::Other { kind } => kind,
        }
    }
}

/// Message a user replied to
#[derive(Debug, Clone)]
pub struct QuotedMessage {
    pub id: String,
    pub sender: Jid,
    pub content: MessageContent,
}

/// Inbound message as handed over by the connection
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: String,
    pub chat: Jid,
    /// Participant in groups, the chat itself in private chats
    pub sender: Jid,
    pub push_name: Option<String>,
    pub from_me: bool,
    pub content: MessageContent,
    pub mentioned: Vec<Jid>,
    pub quoted: Option<QuotedMessage>,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(chat: Jid, sender: Jid, content: MessageContent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string().to_uppercase(),
            chat,
            sender,
            push_name: None,
            from_me: false,
            content,
            mentioned: Vec::new(),
            quoted: None,
            timestamp: Utc::now(),
        }
    }

    pub fn from_text(chat: Jid, sender: Jid, text: impl Into<String>) -> Self {
        Self::new(chat, sender, MessageContent::Conversation(text.into()))
    }

    pub fn with_push_name(mut self, name: impl Into<String>) -> Self {
        self.push_name = Some(name.into());
        self
    }

    pub fn with_mentions(mut self, mentioned: Vec<Jid>) -> Self {
        self.mentioned = mentioned;
        self
    }

    pub fn with_quoted(mut self, quoted: QuotedMessage) -> Self {
        self.quoted = Some(quoted);
        self
    }

    pub fn sent_by_me(mut self) -> Self {
        self.from_me = true;
        self
    }

    pub fn is_group(&self) -> bool {
        self.chat.is_group()
    }

    pub fn text(&self) -> Option<&str> {
        self.content.text()
    }
}

/// Outgoing text message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub mentions: Vec<Jid>,
    /// Id of the message being quoted
    pub quoted: Option<String>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_mentions(mut self, mentions: Vec<Jid>) -> Self {
        self.mentions = mentions;
        self
    }

    pub fn quoting(mut self, message: &InboundMessage) -> Self {
        self.quoted = Some(message.id.clone());
        self
    }
}
