use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An incoming message reported by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    /// Transport-assigned message id.
    pub id: String,
    /// Chat the message belongs to (individual or group identifier).
    pub chat_id: String,
    /// Sender chat identifier. For group messages this is the group id.
    pub from: String,
    /// Recipient chat identifier.
    pub to: String,
    /// Actual author inside a group chat, when different from `from`.
    #[serde(default)]
    pub author: Option<String>,
    /// Human-readable sender name.
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Message text content.
    #[serde(default)]
    pub body: String,
    pub timestamp: DateTime<Utc>,
    /// Whether the bot's own account authored this message.
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub has_media: bool,
}

impl IncomingMessage {
    /// The user who wrote the message: the group participant if any, else the sender.
    pub fn author_id(&self) -> &str {
        self.author.as_deref().unwrap_or(&self.from)
    }

    /// A message the owner sent to their own chat.
    pub fn is_self_chat(&self) -> bool {
        self.from_me && self.from == self.to
    }
}

/// An outgoing message handed to the transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub text: String,
    /// Message id to quote (turns the send into a reply).
    #[serde(default)]
    pub quoted_id: Option<String>,
    /// Ask the transport to render a link preview.
    #[serde(default)]
    pub link_preview: bool,
    /// Remote media to attach (image, audio, document).
    #[serde(default)]
    pub media_url: Option<String>,
    /// Deliver audio media as a voice note.
    #[serde(default)]
    pub as_voice: bool,
}

impl OutgoingMessage {
    /// Plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Quote the given message id.
    pub fn quoting(mut self, id: &str) -> Self {
        self.quoted_id = Some(id.to_string());
        self
    }
}

/// Id of a message accepted by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the transport's chat list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub unread_count: u64,
    #[serde(default)]
    pub archived: bool,
}

/// Connectivity and identity of the messaging session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub connected: bool,
    /// Own chat identifier (e.g. `5511999999999@c.us`).
    #[serde(default)]
    pub wid: Option<String>,
    #[serde(default)]
    pub pushname: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}
