//! Recording mocks for the transport and AI service.

use async_trait::async_trait;
use chrono::Utc;
use sidekick_core::{
    error::SidekickError,
    message::{ChatSummary, IncomingMessage, MessageId, OutgoingMessage, SessionStatus},
    service::{AiReply, AiRequest},
    traits::{AiService, Transport},
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// The bot owner's own chat id.
pub const OWNER: &str = "5511000000000@c.us";

/// One call to `send`/`reply`.
#[derive(Debug, Clone)]
pub struct Sent {
    pub chat_id: String,
    pub message: OutgoingMessage,
    /// True when issued through `reply` (quoting a message).
    pub via_reply: bool,
}

/// A transport that records every outbound message.
pub struct MockTransport {
    pub sent: Arc<Mutex<Vec<Sent>>>,
    pub archived: Arc<Mutex<Vec<String>>>,
    pub fetched: Arc<Mutex<Vec<(String, usize)>>>,
    pub history: Vec<IncomingMessage>,
    pub chats: Vec<ChatSummary>,
    /// When true, every call fails (simulates a dropped session).
    pub fail: bool,
    /// Sends to this chat fail; everything else works.
    pub fail_for: Option<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            archived: Arc::new(Mutex::new(Vec::new())),
            fetched: Arc::new(Mutex::new(Vec::new())),
            history: Vec::new(),
            chats: Vec::new(),
            fail: false,
            fail_for: None,
        }
    }

    pub fn failing_for(chat_id: &str) -> Self {
        Self {
            fail_for: Some(chat_id.to_string()),
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    fn check(&self) -> Result<(), SidekickError> {
        if self.fail {
            Err(SidekickError::Transport("connection reset".into()))
        } else {
            Ok(())
        }
    }

    fn check_chat(&self, chat_id: &str) -> Result<(), SidekickError> {
        self.check()?;
        if self.fail_for.as_deref() == Some(chat_id) {
            return Err(SidekickError::Transport(format!("cannot reach {chat_id}")));
        }
        Ok(())
    }

    fn record(&self, chat_id: &str, message: OutgoingMessage, via_reply: bool) -> MessageId {
        let mut sent = self.sent.lock().unwrap();
        sent.push(Sent {
            chat_id: chat_id.to_string(),
            message,
            via_reply,
        });
        MessageId(format!("sent-{}", sent.len()))
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, SidekickError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send(
        &self,
        chat_id: &str,
        message: OutgoingMessage,
    ) -> Result<MessageId, SidekickError> {
        self.check_chat(chat_id)?;
        Ok(self.record(chat_id, message, false))
    }

    async fn reply(
        &self,
        to: &IncomingMessage,
        message: OutgoingMessage,
    ) -> Result<MessageId, SidekickError> {
        self.check_chat(&to.chat_id)?;
        Ok(self.record(&to.chat_id, message.quoting(&to.id), true))
    }

    async fn fetch_messages(
        &self,
        chat_id: &str,
        limit: usize,
    ) -> Result<Vec<IncomingMessage>, SidekickError> {
        self.check()?;
        self.fetched.lock().unwrap().push((chat_id.to_string(), limit));
        Ok(self.history.iter().take(limit).cloned().collect())
    }

    async fn archive_chat(&self, chat_id: &str) -> Result<(), SidekickError> {
        self.check()?;
        self.archived.lock().unwrap().push(chat_id.to_string());
        Ok(())
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>, SidekickError> {
        self.check()?;
        Ok(self.chats.clone())
    }

    async fn status(&self) -> Result<SessionStatus, SidekickError> {
        self.check()?;
        Ok(SessionStatus {
            connected: true,
            wid: Some(OWNER.to_string()),
            pushname: Some("Owner".to_string()),
            platform: Some("android".to_string()),
        })
    }

    async fn stop(&self) -> Result<(), SidekickError> {
        Ok(())
    }
}

/// An AI service that records requests and returns a canned outcome.
pub struct MockAi {
    pub requests: Arc<Mutex<Vec<AiRequest>>>,
    pub outcome: Result<AiReply, String>,
}

impl MockAi {
    pub fn replying(reply: AiReply) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            outcome: Ok(reply),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            outcome: Err(error.to_string()),
        }
    }
}

#[async_trait]
impl AiService for MockAi {
    fn name(&self) -> &str {
        "mock-ai"
    }

    async fn request(&self, request: &AiRequest) -> Result<AiReply, SidekickError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcome.clone().map_err(SidekickError::Ai)
    }
}

/// A message someone else wrote to the bot.
pub fn inbound(from: &str, body: &str) -> IncomingMessage {
    IncomingMessage {
        id: format!("in-{}", uuid::Uuid::new_v4()),
        chat_id: from.to_string(),
        from: from.to_string(),
        to: OWNER.to_string(),
        author: None,
        sender_name: None,
        body: body.to_string(),
        timestamp: Utc::now(),
        from_me: false,
        has_media: false,
    }
}

/// A message the owner wrote in their own chat.
pub fn self_message(body: &str) -> IncomingMessage {
    IncomingMessage {
        from_me: true,
        to: OWNER.to_string(),
        ..inbound(OWNER, body)
    }
}
