use crate::{
    error::SidekickError,
    message::{ChatSummary, IncomingMessage, MessageId, OutgoingMessage, SessionStatus},
    service::{AiReply, AiRequest},
};
use async_trait::async_trait;

/// Messaging transport: the connection to the chat network.
///
/// Implementations own the session; the rest of the bot only sees
/// chat identifiers and messages.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name.
    fn name(&self) -> &str;

    /// Start listening. Returns a receiver that yields every observed message,
    /// including ones the owner sends from other devices.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, SidekickError>;

    /// Send a new message to a chat.
    async fn send(
        &self,
        chat_id: &str,
        message: OutgoingMessage,
    ) -> Result<MessageId, SidekickError>;

    /// Reply to a received message, quoting it.
    async fn reply(
        &self,
        to: &IncomingMessage,
        message: OutgoingMessage,
    ) -> Result<MessageId, SidekickError> {
        self.send(&to.chat_id, message.quoting(&to.id)).await
    }

    /// Most recent messages of a chat, oldest first.
    async fn fetch_messages(
        &self,
        chat_id: &str,
        limit: usize,
    ) -> Result<Vec<IncomingMessage>, SidekickError>;

    /// Archive a chat.
    async fn archive_chat(&self, chat_id: &str) -> Result<(), SidekickError>;

    /// All chats known to the session.
    async fn list_chats(&self) -> Result<Vec<ChatSummary>, SidekickError>;

    /// Connectivity and session identity.
    async fn status(&self) -> Result<SessionStatus, SidekickError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), SidekickError>;
}

/// External AI service. Request in, structured reply out.
#[async_trait]
pub trait AiService: Send + Sync {
    /// Human-readable service name.
    fn name(&self) -> &str;

    /// Perform one request. Non-success replies surface as `Err`.
    async fn request(&self, request: &AiRequest) -> Result<AiReply, SidekickError>;
}
