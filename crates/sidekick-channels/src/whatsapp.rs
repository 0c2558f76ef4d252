//! WhatsApp transport over a WhatsApp Web bridge.
//!
//! The bridge holds the browser session and exposes it over HTTP:
//! - `GET  /events?cursor=&timeout=` long-polls observed messages
//! - `POST /messages` sends (or replies, with `quotedId`)
//! - `GET  /chats`, `GET /chats/{id}/messages?limit=`, `POST /chats/{id}/archive`
//! - `GET  /status` reports connectivity and the session identity

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sidekick_core::{
    config::WhatsAppConfig,
    error::SidekickError,
    message::{ChatSummary, IncomingMessage, MessageId, OutgoingMessage, SessionStatus},
    traits::Transport,
};
use crate::echo::EchoFilter;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Timeout for everything except the long poll.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// WhatsApp transport backed by an HTTP bridge.
pub struct WhatsAppBridge {
    config: WhatsAppConfig,
    client: reqwest::Client,
    base_url: String,
    /// Drops the bridge's reports of our own sends.
    echo: Arc<Mutex<EchoFilter>>,
    /// Feeds the gateway; set once polling starts.
    events: OnceLock<mpsc::Sender<IncomingMessage>>,
}

// --- Bridge API types ---

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    messages: Vec<IncomingMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    chat_id: &'a str,
    #[serde(flatten)]
    message: &'a OutgoingMessage,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatsResponse {
    #[serde(default)]
    chats: Vec<ChatSummary>,
}

impl WhatsAppBridge {
    /// Create a new bridge transport from config.
    pub fn new(config: WhatsAppConfig) -> Self {
        let base_url = config.bridge_url.trim_end_matches('/').to_string();
        Self {
            config,
            client: reqwest::Client::new(),
            base_url,
            echo: Arc::new(Mutex::new(EchoFilter::new(Duration::from_secs(
                REQUEST_TIMEOUT_SECS + 5,
            )))),
            events: OnceLock::new(),
        }
    }

    async fn post_message(
        &self,
        chat_id: &str,
        message: &OutgoingMessage,
    ) -> Result<MessageId, SidekickError> {
        let body = SendRequest { chat_id, message };
        let resp = self
            .post("/messages")
            .json(&body)
            .send()
            .await
            .map_err(|e| SidekickError::Transport(format!("whatsapp send failed: {e}")))?;
        let sent: SendResponse = decode(resp, "bridge send").await?;
        Ok(MessageId(sent.id))
    }

    /// Hand over own messages that were held back while a send was in flight.
    async fn forward(&self, released: Vec<IncomingMessage>) {
        let Some(tx) = self.events.get() else {
            return;
        };
        for msg in released {
            if tx.send(msg).await.is_err() {
                break;
            }
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(format!("{}{path}", self.base_url)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(format!("{}{path}", self.base_url)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        if self.config.api_token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.config.api_token)
        }
    }
}

/// Check the status code and decode a JSON body.
async fn decode<T: for<'de> Deserialize<'de>>(
    resp: reqwest::Response,
    what: &str,
) -> Result<T, SidekickError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(SidekickError::Transport(format!(
            "{what} returned {status}: {body}"
        )));
    }
    resp.json()
        .await
        .map_err(|e| SidekickError::Transport(format!("{what}: failed to parse response: {e}")))
}

fn lock_filter(filter: &Mutex<EchoFilter>) -> MutexGuard<'_, EchoFilter> {
    filter.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Path segment for a chat id (`@` must be escaped).
fn chat_path(chat_id: &str) -> String {
    chat_id.replace('@', "%40")
}

#[async_trait]
impl Transport for WhatsAppBridge {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, SidekickError> {
        let status = self.status().await?;
        info!(
            "WhatsApp bridge at {} ({})",
            self.base_url,
            if status.connected {
                "connected"
            } else {
                "waiting for pairing"
            }
        );

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let token = self.config.api_token.clone();
        let poll_timeout = self.config.poll_timeout_secs;
        let echo = self.echo.clone();
        if self.events.set(tx.clone()).is_err() {
            return Err(SidekickError::Transport(
                "whatsapp transport already started".into(),
            ));
        }

        tokio::spawn(async move {
            let mut cursor: Option<String> = None;
            let mut backoff_secs: u64 = 1;

            loop {
                let mut url = format!("{base_url}/events?timeout={poll_timeout}");
                if let Some(ref c) = cursor {
                    url.push_str(&format!("&cursor={c}"));
                }

                let mut req = client
                    .get(&url)
                    .timeout(Duration::from_secs(poll_timeout + 5));
                if !token.is_empty() {
                    req = req.bearer_auth(&token);
                }

                let body: EventsResponse = match req.send().await {
                    Ok(resp) => match decode(resp, "bridge events").await {
                        Ok(b) => b,
                        Err(e) => {
                            error!("whatsapp poll error (retry in {backoff_secs}s): {e}");
                            tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                            backoff_secs = (backoff_secs * 2).min(60);
                            continue;
                        }
                    },
                    Err(e) => {
                        error!("whatsapp poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                backoff_secs = 1;
                if body.cursor.is_some() {
                    cursor = body.cursor;
                }

                let ready: Vec<IncomingMessage> = {
                    let mut filter = lock_filter(&echo);
                    let mut ready = filter.expire(Instant::now());
                    ready.extend(body.messages.into_iter().filter_map(|m| filter.observe(m)));
                    ready
                };

                for msg in ready {
                    if tx.send(msg).await.is_err() {
                        info!("whatsapp receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(
        &self,
        chat_id: &str,
        message: OutgoingMessage,
    ) -> Result<MessageId, SidekickError> {
        let ticket = lock_filter(&self.echo).begin_send(Instant::now());
        let result = self.post_message(chat_id, &message).await;
        let released = lock_filter(&self.echo).finish_send(
            ticket,
            result.as_ref().ok().map(|id| id.0.as_str()),
            Instant::now(),
        );
        self.forward(released).await;
        result
    }

    async fn fetch_messages(
        &self,
        chat_id: &str,
        limit: usize,
    ) -> Result<Vec<IncomingMessage>, SidekickError> {
        let resp = self
            .get(&format!("/chats/{}/messages?limit={limit}", chat_path(chat_id)))
            .send()
            .await
            .map_err(|e| SidekickError::Transport(format!("whatsapp fetch failed: {e}")))?;
        let body: MessagesResponse = decode(resp, "bridge fetch").await?;
        Ok(body.messages)
    }

    async fn archive_chat(&self, chat_id: &str) -> Result<(), SidekickError> {
        let resp = self
            .post(&format!("/chats/{}/archive", chat_path(chat_id)))
            .send()
            .await
            .map_err(|e| SidekickError::Transport(format!("whatsapp archive failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(SidekickError::Transport(format!(
                "bridge archive returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>, SidekickError> {
        let resp = self
            .get("/chats")
            .send()
            .await
            .map_err(|e| SidekickError::Transport(format!("whatsapp chats failed: {e}")))?;
        let body: ChatsResponse = decode(resp, "bridge chats").await?;
        Ok(body.chats)
    }

    async fn status(&self) -> Result<SessionStatus, SidekickError> {
        let resp = self
            .get("/status")
            .send()
            .await
            .map_err(|e| SidekickError::Transport(format!("whatsapp status failed: {e}")))?;
        decode(resp, "bridge status").await
    }

    async fn stop(&self) -> Result<(), SidekickError> {
        info!("WhatsApp bridge transport stopped");
        Ok(())
    }
}
