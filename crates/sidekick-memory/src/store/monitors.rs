//! Monitored chats and the last incoming message slot.

use super::Store;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who watches a chat and how far they have been notified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorSubscription {
    pub owner_id: String,
    pub last_checked_message_id: Option<String>,
}

/// The most recent message received from someone else.
#[derive(Debug, Clone, Serialize)]
pub struct LastIncoming {
    pub from: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

/// What `monitor` did to an existing subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorChange {
    Added,
    /// Same owner already watching; the checkpoint is kept.
    Unchanged,
    /// Another owner was watching; they no longer get notified.
    TakenOver { previous_owner: String },
}

impl Store {
    /// Start monitoring a chat for `owner_id`, or take it over from another owner.
    pub async fn monitor(&self, chat_id: &str, owner_id: &str) -> MonitorChange {
        let mut monitors = self.inner.monitors.lock().await;
        match monitors.get_mut(chat_id) {
            Some(sub) if sub.owner_id == owner_id => MonitorChange::Unchanged,
            Some(sub) => {
                let previous_owner = std::mem::replace(&mut sub.owner_id, owner_id.to_string());
                MonitorChange::TakenOver { previous_owner }
            }
            None => {
                monitors.insert(
                    chat_id.to_string(),
                    MonitorSubscription {
                        owner_id: owner_id.to_string(),
                        last_checked_message_id: None,
                    },
                );
                MonitorChange::Added
            }
        }
    }

    /// Stop monitoring a chat. Returns false if it was not monitored.
    pub async fn unmonitor(&self, chat_id: &str) -> bool {
        self.inner.monitors.lock().await.remove(chat_id).is_some()
    }

    /// Observe a new message in a chat.
    ///
    /// If the chat is monitored and the author is not the owner, advances the
    /// checkpoint and returns the owner to notify.
    pub async fn observe_message(
        &self,
        chat_id: &str,
        author_id: &str,
        message_id: &str,
    ) -> Option<String> {
        let mut monitors = self.inner.monitors.lock().await;
        let sub = monitors.get_mut(chat_id)?;
        if sub.owner_id == author_id {
            return None;
        }
        if sub.last_checked_message_id.as_deref() == Some(message_id) {
            return None;
        }
        sub.last_checked_message_id = Some(message_id.to_string());
        Some(sub.owner_id.clone())
    }

    /// Current subscription for a chat.
    pub async fn subscription(&self, chat_id: &str) -> Option<MonitorSubscription> {
        self.inner.monitors.lock().await.get(chat_id).cloned()
    }

    /// All subscriptions, sorted by chat id.
    pub async fn monitors(&self) -> Vec<(String, MonitorSubscription)> {
        let mut out: Vec<_> = self
            .inner
            .monitors
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Overwrite the last incoming message slot.
    pub async fn set_last_incoming(&self, last: LastIncoming) {
        *self.inner.last_incoming.lock().await = Some(last);
    }

    pub async fn last_incoming(&self) -> Option<LastIncoming> {
        self.inner.last_incoming.lock().await.clone()
    }
}
