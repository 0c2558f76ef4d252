//! Gateway: the main event loop connecting the transport, the dispatcher,
//! the scheduler and the HTTP surface.

mod dispatch;
mod scheduler;

#[cfg(test)]
mod tests;

pub use dispatch::{respond, Dispatcher, Trigger, NOT_RECOGNIZED, TASK_FAILED};
pub use scheduler::{fire_reminder, spawn_reminder, sweep_due_commands};

use chrono::Utc;
use sidekick_core::{
    config::{ApiConfig, Config, SchedulerConfig},
    message::{IncomingMessage, OutgoingMessage},
    traits::{AiService, Transport},
};
use sidekick_memory::{LastIncoming, Store};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// The central gateway that routes observed messages into the dispatcher.
pub struct Gateway {
    pub(super) dispatcher: Dispatcher,
    pub(super) scheduler_config: SchedulerConfig,
    pub(super) api_config: ApiConfig,
    /// Plain text in the owner's self-chat goes to the AI.
    pub(super) self_chat_assistant: bool,
    pub(super) uptime: Instant,
    /// Senders with a message in flight, and what they sent meanwhile.
    pub(super) active_senders: Mutex<HashMap<String, VecDeque<IncomingMessage>>>,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        transport: Arc<dyn Transport>,
        ai: Option<Arc<dyn AiService>>,
        store: Store,
        config: &Config,
    ) -> Self {
        let self_chat_assistant = config.ai.self_chat_assistant && ai.is_some();
        Self {
            dispatcher: Dispatcher::new(store, transport, ai),
            scheduler_config: config.scheduler.clone(),
            api_config: config.api.clone(),
            self_chat_assistant,
            uptime: Instant::now(),
            active_senders: Mutex::new(HashMap::new()),
        }
    }

    /// Run the main event loop.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let transport = self.dispatcher.transport.clone();
        info!(
            "Sidekick gateway running | transport: {} | ai: {} | scheduler: {} | api: {}",
            transport.name(),
            self.dispatcher
                .ai
                .as_ref()
                .map(|ai| ai.name())
                .unwrap_or("disabled"),
            if self.scheduler_config.enabled {
                "enabled"
            } else {
                "disabled"
            },
            if self.api_config.enabled {
                format!("{}:{}", self.api_config.host, self.api_config.port)
            } else {
                "disabled".to_string()
            },
        );

        let mut rx = transport
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start transport {}: {e}", transport.name()))?;
        info!("Transport started: {}", transport.name());

        // Spawn scheduler loop.
        let sched_handle = if self.scheduler_config.enabled {
            let sched_dispatcher = self.dispatcher.clone();
            let poll_secs = self.scheduler_config.poll_interval_secs;
            Some(tokio::spawn(async move {
                Self::scheduler_loop(sched_dispatcher, poll_secs).await;
            }))
        } else {
            None
        };

        // Spawn HTTP API server.
        let api_handle = if self.api_config.enabled {
            let api_cfg = self.api_config.clone();
            let api_dispatcher = self.dispatcher.clone();
            let api_uptime = self.uptime;
            Some(tokio::spawn(async move {
                crate::api::serve(api_cfg, api_dispatcher, api_uptime).await;
            }))
        } else {
            None
        };

        // Main event loop with graceful shutdown.
        loop {
            tokio::select! {
                incoming = rx.recv() => {
                    let Some(incoming) = incoming else {
                        error!("transport closed its message stream");
                        break;
                    };
                    self.clone().dispatch_message(incoming).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown(&sched_handle, &api_handle).await;
        Ok(())
    }

    /// Queue a message behind its sender's in-flight one, or start a worker for it.
    ///
    /// Awaited from the event loop, so the queueing decision follows arrival order.
    pub(crate) async fn dispatch_message(self: Arc<Self>, incoming: IncomingMessage) {
        let sender_key = format!("{}:{}", incoming.chat_id, incoming.author_id());

        {
            let mut active = self.active_senders.lock().await;
            if let Some(queue) = active.get_mut(&sender_key) {
                queue.push_back(incoming);
                debug!("queued message from {sender_key} ({} waiting)", queue.len());
                return;
            }
            active.insert(sender_key.clone(), VecDeque::new());
        }

        tokio::spawn(async move {
            self.handle_message(incoming).await;

            loop {
                let next = {
                    let mut active = self.active_senders.lock().await;
                    match active.get_mut(&sender_key).and_then(|q| q.pop_front()) {
                        Some(msg) => msg,
                        None => {
                            active.remove(&sender_key);
                            break;
                        }
                    }
                };
                self.handle_message(next).await;
            }
        });
    }

    /// Observe, route and record one message from the transport.
    pub(crate) async fn handle_message(&self, msg: IncomingMessage) {
        debug!(
            "message {} in {} from {} (from_me: {})",
            msg.id,
            msg.chat_id,
            msg.author_id(),
            msg.from_me
        );

        self.observe_monitors(&msg).await;

        let text = msg.body.trim().to_string();
        if msg.from_me {
            if text.starts_with(crate::commands::SIGIL) {
                self.dispatcher
                    .process_command(&text, &Trigger::SelfOriginated(msg))
                    .await;
            } else if self.self_chat_assistant && msg.is_self_chat() && !text.is_empty() {
                self.dispatcher
                    .process_command(&format!("@ia {text}"), &Trigger::SelfOriginated(msg))
                    .await;
            }
            return;
        }

        let last = LastIncoming {
            from: msg.from.clone(),
            body: msg.body.clone(),
            timestamp: msg.timestamp,
        };
        self.dispatcher
            .process_command(&text, &Trigger::Inbound(msg))
            .await;
        self.dispatcher.store.set_last_incoming(last).await;
    }

    /// Notify the owner of a monitored chat about a message they didn't write.
    async fn observe_monitors(&self, msg: &IncomingMessage) {
        let Some(owner) = self
            .dispatcher
            .store
            .observe_message(&msg.chat_id, msg.author_id(), &msg.id)
            .await
        else {
            return;
        };

        let who = msg.sender_name.as_deref().unwrap_or_else(|| msg.author_id());
        let body = if msg.body.trim().is_empty() && msg.has_media {
            "[media]"
        } else {
            msg.body.trim()
        };
        let text = format!(
            "🔔 New message in {} from {who} ({}):\n{body}",
            msg.chat_id,
            msg.timestamp.with_timezone(&chrono::Local).format("%H:%M")
        );

        if let Err(e) = self
            .dispatcher
            .transport
            .send(&owner, OutgoingMessage::text(text))
            .await
        {
            error!("monitor: failed to notify {owner} about {}: {e}", msg.chat_id);
        } else {
            info!("monitor: notified {owner} about {}", msg.chat_id);
        }
    }

    /// Graceful shutdown: stop background tasks and the transport.
    async fn shutdown(&self, sched: &Option<JoinHandle<()>>, api: &Option<JoinHandle<()>>) {
        info!("Shutting down...");

        if let Some(h) = sched {
            h.abort();
        }
        if let Some(h) = api {
            h.abort();
        }

        if let Err(e) = self.dispatcher.transport.stop().await {
            error!("failed to stop transport: {e}");
        }

        let pending = self.dispatcher.store.scheduled_commands().await.len()
            + self.dispatcher.store.reminders().await.len();
        if pending > 0 {
            info!("dropping {pending} pending scheduled item(s)");
        }
        info!(
            "Shutdown complete after {}s (at {})",
            self.uptime.elapsed().as_secs(),
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}
