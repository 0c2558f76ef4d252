//! The dispatcher: the single entry point every trigger funnels through.

use crate::commands::{self, CommandContext};
use sidekick_core::{
    error::SidekickError,
    message::{IncomingMessage, MessageId, OutgoingMessage},
    traits::{AiService, Transport},
};
use sidekick_memory::Store;
use std::sync::Arc;
use tracing::{error, info};

/// Reply for `@...` text that matches no command.
pub const NOT_RECOGNIZED: &str = "❓ Command not recognized. Send @help to see what I can do.";

/// Reported to the destination when a command task dies unexpectedly.
pub const TASK_FAILED: &str = "❌ The command failed unexpectedly.";

/// What caused the dispatcher to run.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// A message someone else sent; responses quote it.
    Inbound(IncomingMessage),
    /// A message the owner sent from their own account; responses are new
    /// messages to the sender, since there is nothing to reply to.
    SelfOriginated(IncomingMessage),
    /// A scheduled command or an API call; responses go to `destination`.
    Synthetic { destination: String },
}

impl Trigger {
    /// Where `respond` delivers.
    pub fn respond_target(&self) -> &str {
        match self {
            Self::Inbound(msg) => &msg.chat_id,
            Self::SelfOriginated(msg) => &msg.from,
            Self::Synthetic { destination } => destination,
        }
    }

    /// The chat the command was issued in.
    pub fn chat_id(&self) -> &str {
        match self {
            Self::Inbound(msg) | Self::SelfOriginated(msg) => &msg.chat_id,
            Self::Synthetic { destination } => destination,
        }
    }

    /// The user who issued the command.
    pub fn requester(&self) -> &str {
        match self {
            Self::Inbound(msg) => msg.author_id(),
            Self::SelfOriginated(msg) => &msg.from,
            Self::Synthetic { destination } => destination,
        }
    }

    pub fn is_self_originated(&self) -> bool {
        matches!(self, Self::SelfOriginated(_))
    }

    /// The real message behind the trigger, if there is one.
    pub fn message(&self) -> Option<&IncomingMessage> {
        match self {
            Self::Inbound(msg) | Self::SelfOriginated(msg) => Some(msg),
            Self::Synthetic { .. } => None,
        }
    }
}

/// Deliver a response according to the trigger's origin.
pub async fn respond(
    transport: &dyn Transport,
    trigger: &Trigger,
    message: OutgoingMessage,
) -> Result<MessageId, SidekickError> {
    match trigger {
        Trigger::Inbound(msg) => transport.reply(msg, message).await,
        Trigger::SelfOriginated(msg) => transport.send(&msg.from, message).await,
        Trigger::Synthetic { destination } => transport.send(destination, message).await,
    }
}

/// Shared handles every command needs.
#[derive(Clone)]
pub struct Dispatcher {
    pub store: Store,
    pub transport: Arc<dyn Transport>,
    pub ai: Option<Arc<dyn AiService>>,
}

impl Dispatcher {
    pub fn new(store: Store, transport: Arc<dyn Transport>, ai: Option<Arc<dyn AiService>>) -> Self {
        Self {
            store,
            transport,
            ai,
        }
    }

    /// Match `text` against the registry and run at most one handler.
    ///
    /// Never fails: handler errors become a single failure notice.
    pub async fn process_command(&self, text: &str, trigger: &Trigger) {
        let text = text.trim();

        if let Trigger::Synthetic { destination } = trigger {
            if destination.trim().is_empty() {
                let err = SidekickError::Dispatch("synthetic trigger without destination".into());
                error!("dispatch: dropping {text:?}: {err}");
                return;
            }
        }

        let Some((kind, args)) = commands::resolve(text) else {
            if text.starts_with(commands::SIGIL) {
                info!("dispatch: unrecognized command {text:?}");
                self.notify(trigger, NOT_RECOGNIZED).await;
            }
            return;
        };

        info!(
            "dispatch: {kind:?} for {} via {}",
            trigger.requester(),
            trigger_label(trigger)
        );

        let ctx = CommandContext {
            store: &self.store,
            transport: &self.transport,
            ai: self.ai.as_ref(),
            trigger,
        };

        if let Err(e) = commands::run(kind, args, &ctx).await {
            error!("dispatch: {kind:?} failed: {e}");
            self.notify(trigger, commands::failure_notice(kind)).await;
        }
    }

    /// Run `process_command` in its own task so a panicking handler cannot
    /// take the caller down. Used by the sweep and the HTTP surface.
    pub async fn dispatch_guarded(&self, text: String, trigger: Trigger) {
        let destination = trigger.respond_target().to_string();
        let dispatcher = self.clone();
        let task = tokio::spawn(async move {
            dispatcher.process_command(&text, &trigger).await;
        });

        if let Err(e) = task.await {
            error!("dispatch: command task for {destination} failed: {e}");
            if let Err(e) = self
                .transport
                .send(&destination, OutgoingMessage::text(TASK_FAILED))
                .await
            {
                error!("dispatch: could not report failure to {destination}: {e}");
            }
        }
    }

    /// Respond, logging instead of propagating a delivery failure.
    async fn notify(&self, trigger: &Trigger, text: &str) {
        if let Err(e) = respond(self.transport.as_ref(), trigger, OutgoingMessage::text(text)).await {
            error!("dispatch: failed to respond to {}: {e}", trigger.respond_target());
        }
    }
}

fn trigger_label(trigger: &Trigger) -> &'static str {
    match trigger {
        Trigger::Inbound(_) => "inbound",
        Trigger::SelfOriginated(_) => "self",
        Trigger::Synthetic { .. } => "synthetic",
    }
}
