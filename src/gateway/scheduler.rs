//! Timer-driven re-entry: the scheduled-command sweep and reminder timers.

use super::{Dispatcher, Gateway, Trigger};
use chrono::{DateTime, Local};
use sidekick_core::{message::OutgoingMessage, traits::Transport};
use sidekick_memory::{Reminder, Store};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

impl Gateway {
    /// Background task: run due scheduled commands every `poll_secs`.
    pub(super) async fn scheduler_loop(dispatcher: Dispatcher, poll_secs: u64) {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(poll_secs)).await;
            let ran = sweep_due_commands(&dispatcher, Local::now()).await;
            if ran > 0 {
                info!("scheduler: ran {ran} scheduled command(s)");
            }
        }
    }
}

/// Consume every command due at `now` and dispatch each in turn.
///
/// Entries are removed before they run, so each executes at most once.
/// A failing entry is reported to its destination and the rest still run.
pub async fn sweep_due_commands(dispatcher: &Dispatcher, now: DateTime<Local>) -> usize {
    let due = dispatcher.store.take_due_commands(now).await;
    let count = due.len();

    for command in due {
        info!(
            "scheduler: running {:?} for {} (due {})",
            command.command_text, command.destination, command.fire_at
        );
        dispatcher
            .dispatch_guarded(
                command.command_text,
                Trigger::Synthetic {
                    destination: command.destination,
                },
            )
            .await;
    }

    count
}

/// Arm a one-shot timer for a reminder already in the store.
pub fn spawn_reminder(store: Store, transport: Arc<dyn Transport>, reminder: Reminder) {
    let delay = (reminder.fire_at - Local::now())
        .to_std()
        .unwrap_or_default();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        fire_reminder(&store, transport.as_ref(), reminder.id).await;
    });
}

/// Deliver a reminder once and drop it from the live set, whether or not
/// the send went through.
pub async fn fire_reminder(store: &Store, transport: &dyn Transport, id: Uuid) {
    let Some(reminder) = store.remove_reminder(id).await else {
        warn!("reminder {id} already fired or removed");
        return;
    };

    let text = format!("⏰ Reminder: {}", reminder.message);
    match transport
        .send(&reminder.destination, OutgoingMessage::text(text))
        .await
    {
        Ok(_) => info!("reminder {id} delivered to {}", reminder.destination),
        Err(e) => error!("reminder {id} to {} failed: {e}", reminder.destination),
    }
}
