//! Reminders and scheduled commands: entries that fire at a wall-clock time.

use super::Store;
use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

/// A one-shot reminder, delivered by its own timer.
#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub id: Uuid,
    pub message: String,
    pub fire_at: DateTime<Local>,
    /// Chat the reminder was created from; delivery goes back there.
    pub destination: String,
}

/// A command queued for the periodic sweep.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledCommand {
    pub id: Uuid,
    pub fire_at: DateTime<Local>,
    /// Full command text, starting with the command sigil.
    pub command_text: String,
    pub destination: String,
}

impl Store {
    /// Record a live reminder.
    pub async fn add_reminder(&self, reminder: Reminder) {
        self.inner.reminders.lock().await.push(reminder);
    }

    /// Drop a reminder from the live set. Returns it if it was still there.
    pub async fn remove_reminder(&self, id: Uuid) -> Option<Reminder> {
        let mut reminders = self.inner.reminders.lock().await;
        let idx = reminders.iter().position(|r| r.id == id)?;
        Some(reminders.remove(idx))
    }

    /// Live reminders, soonest first.
    pub async fn reminders(&self) -> Vec<Reminder> {
        let mut out = self.inner.reminders.lock().await.clone();
        out.sort_by_key(|r| r.fire_at);
        out
    }

    /// Queue a command for the sweep.
    pub async fn schedule_command(&self, command: ScheduledCommand) {
        self.inner.scheduled.lock().await.push(command);
    }

    /// Remove and return every command with `fire_at <= now`, soonest first.
    ///
    /// Entries leave the pending set here, before execution, so each runs at most once.
    pub async fn take_due_commands(&self, now: DateTime<Local>) -> Vec<ScheduledCommand> {
        let mut pending = self.inner.scheduled.lock().await;
        let (mut due, rest): (Vec<_>, Vec<_>) =
            pending.drain(..).partition(|c| c.fire_at <= now);
        *pending = rest;
        due.sort_by_key(|c| c.fire_at);
        due
    }

    /// Pending commands, soonest first.
    pub async fn scheduled_commands(&self) -> Vec<ScheduledCommand> {
        let mut out = self.inner.scheduled.lock().await.clone();
        out.sort_by_key(|c| c.fire_at);
        out
    }
}
