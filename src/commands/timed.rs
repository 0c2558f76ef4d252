//! `@reminder`, `@schedule`, `@scheduled`.

use super::{CommandContext, SIGIL};
use crate::gateway::spawn_reminder;
use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime};
use regex::Regex;
use sidekick_core::error::SidekickError;
use sidekick_memory::{Reminder, ScheduledCommand};
use std::sync::LazyLock;
use tracing::info;
use uuid::Uuid;

static REMINDER_ARGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(\d+)\s+(.+)$").expect("valid reminder pattern"));

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub(super) async fn reminder(ctx: &CommandContext<'_>, args: &str) -> Result<(), SidekickError> {
    let Some(caps) = REMINDER_ARGS.captures(args.trim()) else {
        return ctx
            .respond("⚠️ Usage: @reminder <minutes> <message>")
            .await;
    };

    let minutes = caps[1].parse::<i64>().ok().filter(|m| *m > 0);
    let message = caps[2].trim().to_string();
    let now = Local::now();
    let fire_at = minutes
        .and_then(Duration::try_minutes)
        .and_then(|d| now.checked_add_signed(d));
    let (Some(minutes), Some(fire_at)) = (minutes, fire_at) else {
        return ctx
            .respond("⚠️ Minutes must be a positive whole number.")
            .await;
    };

    let reminder = Reminder {
        id: Uuid::new_v4(),
        message: message.clone(),
        fire_at,
        destination: ctx.trigger.respond_target().to_string(),
    };
    info!(
        "reminder {} set for {} ({minutes} min)",
        reminder.id, reminder.destination
    );
    ctx.store.add_reminder(reminder.clone()).await;
    spawn_reminder(ctx.store.clone(), ctx.transport.clone(), reminder);

    ctx.respond(format!(
        "⏰ Reminder set for {} (in {minutes} min): {message}",
        fire_at.format(TIME_FORMAT)
    ))
    .await
}

pub(super) async fn schedule(ctx: &CommandContext<'_>, args: &str) -> Result<(), SidekickError> {
    let args = args.trim();
    let (time, command) = match args.split_once(char::is_whitespace) {
        Some((time, command)) => (time, command.trim()),
        None => (args, ""),
    };
    if time.is_empty() || command.is_empty() {
        return ctx
            .respond("⚠️ Usage: @schedule <HH:MM | YYYY-MM-DDTHH:MM> <@command>")
            .await;
    }
    if !command.starts_with(SIGIL) {
        return ctx
            .respond("⚠️ The scheduled command must start with @.")
            .await;
    }
    let Some(fire_at) = resolve_schedule_time(time, Local::now()) else {
        return ctx
            .respond("⚠️ Invalid time. Use HH:MM or YYYY-MM-DDTHH:MM.")
            .await;
    };

    let entry = ScheduledCommand {
        id: Uuid::new_v4(),
        fire_at,
        command_text: command.to_string(),
        destination: ctx.trigger.respond_target().to_string(),
    };
    info!(
        "scheduled {:?} for {} at {}",
        entry.command_text, entry.destination, entry.fire_at
    );
    ctx.store.schedule_command(entry).await;

    ctx.respond(format!(
        "🗓️ Scheduled {command} for {}.",
        fire_at.format(TIME_FORMAT)
    ))
    .await
}

pub(super) async fn list(ctx: &CommandContext<'_>) -> Result<(), SidekickError> {
    let commands = ctx.store.scheduled_commands().await;
    let reminders = ctx.store.reminders().await;
    if commands.is_empty() && reminders.is_empty() {
        return ctx
            .respond("📭 Nothing scheduled.")
            .await;
    }

    let mut out = String::new();
    if !commands.is_empty() {
        out.push_str("🗓️ *Scheduled commands*");
        for c in &commands {
            out.push_str(&format!(
                "\n- {} → {} ({})",
                c.fire_at.format(TIME_FORMAT),
                c.command_text,
                c.destination
            ));
        }
    }
    if !reminders.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str("⏰ *Reminders*");
        for r in &reminders {
            out.push_str(&format!("\n- {} → {}", r.fire_at.format(TIME_FORMAT), r.message));
        }
    }
    ctx.respond(out).await
}

/// Resolve a `@schedule` time token relative to `now`.
///
/// Accepts `HH:MM` (today, or tomorrow once that time has passed), a local
/// `YYYY-MM-DDTHH:MM[:SS]`, or an RFC 3339 timestamp.
pub fn resolve_schedule_time(token: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    if let Ok(time) = NaiveTime::parse_from_str(token, "%H:%M") {
        let today = now.date_naive().and_time(time).and_local_timezone(Local).earliest()?;
        if today > now {
            return Some(today);
        }
        let tomorrow = now.date_naive().succ_opt()?.and_time(time);
        return tomorrow.and_local_timezone(Local).earliest();
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(token, format) {
            return naive.and_local_timezone(Local).earliest();
        }
    }

    DateTime::parse_from_rfc3339(token)
        .ok()
        .map(|t| t.with_timezone(&Local))
}
