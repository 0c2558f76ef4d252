//! Sending elsewhere: `@sendto`, quick replies, `@reply`, chat monitoring.

use super::{CommandContext, CommandKind};
use sidekick_core::{error::SidekickError, jid::normalize_chat_id, message::OutgoingMessage};
use sidekick_memory::MonitorChange;
use tracing::{info, warn};

pub(super) async fn send_to(ctx: &CommandContext<'_>, args: &str) -> Result<(), SidekickError> {
    let (number, text) = match args.trim().split_once(char::is_whitespace) {
        Some((number, text)) => (number, text.trim()),
        None => ("", ""),
    };
    if number.is_empty() || text.is_empty() {
        return ctx.respond("⚠️ Usage: @sendto <number> <message>").await;
    }

    let destination = normalize_chat_id(number);
    ctx.transport
        .send(&destination, OutgoingMessage::text(text))
        .await?;
    info!("sendto: delivered to {destination}");
    confirm(ctx, format!("📤 Message sent to {destination}.")).await
}

/// The message already went out; a failed confirmation must not read as a failed send.
async fn confirm(ctx: &CommandContext<'_>, text: String) -> Result<(), SidekickError> {
    if let Err(e) = ctx.respond(text).await {
        warn!("message delivered but confirmation failed: {e}");
    }
    Ok(())
}

fn canned_text(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::Busy => "I'm busy right now, I'll get back to you as soon as I can.",
        CommandKind::Later => "I can't answer now, I'll reply later.",
        _ => "Thank you! 🙏",
    }
}

pub(super) async fn quick_reply(
    ctx: &CommandContext<'_>,
    kind: CommandKind,
) -> Result<(), SidekickError> {
    send_to_last_sender(ctx, canned_text(kind)).await
}

pub(super) async fn reply(ctx: &CommandContext<'_>, args: &str) -> Result<(), SidekickError> {
    let text = args.trim();
    if text.is_empty() {
        return ctx.respond("⚠️ Usage: @reply <message>").await;
    }
    send_to_last_sender(ctx, text).await
}

/// Quick replies target the last person who wrote in; they make no sense
/// from the owner's own messages or before anyone has written.
async fn send_to_last_sender(ctx: &CommandContext<'_>, text: &str) -> Result<(), SidekickError> {
    if ctx.trigger.is_self_originated() {
        return ctx
            .respond("⚠️ Quick replies can't be used from your own messages.")
            .await;
    }
    let Some(last) = ctx.store.last_incoming().await else {
        return ctx
            .respond("⚠️ No recent incoming message to reply to.")
            .await;
    };

    ctx.transport
        .send(&last.from, OutgoingMessage::text(text))
        .await?;
    confirm(ctx, format!("✅ Reply sent to {}.", last.from)).await
}

pub(super) async fn monitor(ctx: &CommandContext<'_>, args: &str) -> Result<(), SidekickError> {
    let id = args.trim();
    if id.is_empty() {
        return ctx.respond("⚠️ Usage: @monitor <chat id>").await;
    }
    let chat_id = normalize_chat_id(id);
    let owner = ctx.trigger.requester();

    match ctx.store.monitor(&chat_id, owner).await {
        MonitorChange::Added => {
            info!("monitor: {owner} now watching {chat_id}");
            ctx.respond(format!(
                "👀 Monitoring {chat_id}. You'll be notified of new messages."
            ))
            .await
        }
        MonitorChange::Unchanged => {
            ctx.respond(format!("👀 Already monitoring {chat_id}.")).await
        }
        MonitorChange::TakenOver { previous_owner } => {
            info!("monitor: {owner} took over {chat_id} from {previous_owner}");
            ctx.respond(format!(
                "👀 Monitoring {chat_id}. Notifications moved here from {previous_owner}."
            ))
            .await
        }
    }
}

pub(super) async fn unmonitor(ctx: &CommandContext<'_>, args: &str) -> Result<(), SidekickError> {
    let id = args.trim();
    if id.is_empty() {
        return ctx.respond("⚠️ Usage: @unmonitor <chat id>").await;
    }
    let chat_id = normalize_chat_id(id);

    if ctx.store.unmonitor(&chat_id).await {
        info!("monitor: stopped watching {chat_id}");
        ctx.respond(format!("🛑 Stopped monitoring {chat_id}.")).await
    } else {
        ctx.respond(format!("ℹ️ {chat_id} is not being monitored."))
            .await
    }
}

pub(super) async fn monitors(ctx: &CommandContext<'_>) -> Result<(), SidekickError> {
    let monitors = ctx.store.monitors().await;
    if monitors.is_empty() {
        return ctx.respond("📭 No chats are being monitored.").await;
    }

    let mut out = String::from("👀 *Monitored chats*");
    for (chat_id, sub) in &monitors {
        out.push_str(&format!("\n- {chat_id} (notifying {})", sub.owner_id));
    }
    ctx.respond(out).await
}
