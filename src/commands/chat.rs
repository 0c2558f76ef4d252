//! Echoes and chat/session introspection.

use super::CommandContext;
use sidekick_core::{error::SidekickError, jid::user_part, message::OutgoingMessage};

pub(super) async fn ping_reply(ctx: &CommandContext<'_>) -> Result<(), SidekickError> {
    match ctx.trigger.message() {
        Some(msg) => {
            ctx.transport
                .reply(msg, OutgoingMessage::text("pong"))
                .await?;
            Ok(())
        }
        None => ctx.respond("pong").await,
    }
}

/// `@echo` repeats everything after the separator, inner spacing included.
pub(super) async fn echo(ctx: &CommandContext<'_>, args: &str) -> Result<(), SidekickError> {
    let text = skip_separator(args);
    if text.is_empty() {
        return ctx.respond("⚠️ Usage: @echo <text>").await;
    }
    ctx.respond(text).await
}

pub(super) async fn preview(ctx: &CommandContext<'_>, args: &str) -> Result<(), SidekickError> {
    let text = args.trim();
    if text.is_empty() {
        return ctx.respond("⚠️ Usage: @preview <text with a link>").await;
    }
    ctx.respond_with(OutgoingMessage {
        text: text.to_string(),
        link_preview: true,
        ..Default::default()
    })
    .await
}

pub(super) async fn chats(ctx: &CommandContext<'_>) -> Result<(), SidekickError> {
    let chats = ctx.transport.list_chats().await?;
    let open = chats.iter().filter(|c| !c.archived).count();
    let unread: u64 = chats.iter().map(|c| c.unread_count).sum();
    let groups = chats.iter().filter(|c| c.is_group).count();
    ctx.respond(format!(
        "💬 {open} open chats ({groups} groups), {unread} unread messages."
    ))
    .await
}

pub(super) async fn info(ctx: &CommandContext<'_>) -> Result<(), SidekickError> {
    let status = ctx.transport.status().await?;
    let unknown = "unknown";
    ctx.respond(format!(
        "ℹ️ *Session info*\nName: {}\nNumber: {}\nPlatform: {}\nConnected: {}",
        status.pushname.as_deref().unwrap_or(unknown),
        status.wid.as_deref().map(user_part).unwrap_or(unknown),
        status.platform.as_deref().unwrap_or(unknown),
        if status.connected { "yes" } else { "no" },
    ))
    .await
}

pub(super) async fn archive(ctx: &CommandContext<'_>) -> Result<(), SidekickError> {
    ctx.transport.archive_chat(ctx.trigger.chat_id()).await?;
    ctx.respond("🗄️ Chat archived.").await
}

/// Drop the single whitespace character between the command and its text.
fn skip_separator(args: &str) -> &str {
    let mut chars = args.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => chars.as_str(),
        _ => args,
    }
}
