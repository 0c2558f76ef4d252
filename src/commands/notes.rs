//! `@note`, `@notes`, `@clear-notes`.

use super::CommandContext;
use chrono::Local;
use sidekick_core::error::SidekickError;

pub(super) async fn add(ctx: &CommandContext<'_>, args: &str) -> Result<(), SidekickError> {
    let text = args.trim();
    if text.is_empty() {
        return ctx.respond("✏️ Please write the note. Usage: @note <text>").await;
    }
    let count = ctx.store.add_note(text, Local::now()).await;
    ctx.respond(format!("📝 Note saved ({count} total).")).await
}

pub(super) async fn list(ctx: &CommandContext<'_>) -> Result<(), SidekickError> {
    let notes = ctx.store.notes().await;
    if notes.is_empty() {
        return ctx.respond("📭 No notes saved.").await;
    }

    let mut out = String::from("📒 *Your notes*\n");
    for (i, note) in notes.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {} _({})_",
            i + 1,
            note.text,
            note.timestamp.format("%Y-%m-%d %H:%M")
        ));
    }
    ctx.respond(out).await
}

pub(super) async fn clear(ctx: &CommandContext<'_>) -> Result<(), SidekickError> {
    let cleared = ctx.store.clear_notes().await;
    ctx.respond(format!("🗑️ Cleared {cleared} note(s).")).await
}
