//! `@todo`, `@todos`, `@done`.

use super::CommandContext;
use chrono::Local;
use sidekick_core::error::SidekickError;
use sidekick_memory::DoneError;

pub(super) async fn add(ctx: &CommandContext<'_>, args: &str) -> Result<(), SidekickError> {
    let text = args.trim();
    if text.is_empty() {
        return ctx
            .respond("✏️ Please write the to-do. Usage: @todo <text>")
            .await;
    }
    let active = ctx.store.add_todo(text, Local::now()).await;
    ctx.respond(format!("✅ Added to-do: {text} ({active} active)."))
        .await
}

pub(super) async fn list(ctx: &CommandContext<'_>) -> Result<(), SidekickError> {
    let todos = ctx.store.todos().await;
    if todos.is_empty() {
        return ctx.respond("📭 Your to-do list is empty.").await;
    }

    let (done, active): (Vec<_>, Vec<_>) = todos.iter().partition(|t| t.done);

    let mut out = String::from("📋 *To-do list*\n\n*Active*");
    if active.is_empty() {
        out.push_str("\nNothing pending.");
    }
    for (i, todo) in active.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", i + 1, todo.text));
    }

    if !done.is_empty() {
        out.push_str("\n\n*Completed*");
        for (i, todo) in done.iter().enumerate() {
            let when = todo
                .completed_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            out.push_str(&format!("\n{}. ~{}~ _({when})_", i + 1, todo.text));
        }
    }
    ctx.respond(out).await
}

pub(super) async fn done(ctx: &CommandContext<'_>, args: &str) -> Result<(), SidekickError> {
    let Some(position) = args
        .split_whitespace()
        .last()
        .and_then(|t| t.parse::<usize>().ok())
    else {
        return ctx.respond("⚠️ Usage: @done <number>").await;
    };

    match ctx.store.complete_active_todo(position, Local::now()).await {
        Ok(todo) => ctx.respond(format!("☑️ Marked as done: {}", todo.text)).await,
        Err(DoneError::NoActive) => ctx.respond("📭 There are no active to-dos.").await,
        Err(DoneError::OutOfRange { active, .. }) => {
            ctx.respond(format!(
                "⚠️ Invalid number. Choose between 1 and {active}."
            ))
            .await
        }
    }
}
