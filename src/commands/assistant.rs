//! AI-backed commands. Each sends a "thinking" acknowledgement, then the
//! result or the error text.

use super::{CommandContext, CommandKind};
use sidekick_core::{
    error::SidekickError,
    message::OutgoingMessage,
    service::{AiAction, AiReply, AiRequest},
};
use tracing::{error, info};

/// Messages fed to `@summarize` when no count is given.
pub const DEFAULT_SUMMARY_MESSAGES: usize = 20;

pub const THINKING: &str = "🤔 Thinking...";

pub(super) async fn handle(
    ctx: &CommandContext<'_>,
    kind: CommandKind,
    args: &str,
) -> Result<(), SidekickError> {
    let args = args.trim();
    if ctx.ai.is_none() {
        return ctx
            .respond("⚠️ AI features are not enabled on this bot.")
            .await;
    }

    let request = match kind {
        CommandKind::Summarize => match summarize_request(ctx, args).await? {
            Some(request) => request,
            None => return Ok(()),
        },
        CommandKind::Translate => {
            let Some((language, text)) = args
                .split_once(char::is_whitespace)
                .map(|(l, t)| (l, t.trim()))
                .filter(|(_, t)| !t.is_empty())
            else {
                return ctx
                    .respond("⚠️ Usage: @translate <language> <text>")
                    .await;
            };
            AiRequest {
                target_language: Some(language.to_string()),
                ..AiRequest::text(AiAction::Translate, text)
            }
        }
        _ => {
            if args.is_empty() {
                return ctx.respond(usage(kind)).await;
            }
            match kind {
                CommandKind::Ask => AiRequest::prompt(AiAction::Ask, args),
                CommandKind::Extract => AiRequest::text(AiAction::Extract, args),
                CommandKind::Search => AiRequest::prompt(AiAction::Search, args),
                CommandKind::Transcribe => AiRequest::url(AiAction::Transcribe, args),
                CommandKind::Voice => AiRequest::text(AiAction::Tts, args),
                _ => AiRequest::prompt(AiAction::Chat, args),
            }
        }
    };

    ask(ctx, &request).await
}

fn usage(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::Ask => "⚠️ Usage: @ask <question>",
        CommandKind::Extract => "⚠️ Usage: @extract <text>",
        CommandKind::Search => "⚠️ Usage: @search <query>",
        CommandKind::Transcribe => "⚠️ Usage: @transcribe <audio url>",
        CommandKind::Voice => "⚠️ Usage: @voice <text>",
        _ => "⚠️ Usage: @ia <prompt>",
    }
}

/// Build the summarize request from the trigger chat's recent history.
/// `None` means the user has already been answered.
async fn summarize_request(
    ctx: &CommandContext<'_>,
    args: &str,
) -> Result<Option<AiRequest>, SidekickError> {
    let limit = if args.is_empty() {
        DEFAULT_SUMMARY_MESSAGES
    } else {
        match args.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                ctx.respond("⚠️ Usage: @summarize [number of messages]")
                    .await?;
                return Ok(None);
            }
        }
    };

    let messages = ctx
        .transport
        .fetch_messages(ctx.trigger.chat_id(), limit)
        .await?;
    let transcript = messages
        .iter()
        .filter(|m| !m.body.trim().is_empty())
        .map(|m| {
            let who = m.sender_name.as_deref().unwrap_or_else(|| m.author_id());
            format!("{who}: {}", m.body.trim())
        })
        .collect::<Vec<_>>()
        .join("\n");

    if transcript.is_empty() {
        ctx.respond("📭 Nothing to summarize in this chat.").await?;
        return Ok(None);
    }
    Ok(Some(AiRequest::text(AiAction::Summarize, transcript)))
}

/// Acknowledge, call the service, relay the outcome.
async fn ask(ctx: &CommandContext<'_>, request: &AiRequest) -> Result<(), SidekickError> {
    let Some(ai) = ctx.ai else {
        return Ok(());
    };

    ctx.respond(THINKING).await?;
    info!("ai: {} via {}", request.action.as_str(), ai.name());

    match ai.request(request).await {
        Ok(reply) => relay(ctx, request.action, &reply).await,
        Err(e) => {
            error!("ai: {} failed: {e}", request.action.as_str());
            ctx.respond(format!("❌ {}", failure_text(&e))).await
        }
    }
}

async fn relay(
    ctx: &CommandContext<'_>,
    action: AiAction,
    reply: &AiReply,
) -> Result<(), SidekickError> {
    match (reply.text(), reply.media_url()) {
        (text, Some(url)) => {
            ctx.respond_with(OutgoingMessage {
                text: text.unwrap_or_default().to_string(),
                media_url: Some(url.to_string()),
                as_voice: action == AiAction::Tts,
                ..Default::default()
            })
            .await
        }
        (Some(text), None) => ctx.respond(text).await,
        (None, None) => {
            ctx.respond("❌ The AI service returned an empty response.")
                .await
        }
    }
}

/// The service's own message when it gave one, otherwise a generic notice.
fn failure_text(err: &SidekickError) -> String {
    match err {
        SidekickError::Ai(message) if !message.trim().is_empty() => {
            format!("AI error: {message}")
        }
        SidekickError::Timeout(secs) => {
            format!("The AI service did not answer within {secs}s.")
        }
        _ => "The AI request failed.".to_string(),
    }
}
