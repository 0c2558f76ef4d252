//! Bot commands: the ordered registry and the handlers behind it.

mod assistant;
mod chat;
mod messaging;
mod notes;
mod timed;
mod todos;


pub use timed::resolve_schedule_time;

use crate::gateway::{respond, Trigger};
use sidekick_core::{
    error::SidekickError,
    message::OutgoingMessage,
    traits::{AiService, Transport},
};
use sidekick_memory::Store;
use std::sync::Arc;

/// Every command starts with this character.
pub const SIGIL: char = '@';

/// How a registry pattern is compared against the trimmed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The whole input equals the pattern.
    Exact,
    /// The input is the pattern, or the pattern followed by whitespace.
    Prefix,
}

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    PingReply,
    Ping,
    Echo,
    Preview,
    SendTo,
    Notes,
    ClearNotes,
    Note,
    Todos,
    Todo,
    Done,
    Reminder,
    Scheduled,
    Schedule,
    Busy,
    Later,
    Thanks,
    Reply,
    Unmonitor,
    Monitors,
    Monitor,
    Ia,
    Ask,
    Summarize,
    Translate,
    Extract,
    Search,
    Transcribe,
    Voice,
    Chats,
    Info,
    Archive,
}

/// One registry entry.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub kind: MatchKind,
    pub pattern: &'static str,
    pub command: CommandKind,
}

const fn exact(pattern: &'static str, command: CommandKind) -> Rule {
    Rule {
        kind: MatchKind::Exact,
        pattern,
        command,
    }
}

const fn prefix(pattern: &'static str, command: CommandKind) -> Rule {
    Rule {
        kind: MatchKind::Prefix,
        pattern,
        command,
    }
}

/// First match wins. Longer literals sit above the shorter ones they extend.
pub const REGISTRY: &[Rule] = &[
    exact("@help", CommandKind::Help),
    exact("@ping reply", CommandKind::PingReply),
    exact("@ping", CommandKind::Ping),
    prefix("@echo", CommandKind::Echo),
    prefix("@preview", CommandKind::Preview),
    prefix("@sendto", CommandKind::SendTo),
    exact("@notes", CommandKind::Notes),
    exact("@clear-notes", CommandKind::ClearNotes),
    prefix("@note", CommandKind::Note),
    exact("@todos", CommandKind::Todos),
    prefix("@todo", CommandKind::Todo),
    prefix("@done", CommandKind::Done),
    prefix("@reminder", CommandKind::Reminder),
    exact("@scheduled", CommandKind::Scheduled),
    prefix("@schedule", CommandKind::Schedule),
    exact("@busy", CommandKind::Busy),
    exact("@later", CommandKind::Later),
    exact("@thanks", CommandKind::Thanks),
    prefix("@reply", CommandKind::Reply),
    prefix("@unmonitor", CommandKind::Unmonitor),
    exact("@monitors", CommandKind::Monitors),
    prefix("@monitor", CommandKind::Monitor),
    prefix("@ia", CommandKind::Ia),
    prefix("@ask", CommandKind::Ask),
    prefix("@summarize", CommandKind::Summarize),
    prefix("@translate", CommandKind::Translate),
    prefix("@extract", CommandKind::Extract),
    prefix("@search", CommandKind::Search),
    prefix("@transcribe", CommandKind::Transcribe),
    prefix("@voice", CommandKind::Voice),
    exact("@chats", CommandKind::Chats),
    exact("@info", CommandKind::Info),
    exact("@archive", CommandKind::Archive),
];

impl Rule {
    /// The untrimmed remainder after the pattern, if the rule matches.
    fn matches<'t>(&self, text: &'t str) -> Option<&'t str> {
        match self.kind {
            MatchKind::Exact => (text == self.pattern).then_some(""),
            MatchKind::Prefix => {
                let rest = text.strip_prefix(self.pattern)?;
                (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
            }
        }
    }
}

/// Resolve already-trimmed text to a command and its argument remainder.
pub fn resolve(text: &str) -> Option<(CommandKind, &str)> {
    REGISTRY
        .iter()
        .find_map(|rule| rule.matches(text).map(|rest| (rule.command, rest)))
}

/// Everything a handler may touch.
pub struct CommandContext<'a> {
    pub store: &'a Store,
    pub transport: &'a Arc<dyn Transport>,
    pub ai: Option<&'a Arc<dyn AiService>>,
    pub trigger: &'a Trigger,
}

impl CommandContext<'_> {
    /// Send text back the way the trigger dictates.
    pub async fn respond(&self, text: impl Into<String>) -> Result<(), SidekickError> {
        self.respond_with(OutgoingMessage::text(text)).await
    }

    pub async fn respond_with(&self, message: OutgoingMessage) -> Result<(), SidekickError> {
        respond(self.transport.as_ref(), self.trigger, message).await?;
        Ok(())
    }
}

/// Run the handler for `kind`.
pub async fn run(
    kind: CommandKind,
    args: &str,
    ctx: &CommandContext<'_>,
) -> Result<(), SidekickError> {
    match kind {
        CommandKind::Help => ctx.respond(help_text()).await,
        CommandKind::PingReply => chat::ping_reply(ctx).await,
        CommandKind::Ping => ctx.respond("🏓 Pong!").await,
        CommandKind::Echo => chat::echo(ctx, args).await,
        CommandKind::Preview => chat::preview(ctx, args).await,
        CommandKind::SendTo => messaging::send_to(ctx, args).await,
        CommandKind::Notes => notes::list(ctx).await,
        CommandKind::ClearNotes => notes::clear(ctx).await,
        CommandKind::Note => notes::add(ctx, args).await,
        CommandKind::Todos => todos::list(ctx).await,
        CommandKind::Todo => todos::add(ctx, args).await,
        CommandKind::Done => todos::done(ctx, args).await,
        CommandKind::Reminder => timed::reminder(ctx, args).await,
        CommandKind::Scheduled => timed::list(ctx).await,
        CommandKind::Schedule => timed::schedule(ctx, args).await,
        CommandKind::Busy | CommandKind::Later | CommandKind::Thanks => {
            messaging::quick_reply(ctx, kind).await
        }
        CommandKind::Reply => messaging::reply(ctx, args).await,
        CommandKind::Unmonitor => messaging::unmonitor(ctx, args).await,
        CommandKind::Monitors => messaging::monitors(ctx).await,
        CommandKind::Monitor => messaging::monitor(ctx, args).await,
        CommandKind::Ia
        | CommandKind::Ask
        | CommandKind::Summarize
        | CommandKind::Translate
        | CommandKind::Extract
        | CommandKind::Search
        | CommandKind::Transcribe
        | CommandKind::Voice => assistant::handle(ctx, kind, args).await,
        CommandKind::Chats => chat::chats(ctx).await,
        CommandKind::Info => chat::info(ctx).await,
        CommandKind::Archive => chat::archive(ctx).await,
    }
}

/// Generic notice sent when a handler returns an error.
pub fn failure_notice(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::SendTo
        | CommandKind::Busy
        | CommandKind::Later
        | CommandKind::Thanks
        | CommandKind::Reply => "❌ Failed to send the message.",
        CommandKind::Note | CommandKind::Notes | CommandKind::ClearNotes => {
            "❌ Something went wrong with your notes."
        }
        CommandKind::Todo | CommandKind::Todos | CommandKind::Done => {
            "❌ Something went wrong with your to-do list."
        }
        CommandKind::Reminder => "❌ Could not set the reminder.",
        CommandKind::Schedule | CommandKind::Scheduled => "❌ Could not schedule the command.",
        CommandKind::Monitor | CommandKind::Unmonitor | CommandKind::Monitors => {
            "❌ Could not update chat monitoring."
        }
        CommandKind::Summarize => "❌ Failed to read the chat history.",
        CommandKind::Ia
        | CommandKind::Ask
        | CommandKind::Translate
        | CommandKind::Extract
        | CommandKind::Search
        | CommandKind::Transcribe
        | CommandKind::Voice => "❌ The AI request failed.",
        CommandKind::Chats => "❌ Failed to load your chats.",
        CommandKind::Info => "❌ Failed to read the session info.",
        CommandKind::Archive => "❌ Failed to archive the chat.",
        CommandKind::Help
        | CommandKind::Ping
        | CommandKind::PingReply
        | CommandKind::Echo
        | CommandKind::Preview => "❌ An error occurred while processing the command.",
    }
}

fn help_text() -> &'static str {
    "🤖 *Available commands*\n\
     \n\
     *General*\n\
     @help - this list\n\
     @ping - check that I'm alive (@ping reply quotes you)\n\
     @echo <text> - repeat text\n\
     @preview <text> - repeat text with a link preview\n\
     \n\
     *Notes & to-dos*\n\
     @note <text> / @notes / @clear-notes\n\
     @todo <text> / @todos / @done <n>\n\
     \n\
     *Timing*\n\
     @reminder <minutes> <text>\n\
     @schedule <HH:MM | YYYY-MM-DDTHH:MM> <@command>\n\
     @scheduled - pending commands and reminders\n\
     \n\
     *Messaging*\n\
     @sendto <number> <text>\n\
     @busy / @later / @thanks - quick reply to the last sender\n\
     @reply <text> - reply to the last sender\n\
     @monitor <id> / @unmonitor <id> / @monitors\n\
     \n\
     *AI*\n\
     @ia <prompt> / @ask <question>\n\
     @summarize [n] - summarize the last n messages (default 20)\n\
     @translate <language> <text>\n\
     @extract <text> / @search <query>\n\
     @transcribe <audio url> / @voice <text>\n\
     \n\
     *Chats*\n\
     @chats / @info / @archive"
}
