mod api;
mod commands;
mod gateway;
#[cfg(test)]
mod test_support;

use clap::{Parser, Subcommand};
use sidekick_channels::WhatsAppBridge;
use sidekick_core::{
    config::{self, shellexpand},
    jid::normalize_chat_id,
    message::OutgoingMessage,
    traits::{AiService, Transport},
};
use sidekick_memory::Store;
use sidekick_providers::HttpAiService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "sidekick",
    version,
    about = "Sidekick — personal assistant bot for WhatsApp"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Show configuration and bridge connectivity.
    Status,
    /// Send a one-shot message through the bridge.
    Send {
        /// Phone number or chat id.
        number: String,
        /// The message to send.
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    let _log_guard = init_logging(&cfg.sidekick.data_dir, &cfg.sidekick.log_level);
    match &cfg.loaded_from {
        Some(path) => tracing::info!("Loaded config from {path}"),
        None => tracing::info!("Config file not found at {}, using defaults", cli.config),
    }

    match cli.command {
        Commands::Start => {
            let transport: Arc<dyn Transport> = Arc::new(WhatsAppBridge::new(cfg.whatsapp.clone()));

            let ai: Option<Arc<dyn AiService>> = if cfg.ai.enabled {
                if cfg.ai.base_url.is_empty() {
                    anyhow::bail!("AI is enabled but ai.base_url is empty. Set it in config.toml.");
                }
                Some(Arc::new(HttpAiService::from_config(&cfg.ai)))
            } else {
                None
            };

            println!("{} — starting...", cfg.sidekick.name);
            let gw = Arc::new(gateway::Gateway::new(transport, ai, Store::new(), &cfg));
            gw.run().await?;
        }
        Commands::Status => {
            println!("{} — Status Check\n", cfg.sidekick.name);
            println!("Config: {}", cli.config);
            println!("Data dir: {}", shellexpand(&cfg.sidekick.data_dir));
            println!(
                "AI: {}",
                if cfg.ai.enabled {
                    cfg.ai.base_url.as_str()
                } else {
                    "disabled"
                }
            );
            println!(
                "API: {}",
                if cfg.api.enabled {
                    format!("{}:{}", cfg.api.host, cfg.api.port)
                } else {
                    "disabled".to_string()
                }
            );
            println!();

            let bridge = WhatsAppBridge::new(cfg.whatsapp.clone());
            match bridge.status().await {
                Ok(status) => println!(
                    "  whatsapp: {} ({})",
                    if status.connected {
                        "connected"
                    } else {
                        "not paired"
                    },
                    status.wid.as_deref().unwrap_or("no session")
                ),
                Err(e) => println!("  whatsapp: unreachable at {} ({e})", cfg.whatsapp.bridge_url),
            }
        }
        Commands::Send { number, text } => {
            if text.is_empty() {
                anyhow::bail!("no message provided. Usage: sidekick send <number> <message>");
            }

            let destination = normalize_chat_id(&number);
            let bridge = WhatsAppBridge::new(cfg.whatsapp.clone());
            let id = bridge
                .send(&destination, OutgoingMessage::text(text.join(" ")))
                .await?;
            println!("Sent {id} to {destination}");
        }
    }

    Ok(())
}

/// Log to stdout and to a daily rolling file under `{data_dir}/logs`.
///
/// The returned guard flushes the file writer on drop; keep it alive.
fn init_logging(data_dir: &str, level: &str) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let stdout_layer = tracing_subscriber::fmt::layer();

    let log_dir = PathBuf::from(shellexpand(data_dir)).join("logs");
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("cannot create log dir {}: {e}", log_dir.display());
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "sidekick.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();
    Some(guard)
}
