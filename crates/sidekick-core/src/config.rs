use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SidekickError;

/// Top-level Sidekick configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sidekick: SidekickConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// File the config was read from; `None` when running on defaults.
    #[serde(skip)]
    pub loaded_from: Option<String>,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidekickConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SidekickConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// WhatsApp bridge connection.
///
/// The bridge is a sidecar holding the WhatsApp Web session; Sidekick talks
/// to it over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    /// Bearer token for the bridge. Empty = no auth header.
    #[serde(default)]
    pub api_token: String,
    /// Long-poll timeout for inbound events.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            api_token: String::new(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

/// External AI service config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Per-request timeout in seconds (default: 60).
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
    /// Treat plain text in the owner's self-chat as an `@ia` prompt.
    #[serde(default)]
    pub self_chat_assistant: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_ai_base_url(),
            api_key: String::new(),
            timeout_secs: default_ai_timeout(),
            self_chat_assistant: false,
        }
    }
}

/// Scheduled-command sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// HTTP control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Bearer token required on `/api/*`. Empty = open.
    #[serde(default)]
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_api_host(),
            port: default_api_port(),
            api_key: String::new(),
        }
    }
}

// --- Default value functions ---

fn default_name() -> String {
    "Sidekick".to_string()
}
fn default_data_dir() -> String {
    "~/.sidekick".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_bridge_url() -> String {
    "http://127.0.0.1:3001".to_string()
}
fn default_poll_timeout() -> u64 {
    30
}
fn default_ai_base_url() -> String {
    "http://127.0.0.1:8000/api/ai".to_string()
}
fn default_ai_timeout() -> u64 {
    60
}
fn default_poll_interval() -> u64 {
    60
}
fn default_api_host() -> String {
    "127.0.0.1".to_string()
}
fn default_api_port() -> u16 {
    3000
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Fill empty secrets from the environment.
fn apply_env_overrides(config: &mut Config) {
    if config.ai.api_key.is_empty() {
        if let Ok(key) = std::env::var("SIDEKICK_AI_API_KEY") {
            config.ai.api_key = key;
        }
    }
    if config.whatsapp.api_token.is_empty() {
        if let Ok(token) = std::env::var("SIDEKICK_BRIDGE_TOKEN") {
            config.whatsapp.api_token = token;
        }
    }
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Runs before logging is
/// up, so the outcome is recorded in `loaded_from` for the caller to report.
pub fn load(path: &str) -> Result<Config, SidekickError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SidekickError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| SidekickError::Config(format!("failed to parse config: {}", e)))?;
        config.loaded_from = Some(path.display().to_string());
        config
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_sections_missing() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.sidekick.name, "Sidekick");
        assert_eq!(cfg.scheduler.poll_interval_secs, 60);
        assert!(cfg.scheduler.enabled);
        assert_eq!(cfg.api.port, 3000);
        assert_eq!(cfg.ai.timeout_secs, 60);
        assert!(!cfg.ai.self_chat_assistant);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let toml_str = r#"
            [ai]
            enabled = true
            timeout_secs = 15

            [api]
            port = 8080
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert!(cfg.ai.enabled);
        assert_eq!(cfg.ai.timeout_secs, 15);
        assert_eq!(cfg.ai.base_url, "http://127.0.0.1:8000/api/ai");
        assert_eq!(cfg.api.port, 8080);
        assert_eq!(cfg.api.host, "127.0.0.1");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cfg = load("/nonexistent/__sidekick__/config.toml").unwrap();
        assert_eq!(cfg.whatsapp.bridge_url, "http://127.0.0.1:3001");
        assert!(cfg.loaded_from.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[whatsapp]\nbridge_url = \"http://bridge:9000\"\n\n[scheduler]\npoll_interval_secs = 5"
        )
        .unwrap();
        let cfg = load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.whatsapp.bridge_url, "http://bridge:9000");
        assert_eq!(cfg.scheduler.poll_interval_secs, 5);
        assert_eq!(
            cfg.loaded_from.as_deref(),
            Some(file.path().to_str().unwrap())
        );
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nport = ").unwrap();
        let err = load(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SidekickError::Config(_)));
    }

    #[test]
    fn test_shellexpand_leaves_absolute_paths() {
        assert_eq!(shellexpand("/var/lib/sidekick"), "/var/lib/sidekick");
    }
}
