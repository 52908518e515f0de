//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::Language;
use crate::error::ConfigError;

/// Assistant configuration.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Base URL of the HTTP collaborators (`/recommend-scheme`, `/chat`, ...).
    pub backend_url: String,
    /// Language the conversation starts in.
    pub language: Language,
    /// Form to fill without triage.
    pub scheme: Option<String>,
    /// Timeout applied to every collaborator request.
    pub request_timeout: Duration,
    /// Pause between the completion message and document generation.
    pub document_delay: Duration,
    /// Port of the session API. `None` disables it.
    pub api_port: Option<u16>,
    /// Where generated documents and scratch audio are written.
    pub output_dir: PathBuf,
    /// Command used to play synthesized audio.
    pub audio_player: String,
    /// On-device TTS command.
    pub local_voice: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000/api".to_string(),
            language: Language::Hi,
            scheme: None,
            request_timeout: Duration::from_secs(15),
            document_delay: Duration::from_millis(1500),
            api_port: Some(8090),
            output_dir: PathBuf::from("./data"),
            audio_player: "mpg123".to_string(),
            local_voice: "espeak-ng".to_string(),
        }
    }
}

impl AssistantConfig {
    /// Build config from `JAN_SAHAYAK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Unset or blank keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(url) = get("JAN_SAHAYAK_BACKEND_URL") {
            config.backend_url = url.trim_end_matches('/').to_string();
        }

        if let Some(tag) = get("JAN_SAHAYAK_LANGUAGE") {
            config.language =
                Language::from_tag(&tag).ok_or_else(|| ConfigError::InvalidValue {
                    key: "JAN_SAHAYAK_LANGUAGE".to_string(),
                    message: format!("unsupported language '{tag}'"),
                })?;
        }

        config.scheme = get("JAN_SAHAYAK_SCHEME");

        if let Some(secs) = get("JAN_SAHAYAK_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_number("JAN_SAHAYAK_REQUEST_TIMEOUT_SECS", &secs)?);
        }

        if let Some(ms) = get("JAN_SAHAYAK_DOCUMENT_DELAY_MS") {
            config.document_delay =
                Duration::from_millis(parse_number("JAN_SAHAYAK_DOCUMENT_DELAY_MS", &ms)?);
        }

        if let Some(port) = get("JAN_SAHAYAK_API_PORT") {
            let port: u16 = parse_number("JAN_SAHAYAK_API_PORT", &port)?;
            config.api_port = (port != 0).then_some(port);
        }

        if let Some(dir) = get("JAN_SAHAYAK_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        if let Some(player) = get("JAN_SAHAYAK_AUDIO_PLAYER") {
            config.audio_player = player;
        }

        if let Some(voice) = get("JAN_SAHAYAK_LOCAL_VOICE") {
            config.local_voice = voice;
        }

        Ok(config)
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{value}': {e}"),
    })
}
