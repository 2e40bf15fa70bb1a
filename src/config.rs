use std::path::PathBuf;

use crate::error::{KickError, Result};

pub const DEFAULT_PUSHER_URL: &str = "wss://ws-us2.pusher.com/app/32cbd69e4b950bf97679?protocol=7&client=js&version=8.4.0-rc2&flash=false";
pub const DEFAULT_API_BASE_URL: &str = "https://kick.com";
pub const DEFAULT_EVENT_BUFFER: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KickConfig {
    /// Pusher websocket endpoint, including the app key and protocol query
    pub pusher_url: String,

    /// Base URL for user lookups
    pub api_base_url: String,

    /// Directory for log files; stdout only when unset
    pub logs_dir: Option<PathBuf>,

    /// Capacity of the broadcast channel feeding event subscribers
    pub event_buffer: usize,
}

impl Default for KickConfig {
    fn default() -> Self {
        Self {
            pusher_url: DEFAULT_PUSHER_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            logs_dir: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl KickConfig {
    /// Defaults overridden by `KICK_PUSHER_URL`, `KICK_API_BASE_URL`,
    /// `KICK_LOGS_DIR` and `KICK_EVENT_BUFFER`. A `.env` file is loaded first
    /// when present.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(KickError::Configuration(format!(
                    "failed to load .env: {}",
                    e
                )));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("KICK_PUSHER_URL") {
            config.pusher_url = url;
        }
        if let Some(url) = lookup("KICK_API_BASE_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup("KICK_LOGS_DIR") {
            config.logs_dir = Some(PathBuf::from(dir));
        }
        if let Some(buffer) = lookup("KICK_EVENT_BUFFER") {
            config.event_buffer = buffer.trim().parse().map_err(|_| {
                KickError::Configuration(format!("KICK_EVENT_BUFFER is not a number: {}", buffer))
            })?;
        }

        Ok(config)
    }
}
