use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bind: String,
    pub motd: String,
    pub max_players: u32,
    /// Payloads at least this long are deflated. Negative disables compression.
    pub compression_threshold: i32,
    pub max_frame_length: usize,
    /// In ticks.
    pub keep_alive_interval: u64,
    /// Ticks past `keep_alive_interval` a player may go without acknowledging a keep-alive.
    pub keep_alive_timeout: u64,
    pub online_mode: bool,
    pub profile: ProfileConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:25565".into(),
            motd: "A cubeserv server".into(),
            max_players: 20,
            compression_threshold: 256,
            max_frame_length: 2 * 1024 * 1024,
            keep_alive_interval: 100,
            keep_alive_timeout: 100,
            online_mode: false,
            profile: ProfileConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProfileConfig {
    pub session_server: String,
    pub api_server: String,
    pub max_attempts: u32,
    pub backoff_secs: u64,
    /// Connect and read timeout for each request.
    pub timeout_secs: u64,
}
impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            session_server: "https://sessionserver.mojang.com".into(),
            api_server: "https://api.mojang.com".into(),
            max_attempts: 6,
            backoff_secs: 10,
            timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
