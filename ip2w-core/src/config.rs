use directories::ProjectDirs;
use serde::Deserialize;
use std::{fs, net::SocketAddr, path::Path, path::PathBuf, time::Duration};

use crate::error::ConfigError;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "IP2W_CONFIG";

pub const DEFAULT_IPINFO_URL: &str = "https://ipinfo.io";
pub const DEFAULT_OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Secrets for the two upstream services.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tokens {
    #[serde(default)]
    pub ipinfo_token: String,
    #[serde(default)]
    pub openweathermap_apikey: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// A `tracing` filter directive, e.g. "info" or "ip2w_core=debug".
    pub level: String,
    /// Append logs to this file instead of stderr.
    pub filename: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), filename: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: SocketAddr::from(([127, 0, 0, 1], 8080)) }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub timeout_secs: u64,
    /// Language code for weather descriptions.
    pub lang: String,
    pub ipinfo_url: String,
    pub openweather_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            lang: "ru".to_string(),
            ipinfo_url: DEFAULT_IPINFO_URL.to_string(),
            openweather_url: DEFAULT_OPENWEATHER_URL.to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [tokens]
/// ipinfo_token = "..."
/// openweathermap_apikey = "..."
///
/// [logging]
/// level = "info"
/// filename = "/var/log/ip2w.log"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tokens: Tokens,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Validated secrets, ready to hand to the upstream clients.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub ipinfo_token: String,
    pub openweathermap_apikey: String,
}

impl Config {
    /// Load config from the resolved default location.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        let cfg: Config = toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

        Ok(cfg)
    }

    /// Path to the config file: `$IP2W_CONFIG` if set, else the platform config dir.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let dirs = ProjectDirs::from("dev", "ip2w", "ip2w").ok_or(ConfigError::NoConfigDir)?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Both secrets, or an error naming the first one that is missing.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let ipinfo_token = non_empty(&self.tokens.ipinfo_token, "ipinfo_token")?;
        let openweathermap_apikey =
            non_empty(&self.tokens.openweathermap_apikey, "openweathermap_apikey")?;

        Ok(Credentials { ipinfo_token, openweathermap_apikey })
    }
}

fn non_empty(value: &str, name: &'static str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingToken(name));
    }
    Ok(trimmed.to_string())
}
