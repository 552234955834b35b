//! Startup configuration and secret loading
//!
//! The API key is the only required value. It is looked up in the process
//! environment first and then in a TOML secrets file; if neither has it,
//! startup stops with a [`ConfigError`]. Everything else has a default.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the secret holding the provider API key
pub const API_KEY_SECRET: &str = "GOOGLE_API_KEY";

const SECRETS_PATH_VAR: &str = "CHATLINE_SECRETS_PATH";
const DEFAULT_SECRETS_PATH: &str = ".chatline/secrets.toml";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_RENDER_DELAY_MS: u64 = 50;
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not set: export it or add it to {}", path.display())]
    MissingSecret { name: &'static str, path: PathBuf },
    #[error("Cannot read secrets file {}: {message}", path.display())]
    InvalidSecretsFile { path: PathBuf, message: String },
    #[error("Invalid value for {name}: {value:?}")]
    InvalidSetting { name: &'static str, value: String },
}

/// A secret string that never shows up in `Debug` output or logs.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Secret,
    pub model: String,
    /// Override for the provider endpoint
    pub api_base: Option<String>,
    pub port: u16,
    /// Pause between progressive render frames
    pub render_delay: Duration,
    /// Idle time after which a session is dropped
    pub session_ttl: Duration,
}

impl AppConfig {
    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = load_secret(&lookup, API_KEY_SECRET)?;

        let model = lookup("CHATLINE_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base = lookup("CHATLINE_API_BASE").filter(|b| !b.trim().is_empty());

        let port = parse_setting(&lookup, "CHATLINE_PORT")?.unwrap_or(DEFAULT_PORT);
        let render_delay_ms =
            parse_setting(&lookup, "CHATLINE_RENDER_DELAY_MS")?.unwrap_or(DEFAULT_RENDER_DELAY_MS);
        let session_ttl_secs = parse_setting(&lookup, "CHATLINE_SESSION_TTL_SECS")?
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);

        Ok(Self {
            api_key,
            model,
            api_base,
            port,
            render_delay: Duration::from_millis(render_delay_ms),
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }
}

fn parse_setting<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidSetting { name, value }),
    }
}

/// Look up a named secret: environment first, then the secrets file.
///
/// Blank values count as absent.
pub fn load_secret<F>(lookup: &F, name: &'static str) -> Result<Secret, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
        return Ok(Secret::new(value));
    }

    let path = lookup(SECRETS_PATH_VAR)
        .map_or_else(|| PathBuf::from(DEFAULT_SECRETS_PATH), PathBuf::from);

    match read_secrets_file(&path, name)? {
        Some(value) => {
            tracing::debug!(path = %path.display(), secret = name, "Loaded secret from file");
            Ok(Secret::new(value))
        }
        None => Err(ConfigError::MissingSecret { name, path }),
    }
}

fn read_secrets_file(path: &Path, name: &str) -> Result<Option<String>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::InvalidSecretsFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };

    let table: toml::Table =
        contents
            .parse()
            .map_err(|e: toml::de::Error| ConfigError::InvalidSecretsFile {
                path: path.to_path_buf(),
                message: e.message().to_string(),
            })?;

    Ok(table
        .get(name)
        .and_then(toml::Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string))
}
