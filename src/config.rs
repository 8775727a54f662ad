//! Environment-sourced configuration parsing and validation.
//!
//! Every setting has a documented default. Empty values behave like unset
//! ones, so a blank `MC_PASSWORD=` still means offline mode.

use std::env;
use std::str::FromStr;

use crate::liveness::PingFormat;
use crate::{AppError, Result};

/// Default game server host.
pub const DEFAULT_HOST: &str = "localhost";
/// Default game protocol port.
pub const DEFAULT_GAME_PORT: u16 = 25565;
/// Default agent identity.
pub const DEFAULT_USERNAME: &str = "RandomBot";
/// Default liveness HTTP port.
pub const DEFAULT_HTTP_PORT: u16 = 3000;
/// Default session bridge command line.
pub const DEFAULT_BRIDGE_COMMAND: &str = "node bridge.js";

/// Log output format.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AppError::Config(format!(
                "LOG_FORMAT must be `text` or `json`, got `{other}`"
            ))),
        }
    }
}

/// Bot configuration assembled from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// Game server host (`MC_HOST`).
    pub host: String,
    /// Game server port (`MC_PORT`).
    pub port: u16,
    /// Agent identity (`MC_USERNAME`).
    pub username: String,
    /// Optional credential (`MC_PASSWORD`); `None` means offline mode.
    pub password: Option<String>,
    /// Liveness HTTP listen port (`PORT`).
    pub http_port: u16,
    /// Response variant for `GET /ping` (`PING_FORMAT`).
    pub ping_format: PingFormat,
    /// Log output format (`LOG_FORMAT`).
    pub log_format: LogFormat,
    /// Program and arguments of the session bridge (`BRIDGE_CMD`).
    pub bridge_command: Vec<String>,
    /// Optional seed for the action scheduler's random source (`BOT_SEED`).
    pub seed: Option<u64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_GAME_PORT,
            username: DEFAULT_USERNAME.to_owned(),
            password: None,
            http_port: DEFAULT_HTTP_PORT,
            ping_format: PingFormat::default(),
            log_format: LogFormat::default(),
            bridge_command: split_command(DEFAULT_BRIDGE_COMMAND),
            seed: None,
        }
    }
}

impl BotConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a present variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// `MC_PORT` falls back to the default when it is not a positive number,
    /// matching how the bot has always been deployed. `PORT` and `BOT_SEED`
    /// are strict because a wrong value there cannot be guessed around.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unparsable `PORT`, `BOT_SEED`,
    /// `PING_FORMAT` or `LOG_FORMAT`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = get("MC_PORT")
            .and_then(|raw| raw.trim().parse::<u16>().ok())
            .filter(|port| *port != 0)
            .unwrap_or(DEFAULT_GAME_PORT);

        let http_port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|err| AppError::Config(format!("PORT invalid: {err}")))?,
            None => DEFAULT_HTTP_PORT,
        };

        let seed = get("BOT_SEED")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|err| AppError::Config(format!("BOT_SEED invalid: {err}")))
            })
            .transpose()?;

        Ok(Self {
            host: get("MC_HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port,
            username: get("MC_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_owned()),
            password: get("MC_PASSWORD"),
            http_port,
            ping_format: get("PING_FORMAT")
                .map(|raw| raw.parse::<PingFormat>())
                .transpose()?
                .unwrap_or_default(),
            log_format: get("LOG_FORMAT")
                .map(|raw| raw.parse::<LogFormat>())
                .transpose()?
                .unwrap_or_default(),
            bridge_command: split_command(
                get("BRIDGE_CMD").as_deref().unwrap_or(DEFAULT_BRIDGE_COMMAND),
            ),
            seed,
        })
    }

    /// `host:port` of the game server, for logs.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether the session runs without a credential.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.password.is_none()
    }
}

fn split_command(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_owned).collect()
}
