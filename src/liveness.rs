//! HTTP liveness responder for external uptime monitors.
//!
//! Two routes, both independent of the game session:
//!
//! | Route       | Response                                              |
//! |-------------|-------------------------------------------------------|
//! | `GET /`     | `Minecraft bot is alive.`                             |
//! | `GET /ping` | `pong`, or a JSON uptime message with [`PingFormat::Json`] |

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{AppError, Result};

/// Body returned by `GET /`.
pub const ROOT_BODY: &str = "Minecraft bot is alive.";

/// Body returned by `GET /ping` in [`PingFormat::Text`].
pub const PONG_BODY: &str = "pong";

const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Response variant for `GET /ping`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PingFormat {
    /// Plain `pong`.
    #[default]
    Text,
    /// `{"message": "Server is online for ..."}`.
    Json,
}

impl FromStr for PingFormat {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AppError::Config(format!(
                "PING_FORMAT must be `text` or `json`, got `{other}`"
            ))),
        }
    }
}

/// Elapsed time broken into whole days, hours, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UptimeParts {
    /// Whole days.
    pub days: u64,
    /// Hours past the last whole day.
    pub hours: u64,
    /// Minutes past the last whole hour.
    pub minutes: u64,
    /// Seconds past the last whole minute.
    pub seconds: u64,
}

impl UptimeParts {
    /// Decompose `elapsed` using floor division; sub-second remainders are dropped.
    #[must_use]
    pub fn from_elapsed(elapsed: Duration) -> Self {
        let total = elapsed.as_secs();
        Self {
            days: total / SECONDS_PER_DAY,
            hours: (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
            minutes: (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total % SECONDS_PER_MINUTE,
        }
    }

    /// Human-readable uptime sentence served by the JSON ping variant.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Server is online for {} day(s) {} hour(s) {} minute(s) {} second(s)",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// JSON body of the uptime ping variant.
#[derive(Debug, Clone, Serialize)]
pub struct PingMessage {
    /// See [`UptimeParts::message`].
    pub message: String,
}

/// State shared by the liveness handlers.
#[derive(Debug, Clone)]
pub struct LivenessState {
    started_at: Instant,
    ping_format: PingFormat,
}

impl LivenessState {
    /// Build state measuring uptime from `started_at`.
    #[must_use]
    pub fn new(started_at: Instant, ping_format: PingFormat) -> Self {
        Self {
            started_at,
            ping_format,
        }
    }

    /// Uptime since the responder's start instant.
    #[must_use]
    pub fn uptime(&self) -> UptimeParts {
        UptimeParts::from_elapsed(self.started_at.elapsed())
    }
}

async fn root() -> &'static str {
    ROOT_BODY
}

async fn ping(State(state): State<Arc<LivenessState>>) -> Response {
    match state.ping_format {
        PingFormat::Text => PONG_BODY.into_response(),
        PingFormat::Json => Json(PingMessage {
            message: state.uptime().message(),
        })
        .into_response(),
    }
}

/// Build the liveness router.
#[must_use]
pub fn router(state: Arc<LivenessState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ping", get(ping))
        .with_state(state)
}

/// Bind the liveness listener on all interfaces.
///
/// # Errors
///
/// Returns `AppError::Http` if the port cannot be bound.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Http(format!("failed to bind liveness on {addr}: {err}")))
}

/// Serve the liveness routes on `listener` until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Http` if the server stops with an I/O error.
pub async fn serve(
    listener: TcpListener,
    state: Arc<LivenessState>,
    ct: CancellationToken,
) -> Result<()> {
    let local = listener
        .local_addr()
        .map_err(|err| AppError::Http(format!("liveness listener has no address: {err}")))?;
    info!(%local, "liveness listening, endpoints: / & /ping");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Http(format!("liveness server error: {err}")))?;

    info!("liveness responder shut down");
    Ok(())
}
