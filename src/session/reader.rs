//! Bridge reader task.
//!
//! Reads newline-delimited JSON events from the bridge's stdout, keeps the
//! shared [`WorldView`] current, and forwards lifecycle signals as
//! [`SessionEvent`]s.
//!
//! # Known inbound events
//!
//! | `event`     | Effect                                              |
//! |-------------|-----------------------------------------------------|
//! | `spawned`   | store position + game mode, emit `Spawned`          |
//! | `position`  | store position                                      |
//! | `game_mode` | store game mode                                     |
//! | `kicked`    | emit `Faulted`                                      |
//! | `error`     | emit `Faulted`                                      |
//! | `end`       | emit `Ended`                                        |
//! | *(other)*   | skipped; logged at `DEBUG`                          |

use std::sync::{Arc, PoisonError, RwLock};

use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::session::{GameMode, SessionEvent, Vec3};
use crate::session::codec::BridgeCodec;
use crate::{AppError, Result};

/// Latest world facts reported by the bridge, shared with the session handle.
#[derive(Debug, Default)]
pub struct WorldView {
    position: RwLock<Option<Vec3>>,
    game_mode: RwLock<GameMode>,
}

impl WorldView {
    /// Last reported position; `None` before spawn.
    #[must_use]
    pub fn position(&self) -> Option<Vec3> {
        *self
            .position
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Last reported game mode.
    #[must_use]
    pub fn game_mode(&self) -> GameMode {
        *self
            .game_mode
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_position(&self, pos: Vec3) {
        *self
            .position
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(pos);
    }

    fn set_game_mode(&self, mode: GameMode) {
        *self
            .game_mode
            .write()
            .unwrap_or_else(PoisonError::into_inner) = mode;
    }
}

/// Parsed inbound bridge event.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// Agent entered the world.
    Spawned {
        /// Spawn position.
        position: Vec3,
        /// Game mode at spawn.
        game_mode: GameMode,
    },
    /// Agent moved.
    Position(Vec3),
    /// Game mode changed.
    GameMode(GameMode),
    /// Server kicked the agent.
    Kicked {
        /// Kick reason as sent by the server.
        reason: String,
    },
    /// Bridge-side protocol or transport error.
    Error {
        /// Error text.
        message: String,
    },
    /// Connection closed.
    End {
        /// Close reason, if the bridge knows one.
        reason: String,
    },
}

impl BridgeEvent {
    /// Fold this event into `view` and return the lifecycle signal it implies.
    #[must_use]
    pub fn apply(self, view: &WorldView) -> Option<SessionEvent> {
        match self {
            Self::Spawned {
                position,
                game_mode,
            } => {
                view.set_position(position);
                view.set_game_mode(game_mode);
                Some(SessionEvent::Spawned)
            }
            Self::Position(position) => {
                view.set_position(position);
                None
            }
            Self::GameMode(mode) => {
                view.set_game_mode(mode);
                None
            }
            Self::Kicked { reason } => Some(SessionEvent::Faulted {
                reason: format!("kicked: {reason}"),
            }),
            Self::Error { message } => Some(SessionEvent::Faulted {
                reason: format!("error: {message}"),
            }),
            Self::End { reason } => Some(SessionEvent::Ended { reason }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpawnedParams {
    position: Vec3,
    #[serde(default)]
    game_mode: GameMode,
}

#[derive(Debug, Deserialize)]
struct GameModeParams {
    game_mode: GameMode,
}

#[derive(Debug, Deserialize)]
struct KickedParams {
    #[serde(default)]
    reason: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorParams {
    message: String,
}

#[derive(Debug, Deserialize)]
struct EndParams {
    #[serde(default = "default_end_reason")]
    reason: String,
}

fn default_end_reason() -> String {
    "connection closed".into()
}

/// Parse one NDJSON line from the bridge.
///
/// - `Ok(Some(event))`: a recognised event.
/// - `Ok(None)`: blank line or unknown `event` tag.
///
/// # Errors
///
/// Returns [`AppError::Bridge`] if the line is not JSON, has no `event`
/// tag, or a recognised event is missing a required field.
pub fn parse_inbound_line(line: &str) -> Result<Option<BridgeEvent>> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(line)?;
    let Some(kind) = value.get("event").and_then(Value::as_str).map(str::to_owned) else {
        return Err(AppError::Bridge("missing `event` tag".into()));
    };

    let event = match kind.as_str() {
        "spawned" => {
            let params: SpawnedParams = from_params(&kind, value)?;
            BridgeEvent::Spawned {
                position: params.position,
                game_mode: params.game_mode,
            }
        }
        "position" => BridgeEvent::Position(from_params(&kind, value)?),
        "game_mode" => {
            let params: GameModeParams = from_params(&kind, value)?;
            BridgeEvent::GameMode(params.game_mode)
        }
        "kicked" => {
            let params: KickedParams = from_params(&kind, value)?;
            // Kick reasons arrive as plain text or as a chat component.
            let reason = match params.reason {
                Value::String(text) => text,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            BridgeEvent::Kicked { reason }
        }
        "error" => {
            let params: ErrorParams = from_params(&kind, value)?;
            BridgeEvent::Error {
                message: params.message,
            }
        }
        "end" => {
            let params: EndParams = from_params(&kind, value)?;
            BridgeEvent::End {
                reason: params.reason,
            }
        }
        other => {
            debug!(event = other, "bridge reader: skipping unknown inbound event");
            return Ok(None);
        }
    };

    Ok(Some(event))
}

fn from_params<T: DeserializeOwned>(kind: &str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|err| AppError::Bridge(format!("invalid `{kind}` event: {err}")))
}

/// Bridge reader task.
///
/// Decoded lines go through [`parse_inbound_line`] and [`BridgeEvent::apply`].
/// Malformed lines are logged and skipped. EOF or an I/O error emits
/// [`SessionEvent::Ended`] and stops the task; so does a received `end`.
/// Cancellation stops the task without emitting anything.
pub async fn run_reader<R>(
    session_id: String,
    stdout: R,
    view: Arc<WorldView>,
    event_tx: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(stdout, BridgeCodec::new());

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(session_id, "bridge reader: cancellation received, stopping");
                break;
            }

            item = framed.next() => {
                let line = match item {
                    None => {
                        debug!(session_id, "bridge reader: EOF detected");
                        send_ended(&event_tx, "stream closed").await;
                        break;
                    }
                    Some(Err(AppError::Bridge(ref msg))) => {
                        warn!(session_id, error = msg.as_str(), "bridge reader: framing error, skipping");
                        continue;
                    }
                    Some(Err(e)) => {
                        warn!(session_id, error = %e, "bridge reader: IO error, stopping");
                        send_ended(&event_tx, &format!("stream error: {e}")).await;
                        break;
                    }
                    Some(Ok(line)) => line,
                };

                match parse_inbound_line(&line) {
                    Ok(Some(event)) => {
                        let Some(signal) = event.apply(&view) else {
                            continue;
                        };
                        let ended = matches!(signal, SessionEvent::Ended { .. });
                        if event_tx.send(signal).await.is_err() {
                            debug!(session_id, "bridge reader: event_tx closed, stopping");
                            break;
                        }
                        if ended {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(session_id, %err, "bridge reader: skipping malformed line");
                    }
                }
            }
        }
    }
}

async fn send_ended(event_tx: &mpsc::Sender<SessionEvent>, reason: &str) {
    let _ = event_tx
        .send(SessionEvent::Ended {
            reason: reason.to_owned(),
        })
        .await;
}
