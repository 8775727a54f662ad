//! Bridge writer task.
//!
//! Receives [`BridgeCommand`]s from a tokio [`mpsc`] channel, serialises each
//! to one compact JSON line, and writes it to the bridge's stdin.

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::session::{BlockPos, Control};
use crate::{AppError, Result};

/// Outbound instruction for the bridge, tagged by `cmd` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BridgeCommand {
    /// Configure the movement planner.
    SetMovements {
        /// Whether the planner may break blocks.
        can_dig: bool,
    },
    /// Walk to a block.
    SetGoal {
        /// Block x.
        x: i32,
        /// Block y.
        y: i32,
        /// Block z.
        z: i32,
    },
    /// Press or release a control.
    Control {
        /// Which control.
        control: Control,
        /// `true` to press, `false` to release.
        state: bool,
    },
    /// Turn the head.
    Look {
        /// Yaw in radians.
        yaw: f64,
        /// Pitch in radians.
        pitch: f64,
        /// Apply instantly instead of interpolating.
        force: bool,
    },
    /// Send a chat message.
    Chat {
        /// Message text.
        message: String,
    },
}

impl From<BlockPos> for BridgeCommand {
    fn from(goal: BlockPos) -> Self {
        Self::SetGoal {
            x: goal.x,
            y: goal.y,
            z: goal.z,
        }
    }
}

/// Serialise a command as one NDJSON line, including the trailing `\n`.
///
/// # Errors
///
/// Returns [`AppError::Bridge`] if serialisation fails.
pub fn encode_command(command: &BridgeCommand) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(command)
        .map_err(|e| AppError::Bridge(format!("failed to serialise outbound command: {e}")))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Bridge writer task.
///
/// Exits cleanly when `cancel` fires or every sender is dropped.
///
/// # Errors
///
/// Returns [`AppError::Bridge`]`("write failed: …")` when the bridge's stdin
/// is gone (the process exited). The reader observes the same exit as EOF and
/// reports `Ended`, so the writer does not emit anything itself.
pub async fn run_writer<W>(
    session_id: String,
    stdin: W,
    mut cmd_rx: mpsc::Receiver<BridgeCommand>,
    cancel: CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut stdin = stdin;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(session_id, "bridge writer: cancellation received, stopping");
                break;
            }

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    debug!(session_id, "bridge writer: command channel closed, stopping");
                    break;
                };

                let bytes = encode_command(&cmd)?;
                stdin.write_all(&bytes).await.map_err(|e| {
                    warn!(session_id, error = %e, "bridge writer: write to stdin failed");
                    AppError::Bridge(format!("write failed: {e}"))
                })?;
                stdin.flush().await.map_err(|e| AppError::Bridge(format!("flush failed: {e}")))?;
            }
        }
    }

    Ok(())
}
