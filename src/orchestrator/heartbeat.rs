//! Keep-alive heartbeat.
//!
//! Logs the current UTC time once a minute from boot until shutdown,
//! independent of the game session. Some hosts treat a silent process as
//! idle; this keeps the log stream moving.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

/// Interval between heartbeat log lines.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn the heartbeat task. The first line is logged one interval after boot.
#[must_use]
pub fn spawn_heartbeat(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut interval =
                interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("heartbeat shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        info!(timestamp = %Utc::now().to_rfc3339(), "keep-alive");
                    }
                }
            }
        }
        .instrument(info_span!("heartbeat")),
    )
}
