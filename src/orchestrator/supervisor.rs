//! Connection supervisor.
//!
//! Keeps exactly one game session live (or connecting) at all times:
//! connect, wait for `Spawned` to start the action loop, wait for `Ended`,
//! cancel the loop, sleep [`RECONNECT_DELAY`], and go again. Forever.
//!
//! Each cycle runs on its own task so a panic anywhere in session handling
//! is contained, logged, and treated like an ordinary disconnect. Faults
//! (kicks, transport errors) are informational; only `Ended` drives a
//! reconnect.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::action_scheduler::{ActionScheduler, ActionSchedulerHandle};
use crate::context::AgentContext;
use crate::models::session::{MovementSettings, SessionEvent, SessionState};
use crate::session::{Connection, GameSession, SessionConnector};

/// Fixed wait between a session ending and the next connection attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// How one connection cycle finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The connector could not create a handle.
    ConnectFailed {
        /// Connector error text.
        reason: String,
    },
    /// The handle reached `Ended`.
    Ended {
        /// Identity of the ended handle.
        session_id: String,
        /// Close reason reported by the handle.
        reason: String,
    },
    /// Shutdown was requested mid-cycle.
    Shutdown,
}

/// Owns the create → run → detect failure → wait → recreate loop.
pub struct Supervisor {
    ctx: AgentContext,
    connector: Arc<dyn SessionConnector>,
}

impl Supervisor {
    /// Construct a supervisor; nothing connects until [`run`](Self::run).
    #[must_use]
    pub fn new(ctx: AgentContext, connector: Arc<dyn SessionConnector>) -> Self {
        Self { ctx, connector }
    }

    /// Run the supervisor on a background task.
    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel).instrument(info_span!("supervisor")))
    }

    /// Reconnect forever until `cancel` fires.
    ///
    /// The next attempt is never started before the previous cycle has fully
    /// returned, so two sessions cannot overlap.
    pub async fn run(self, cancel: CancellationToken) {
        info!(server = %self.ctx.config.server_addr(), "supervisor started");
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            let cycle = tokio::spawn(
                run_cycle(
                    Arc::clone(&self.connector),
                    self.ctx.action_rng(attempt),
                    cancel.clone(),
                )
                .instrument(info_span!("session_cycle", attempt)),
            );

            match cycle.await {
                Ok(CycleOutcome::Shutdown) => break,
                Ok(CycleOutcome::Ended { session_id, reason }) => {
                    info!(
                        session_id,
                        reason,
                        delay_secs = RECONNECT_DELAY.as_secs(),
                        "disconnected, reconnecting after backoff"
                    );
                }
                Ok(CycleOutcome::ConnectFailed { reason }) => {
                    warn!(
                        attempt,
                        reason,
                        delay_secs = RECONNECT_DELAY.as_secs(),
                        "session could not be created, retrying after backoff"
                    );
                }
                Err(err) if err.is_panic() => {
                    error!(attempt, %err, "session cycle panicked, treating as disconnect");
                }
                Err(err) => {
                    error!(attempt, %err, "session cycle aborted, treating as disconnect");
                }
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(RECONNECT_DELAY) => {}
            }
        }

        info!("supervisor shut down");
    }
}

/// Drive one session handle from creation to `Ended`.
pub async fn run_cycle(
    connector: Arc<dyn SessionConnector>,
    rng: StdRng,
    cancel: CancellationToken,
) -> CycleOutcome {
    let Connection {
        session,
        mut events,
    } = match connector.connect().await {
        Ok(connection) => connection,
        Err(err) => {
            return CycleOutcome::ConnectFailed {
                reason: err.to_string(),
            }
        }
    };

    let session_id = session.id().to_owned();
    let mut state = SessionState::Connecting;
    let mut rng = Some(rng);
    let mut scheduler: Option<ActionSchedulerHandle> = None;
    info!(session_id, "session connecting");

    let mut reason = String::new();
    let mut spawned = false;
    while state.is_live() {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => return CycleOutcome::Shutdown,
            event = events.recv() => event,
        };

        match event {
            Some(SessionEvent::Spawned) => {
                if !state.can_transition_to(SessionState::Spawned) {
                    debug!(session_id, ?state, "ignoring repeated spawn signal");
                    continue;
                }
                state = SessionState::Spawned;
                spawned = true;
                info!(session_id, "spawned in world");
                if let Some(rng) = rng.take() {
                    scheduler = Some(on_spawn(&session, rng));
                }
            }
            Some(SessionEvent::Faulted { reason }) => {
                warn!(session_id, reason, "session faulted");
            }
            Some(SessionEvent::Ended { reason: why }) => {
                state = SessionState::Ended;
                reason = why;
            }
            None => {
                state = SessionState::Ended;
                reason = "event stream closed".to_owned();
            }
        }
    }

    if let Some(handle) = scheduler.take() {
        handle.cancel();
    }
    info!(session_id, spawned, reason, "session ended");

    CycleOutcome::Ended { session_id, reason }
}

/// Apply movement defaults and start the action loop for a fresh spawn.
fn on_spawn(session: &Arc<dyn GameSession>, rng: StdRng) -> ActionSchedulerHandle {
    if let Err(err) = session.set_movements(MovementSettings::default()) {
        warn!(session_id = session.id(), %err, "failed to apply movement defaults");
    }
    ActionScheduler::new(Arc::clone(session), rng).spawn()
}
