//! Per-session randomized action loop.
//!
//! Each spawned session gets one [`ActionScheduler`]. Before every tick it
//! draws a fresh period from `[8000, 12000)` ms, then runs one uniformly
//! chosen [`Action`]. Ticks where the session has no position yet are
//! skipped. Overlapping actions are allowed; a long ascent does not delay
//! the next tick.
//!
//! The loop stops when its [`ActionSchedulerHandle`] is cancelled or dropped.
//! Optional [`TickEvent`]s are delivered via a `tokio::sync::mpsc` channel
//! for observers; a slow observer never stalls the loop.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use super::actions::{self, Action};
use crate::session::GameSession;

/// Lower bound (inclusive) of the tick period, in milliseconds.
pub const MIN_TICK_MS: u64 = 8_000;

/// Upper bound (exclusive) of the tick period, in milliseconds.
pub const MAX_TICK_MS: u64 = 12_000;

/// Draw the next tick period uniformly from `[MIN_TICK_MS, MAX_TICK_MS)`.
#[must_use]
pub fn next_interval<R: Rng>(rng: &mut R) -> Duration {
    Duration::from_millis(rng.random_range(MIN_TICK_MS..MAX_TICK_MS))
}

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// The session had no position; nothing ran.
    Skipped,
    /// `action` was invoked.
    Performed {
        /// The action chosen for this tick.
        action: Action,
    },
}

/// Builder for a per-session action loop.
///
/// Call [`spawn`](Self::spawn) to start the background task.
pub struct ActionScheduler {
    session: Arc<dyn GameSession>,
    rng: StdRng,
    cancel: CancellationToken,
    tick_tx: Option<mpsc::Sender<TickEvent>>,
}

impl ActionScheduler {
    /// Construct a scheduler bound to `session` (does not start it yet).
    #[must_use]
    pub fn new(session: Arc<dyn GameSession>, rng: StdRng) -> Self {
        Self {
            session,
            rng,
            cancel: CancellationToken::new(),
            tick_tx: None,
        }
    }

    /// Report every tick outcome on `tx`. Events are dropped if `tx` is full.
    #[must_use]
    pub fn with_tick_events(mut self, tx: mpsc::Sender<TickEvent>) -> Self {
        self.tick_tx = Some(tx);
        self
    }

    /// Spawn the loop and return the handle that controls it.
    #[must_use]
    pub fn spawn(self) -> ActionSchedulerHandle {
        let session_id = self.session.id().to_owned();
        let cancel = self.cancel.clone();
        let join_handle = tokio::spawn(
            Self::run(self.session, self.rng, self.cancel, self.tick_tx)
                .instrument(info_span!("action_scheduler", session_id = %session_id)),
        );

        ActionSchedulerHandle {
            session_id,
            join_handle: Some(join_handle),
            cancel,
        }
    }

    async fn run(
        session: Arc<dyn GameSession>,
        mut rng: StdRng,
        cancel: CancellationToken,
        tick_tx: Option<mpsc::Sender<TickEvent>>,
    ) {
        info!("action loop started");

        loop {
            let period = next_interval(&mut rng);
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    info!("action loop stopped");
                    return;
                }
                () = tokio::time::sleep(period) => {}
            }

            let outcome = Self::tick(&session, &mut rng, &cancel);
            if let Some(tx) = &tick_tx {
                let _ = tx.try_send(outcome);
            }
        }
    }

    fn tick(
        session: &Arc<dyn GameSession>,
        rng: &mut StdRng,
        cancel: &CancellationToken,
    ) -> TickEvent {
        if session.position().is_none() {
            return TickEvent::Skipped;
        }

        let action = Action::pick(rng);
        debug!(%action, "performing idle action");
        actions::perform(action, session, rng, cancel);
        TickEvent::Performed { action }
    }
}

/// Handle returned from [`ActionScheduler::spawn`].
///
/// Cancelling (or dropping) the handle stops the loop and any pending
/// key releases it started.
pub struct ActionSchedulerHandle {
    session_id: String,
    join_handle: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl Drop for ActionSchedulerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl ActionSchedulerHandle {
    /// Stop the loop. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop has been told to stop.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The session this loop acts on.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Stop the loop and wait for its task to exit.
    pub async fn await_completion(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.await;
        }
    }
}
