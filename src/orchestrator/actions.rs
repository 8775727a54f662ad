//! Idle action catalog.
//!
//! Four independent actions run against a spawned [`GameSession`]. Each one
//! issues its instructions immediately; timed key releases are detached
//! tasks so the caller never waits for an action to finish visually.
//! Chat notifications are best-effort and never abort an action.

use std::f64::consts::{FRAC_PI_6, TAU};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::session::{BlockPos, Control, GameMode};
use crate::session::GameSession;

/// Maximum horizontal distance, in blocks, of a random walk target.
pub const WALK_RANGE: i32 = 20;

/// How long a single jump holds the jump control.
pub const JUMP_HOLD: Duration = Duration::from_millis(500);

/// How long an ascent holds the jump control in creative mode.
pub const ASCEND_HOLD: Duration = Duration::from_millis(3_000);

/// Chat line sent by [`Action::Jump`].
pub const JUMP_MESSAGE: &str = "Jump!";

/// Chat line sent by [`Action::Ascend`] in creative mode.
pub const ASCEND_MESSAGE: &str = "Flying up!";

/// Chat line sent by [`Action::Ascend`] outside creative mode.
pub const CANNOT_ASCEND_MESSAGE: &str = "Can't fly here";

/// One randomized idle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Walk to a random nearby block.
    Locomotion,
    /// Tap jump.
    Jump,
    /// Fly upward if the game mode allows it.
    Ascend,
    /// Look in a random direction.
    Look,
}

impl Action {
    /// Every action, in selection order.
    pub const ALL: [Self; 4] = [Self::Locomotion, Self::Jump, Self::Ascend, Self::Look];

    /// Pick one action uniformly at random.
    #[must_use]
    pub fn pick<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Stable name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locomotion => "locomotion",
            Self::Jump => "jump",
            Self::Ascend => "ascend",
            Self::Look => "look",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run `action` against `session`.
///
/// `cancel` bounds the detached key-release tasks: once the owning scheduler
/// is cancelled they stop without touching the session again.
pub fn perform<R: Rng>(
    action: Action,
    session: &Arc<dyn GameSession>,
    rng: &mut R,
    cancel: &CancellationToken,
) {
    match action {
        Action::Locomotion => walk_random(session.as_ref(), rng),
        Action::Jump => jump_once(session, cancel),
        Action::Ascend => fly_up(session, cancel),
        Action::Look => look_around(session.as_ref(), rng),
    }
}

/// Walk to a block up to [`WALK_RANGE`] away on each horizontal axis.
///
/// Reachability is the movement planner's problem.
pub fn walk_random<R: Rng>(session: &dyn GameSession, rng: &mut R) {
    let Some(position) = session.position() else {
        return;
    };

    let dx = rng.random_range(-WALK_RANGE..=WALK_RANGE);
    let dz = rng.random_range(-WALK_RANGE..=WALK_RANGE);
    let target = position.offset(f64::from(dx), 0.0, f64::from(dz));

    notify(
        session,
        &format!("Walking to {:.1}, {:.1}", target.x, target.z),
    );
    if let Err(err) = session.set_goal(BlockPos::from(target)) {
        debug!(session_id = session.id(), %err, "movement goal rejected");
    }
}

/// Hold jump for [`JUMP_HOLD`]. Allowed in every game mode.
pub fn jump_once(session: &Arc<dyn GameSession>, cancel: &CancellationToken) {
    notify(session.as_ref(), JUMP_MESSAGE);
    hold_control(session, Control::Jump, JUMP_HOLD, cancel);
}

/// In creative mode hold jump for [`ASCEND_HOLD`]; elsewhere only announce
/// that flying is not possible.
pub fn fly_up(session: &Arc<dyn GameSession>, cancel: &CancellationToken) {
    if session.game_mode() == GameMode::Creative {
        notify(session.as_ref(), ASCEND_MESSAGE);
        hold_control(session, Control::Jump, ASCEND_HOLD, cancel);
    } else {
        notify(session.as_ref(), CANNOT_ASCEND_MESSAGE);
    }
}

/// Face a random yaw in `[0, 2π)` and pitch in `[-π/6, π/6]`.
pub fn look_around<R: Rng>(session: &dyn GameSession, rng: &mut R) {
    let yaw = rng.random_range(0.0..TAU);
    let pitch = rng.random_range(-FRAC_PI_6..=FRAC_PI_6);
    if let Err(err) = session.look(yaw, pitch, true) {
        debug!(session_id = session.id(), %err, "look rejected");
    }
}

fn notify(session: &dyn GameSession, message: &str) {
    if let Err(err) = session.chat(message) {
        debug!(session_id = session.id(), %err, "chat notification dropped");
    }
}

/// Press `control` now and release it after `hold` on a detached task.
fn hold_control(
    session: &Arc<dyn GameSession>,
    control: Control,
    hold: Duration,
    cancel: &CancellationToken,
) {
    if let Err(err) = session.set_control_state(control, true) {
        debug!(session_id = session.id(), %err, %control, "control press rejected");
        return;
    }

    let session = Arc::clone(session);
    let cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {}
            () = tokio::time::sleep(hold) => {
                if let Err(err) = session.set_control_state(control, false) {
                    debug!(session_id = session.id(), %err, %control, "control release rejected");
                }
            }
        }
    });
}
