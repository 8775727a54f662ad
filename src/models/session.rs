//! Session model and lifecycle helpers.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Lifecycle status for one game session handle.
///
/// A handle starts in `Connecting`, may reach `Spawned`, and always ends in
/// `Ended`. Nothing leaves `Ended`; the next cycle gets a fresh handle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Connection is being established; no world position yet.
    Connecting,
    /// Agent is present in the world.
    Spawned,
    /// Connection closed for any reason. Terminal.
    Ended,
}

impl SessionState {
    /// Determine whether a lifecycle transition is permitted.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Spawned | Self::Ended) | (Self::Spawned, Self::Ended)
        )
    }

    /// Whether the handle still occupies the single live-session slot.
    #[must_use]
    pub fn is_live(self) -> bool {
        !matches!(self, Self::Ended)
    }
}

/// Game mode reported by the remote world.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Standard survival play.
    Survival,
    /// Creative mode; holding jump makes the agent fly upward.
    Creative,
    /// Adventure mode.
    Adventure,
    /// Spectator mode.
    Spectator,
    /// Not reported yet, or a mode this crate does not know about.
    #[default]
    #[serde(other)]
    Unknown,
}

/// Position in world space.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    /// East/west axis.
    pub x: f64,
    /// Vertical axis.
    pub y: f64,
    /// North/south axis.
    pub z: f64,
}

impl Vec3 {
    /// Construct a vector from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Return this position shifted by the given deltas.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

/// Integer block coordinate used as a movement goal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BlockPos {
    /// Block x.
    pub x: i32,
    /// Block y.
    pub y: i32,
    /// Block z.
    pub z: i32,
}

impl From<Vec3> for BlockPos {
    #[allow(clippy::cast_possible_truncation)] // World coordinates fit comfortably in i32.
    fn from(pos: Vec3) -> Self {
        Self {
            x: pos.x.floor() as i32,
            y: pos.y.floor() as i32,
            z: pos.z.floor() as i32,
        }
    }
}

/// Movement control keys the agent can hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Jump (or ascend while flying).
    Jump,
    /// Walk forward.
    Forward,
    /// Walk backward.
    Back,
    /// Strafe left.
    Left,
    /// Strafe right.
    Right,
    /// Sprint modifier.
    Sprint,
    /// Sneak (or descend while flying).
    Sneak,
}

impl Display for Control {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Jump => "jump",
            Self::Forward => "forward",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
            Self::Sprint => "sprint",
            Self::Sneak => "sneak",
        };
        f.write_str(name)
    }
}

/// Movement-planner settings applied once the agent spawns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovementSettings {
    /// Whether the planner may break blocks to reach a goal.
    pub can_dig: bool,
}

impl Default for MovementSettings {
    /// Idle agents never modify terrain.
    fn default() -> Self {
        Self { can_dig: false }
    }
}

/// Lifecycle signal emitted by a session handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The agent entered the world and has a position.
    Spawned,
    /// Protocol-level rejection or transport error. Informational only.
    Faulted {
        /// Human-readable cause (kick reason, error text).
        reason: String,
    },
    /// The connection closed. Authoritative end of the handle.
    Ended {
        /// Human-readable cause.
        reason: String,
    },
}
