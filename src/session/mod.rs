//! Game session abstraction.
//!
//! The [`GameSession`] trait is the only surface the supervisor, scheduler
//! and action catalog touch. The world protocol, login and path planning
//! live behind it. The binary uses the NDJSON [`bridge`] implementation; tests
//! substitute in-memory fakes.
//!
//! Submodules:
//! - `codec`: line framing for the bridge's stdout.
//! - `reader`: parses inbound bridge events and tracks position/game mode.
//! - `writer`: serialises outbound commands to the bridge's stdin.
//! - `bridge`: process spawning and the [`bridge::BridgeSession`] handle.

pub mod bridge;
pub mod codec;
pub mod reader;
pub mod writer;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::models::session::{BlockPos, Control, GameMode, MovementSettings, SessionEvent, Vec3};
use crate::Result;

/// One live connection to the remote world.
///
/// Primitives are fire-and-forget: they enqueue an instruction and return
/// immediately. An `Err` means the instruction was not accepted (queue full,
/// session gone); callers treat that as best-effort and log it.
pub trait GameSession: Send + Sync {
    /// Identity of this handle; unique per connection attempt.
    fn id(&self) -> &str;

    /// Current position, or `None` until the agent has spawned.
    fn position(&self) -> Option<Vec3>;

    /// Current game mode as last reported by the world.
    fn game_mode(&self) -> GameMode;

    /// Configure the movement planner.
    ///
    /// # Errors
    ///
    /// Returns an error if the instruction could not be delivered.
    fn set_movements(&self, settings: MovementSettings) -> Result<()>;

    /// Ask the movement planner to walk to `goal`.
    ///
    /// # Errors
    ///
    /// Returns an error if the instruction could not be delivered.
    fn set_goal(&self, goal: BlockPos) -> Result<()>;

    /// Press (`true`) or release (`false`) a movement control.
    ///
    /// # Errors
    ///
    /// Returns an error if the instruction could not be delivered.
    fn set_control_state(&self, control: Control, state: bool) -> Result<()>;

    /// Turn the agent's head. Angles are radians.
    ///
    /// # Errors
    ///
    /// Returns an error if the instruction could not be delivered.
    fn look(&self, yaw: f64, pitch: f64, force: bool) -> Result<()>;

    /// Send a chat message to the world.
    ///
    /// # Errors
    ///
    /// Returns an error if the instruction could not be delivered.
    fn chat(&self, message: &str) -> Result<()>;
}

/// A freshly created session handle and its lifecycle signal stream.
///
/// The stream ends with [`SessionEvent::Ended`]; a closed stream is treated
/// the same way.
pub struct Connection {
    /// Handle shared with the action scheduler.
    pub session: Arc<dyn GameSession>,
    /// Lifecycle signals for this handle only.
    pub events: mpsc::Receiver<SessionEvent>,
}

/// Factory for session handles, called once per connection attempt.
pub trait SessionConnector: Send + Sync {
    /// Begin a new connection attempt.
    ///
    /// Returns as soon as the handle exists (state `Connecting`); spawning
    /// and failure are reported through [`Connection::events`].
    ///
    /// # Errors
    ///
    /// Returns an error if the handle could not be created at all. The
    /// supervisor treats this exactly like an immediate `Ended`.
    fn connect(&self) -> Pin<Box<dyn Future<Output = Result<Connection>> + Send + '_>>;
}
