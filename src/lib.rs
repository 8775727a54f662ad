#![forbid(unsafe_code)]

//! `idle-warden` keeps an idle game-world agent connected indefinitely.
//!
//! A [`Supervisor`](orchestrator::supervisor::Supervisor) reconnects the
//! agent forever, an action loop keeps it moving while spawned, and a tiny
//! HTTP [`liveness`] responder keeps hosting platforms from idling the
//! process out.

pub mod config;
pub mod context;
pub mod errors;
pub mod guard;
pub mod liveness;
pub mod models;
pub mod orchestrator;
pub mod session;

pub use config::BotConfig;
pub use context::AgentContext;
pub use errors::{AppError, Result};
