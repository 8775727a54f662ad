//! Session orchestration modules.
//!
//! Covers the reconnecting supervisor, the per-session action loop, the
//! idle action catalog, and the process keep-alive heartbeat.

pub mod action_scheduler;
pub mod actions;
pub mod heartbeat;
pub mod supervisor;
