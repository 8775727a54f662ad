//! Process-wide context handed to every long-running component.

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::BotConfig;
use crate::liveness::LivenessState;

/// Explicitly owned process state: configuration and the boot instant.
#[derive(Debug, Clone)]
pub struct AgentContext {
    /// Validated configuration.
    pub config: Arc<BotConfig>,
    /// When the process started; uptime is measured from here.
    pub started_at: Instant,
}

impl AgentContext {
    /// Build a context starting now.
    #[must_use]
    pub fn new(config: BotConfig) -> Self {
        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Liveness handler state derived from this context.
    #[must_use]
    pub fn liveness_state(&self) -> LivenessState {
        LivenessState::new(self.started_at, self.config.ping_format)
    }

    /// Random source for the action loop of connection attempt `attempt`.
    ///
    /// With `BOT_SEED` set every attempt gets a distinct but reproducible
    /// stream; otherwise the OS seeds it.
    #[must_use]
    pub fn action_rng(&self, attempt: u64) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(attempt)),
            None => StdRng::from_os_rng(),
        }
    }
}
