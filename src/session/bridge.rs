//! Session handle backed by a bridge child process.
//!
//! The bridge owns the world protocol, login and path planning. It is
//! launched once per connection attempt with:
//! - `kill_on_drop(true)` so a dropped handle never leaves a stray process.
//! - `env_clear()` plus a small allowlist, then the connection settings as
//!   `MC_*` variables and the handle identity as `BOT_SESSION_ID`.
//! - stdin/stdout piped for NDJSON; stderr inherited so bridge logs land next
//!   to ours.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BotConfig;
use crate::models::session::{BlockPos, Control, GameMode, MovementSettings, Vec3};
use crate::session::reader::{run_reader, WorldView};
use crate::session::writer::{run_writer, BridgeCommand};
use crate::session::{Connection, GameSession, SessionConnector};
use crate::{AppError, Result};

/// Environment variables inherited by the bridge process.
pub const ALLOWED_ENV_VARS: &[&str] = &[
    "PATH",
    "HOME",
    "RUST_LOG",
    "NODE_PATH",
    "NODE_OPTIONS",
    // Windows-specific variables.
    "USERPROFILE",
    "SystemRoot",
    "TEMP",
    "TMP",
    "APPDATA",
    "LOCALAPPDATA",
    "COMSPEC",
];

/// Outbound command queue depth per session.
const COMMAND_QUEUE: usize = 64;

/// Lifecycle event queue depth per session.
const EVENT_QUEUE: usize = 32;

/// Settings for launching the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Program followed by its arguments.
    pub command: Vec<String>,
    /// Game server host.
    pub host: String,
    /// Game server port.
    pub port: u16,
    /// Agent identity.
    pub username: String,
    /// Optional credential; omitted from the bridge environment when `None`.
    pub password: Option<String>,
}

impl From<&BotConfig> for BridgeConfig {
    fn from(config: &BotConfig) -> Self {
        Self {
            command: config.bridge_command.clone(),
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

/// [`SessionConnector`] that launches one bridge process per attempt.
#[derive(Debug, Clone)]
pub struct BridgeConnector {
    config: BridgeConfig,
}

impl BridgeConnector {
    /// Create a connector for the given launch settings.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Launch the bridge and wire up its reader and writer tasks.
    ///
    /// # Errors
    ///
    /// - `AppError::Bridge("bridge command is empty")`
    /// - `AppError::Bridge("failed to spawn bridge: …")` on OS spawn failure.
    pub fn spawn(&self) -> Result<Connection> {
        let session_id = Uuid::new_v4().to_string();
        let (program, args) = self
            .config
            .command
            .split_first()
            .ok_or_else(|| AppError::Bridge("bridge command is empty".into()))?;

        let mut cmd = Command::new(program);
        cmd.args(args);

        cmd.env_clear();
        for &key in ALLOWED_ENV_VARS {
            if let Ok(val) = std::env::var(key) {
                cmd.env(key, val);
            }
        }
        cmd.env("MC_HOST", &self.config.host)
            .env("MC_PORT", self.config.port.to_string())
            .env("MC_USERNAME", &self.config.username)
            .env("BOT_SESSION_ID", &session_id);
        if let Some(password) = &self.config.password {
            cmd.env("MC_PASSWORD", password);
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|err| AppError::Bridge(format!("failed to spawn bridge `{program}`: {err}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Bridge("failed to capture bridge stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Bridge("failed to capture bridge stdout".into()))?;

        let view = Arc::new(WorldView::default());
        let cancel = CancellationToken::new();
        let (event_tx, events) = mpsc::channel(EVENT_QUEUE);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);

        tokio::spawn(run_reader(
            session_id.clone(),
            stdout,
            Arc::clone(&view),
            event_tx,
            cancel.clone(),
        ));

        let writer_id = session_id.clone();
        let writer_cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = run_writer(writer_id.clone(), stdin, cmd_rx, writer_cancel).await {
                debug!(session_id = %writer_id, %err, "bridge writer stopped");
            }
        });

        info!(
            session_id,
            host = %self.config.host,
            port = self.config.port,
            username = %self.config.username,
            offline = self.config.password.is_none(),
            "bridge session connecting"
        );

        let session = BridgeSession {
            id: session_id,
            view,
            cmd_tx,
            cancel,
            child: Mutex::new(Some(child)),
        };

        Ok(Connection {
            session: Arc::new(session),
            events,
        })
    }
}

impl SessionConnector for BridgeConnector {
    fn connect(&self) -> Pin<Box<dyn Future<Output = Result<Connection>> + Send + '_>> {
        Box::pin(async move { self.spawn() })
    }
}

/// Live handle to one bridge process.
///
/// Dropping the handle stops the reader/writer tasks and kills the process.
pub struct BridgeSession {
    id: String,
    view: Arc<WorldView>,
    cmd_tx: mpsc::Sender<BridgeCommand>,
    cancel: CancellationToken,
    child: Mutex<Option<Child>>,
}

impl BridgeSession {
    fn send(&self, command: BridgeCommand) -> Result<()> {
        self.cmd_tx.try_send(command).map_err(|err| match err {
            TrySendError::Full(_) => AppError::Bridge("command queue full".into()),
            TrySendError::Closed(_) => AppError::Session("session ended".into()),
        })
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        let child = self
            .child
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut child) = child {
            if let Err(err) = child.start_kill() {
                warn!(session_id = %self.id, %err, "failed to kill bridge process");
            }
        }
    }
}

impl GameSession for BridgeSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> Option<Vec3> {
        self.view.position()
    }

    fn game_mode(&self) -> GameMode {
        self.view.game_mode()
    }

    fn set_movements(&self, settings: MovementSettings) -> Result<()> {
        self.send(BridgeCommand::SetMovements {
            can_dig: settings.can_dig,
        })
    }

    fn set_goal(&self, goal: BlockPos) -> Result<()> {
        self.send(goal.into())
    }

    fn set_control_state(&self, control: Control, state: bool) -> Result<()> {
        self.send(BridgeCommand::Control { control, state })
    }

    fn look(&self, yaw: f64, pitch: f64, force: bool) -> Result<()> {
        self.send(BridgeCommand::Look { yaw, pitch, force })
    }

    fn chat(&self, message: &str) -> Result<()> {
        self.send(BridgeCommand::Chat {
            message: message.to_owned(),
        })
    }
}
