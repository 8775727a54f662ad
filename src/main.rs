#![forbid(unsafe_code)]

//! `idle-warden`: idle agent supervisor binary.
//!
//! Loads configuration from the environment, starts the liveness responder,
//! the keep-alive heartbeat and the connection supervisor, then runs until
//! SIGINT/SIGTERM.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::{fmt, EnvFilter};

use idle_warden::config::LogFormat;
use idle_warden::orchestrator::heartbeat::spawn_heartbeat;
use idle_warden::orchestrator::supervisor::Supervisor;
use idle_warden::session::bridge::{BridgeConfig, BridgeConnector};
use idle_warden::{guard, liveness, AgentContext, AppError, BotConfig, Result};

fn main() -> Result<()> {
    let config = BotConfig::from_env()?;
    init_tracing(config.log_format)?;
    guard::install_panic_hook();
    info!("idle-warden bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(config))
}

async fn run(config: BotConfig) -> Result<()> {
    let ctx = AgentContext::new(config);
    info!(
        server = %ctx.config.server_addr(),
        username = %ctx.config.username,
        offline = ctx.config.is_offline(),
        http_port = ctx.config.http_port,
        "configuration loaded"
    );

    let ct = CancellationToken::new();

    // ── Liveness responder ──────────────────────────────
    let listener = liveness::bind(ctx.config.http_port).await?;
    let liveness_state = Arc::new(ctx.liveness_state());
    let liveness_ct = ct.clone();
    let liveness_handle = tokio::spawn(
        async move {
            if let Err(err) = liveness::serve(listener, liveness_state, liveness_ct).await {
                error!(%err, "liveness responder failed");
            }
        }
        .instrument(info_span!("liveness")),
    );

    // ── Keep-alive heartbeat ────────────────────────────
    let heartbeat_handle = spawn_heartbeat(ct.clone());

    // ── Connection supervisor ───────────────────────────
    let connector = Arc::new(BridgeConnector::new(BridgeConfig::from(&*ctx.config)));
    let supervisor_handle = Supervisor::new(ctx, connector).spawn(ct.clone());

    // ── Wait for shutdown signal ────────────────────────
    let signal = shutdown_signal().await;
    info!(signal, "shutdown requested");
    ct.cancel();

    let (liveness, heartbeat, supervisor) =
        tokio::join!(liveness_handle, heartbeat_handle, supervisor_handle);
    for (task, joined) in [
        ("liveness", liveness),
        ("heartbeat", heartbeat),
        ("supervisor", supervisor),
    ] {
        if let Err(err) = joined {
            error!(task, panicked = err.is_panic(), %err, "task failed during shutdown");
        }
    }
    info!("idle-warden shut down");

    Ok(())
}

/// Wait for SIGINT or SIGTERM and return the name of the one received.
#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(%err, "SIGTERM handler unavailable, waiting for SIGINT only");
            return wait_for_ctrl_c().await;
        }
    };
    tokio::select! {
        name = wait_for_ctrl_c() => name,
        _ = sigterm.recv() => "SIGTERM",
    }
}

/// Wait for SIGINT.
#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> &'static str {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // Without a working handler the process can only be killed.
        error!(%err, "SIGINT handler failed");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

/// Install the global subscriber. `RUST_LOG` wins over the `info` default.
fn init_tracing(log_format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(false);

    let installed = match log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
    installed.map_err(|err| AppError::Config(format!("tracing subscriber already set: {err}")))
}
