//! Integration tests for the keep-alive heartbeat task.

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use idle_warden::orchestrator::heartbeat::{spawn_heartbeat, HEARTBEAT_INTERVAL};

#[tokio::test(start_paused = true)]
async fn heartbeat_runs_until_cancelled() {
    let ct = CancellationToken::new();
    let handle = spawn_heartbeat(ct.clone());

    sleep(HEARTBEAT_INTERVAL * 5 + Duration::from_secs(1)).await;
    assert!(!handle.is_finished(), "heartbeat keeps ticking");

    ct.cancel();
    timeout(Duration::from_secs(1), handle)
        .await
        .expect("heartbeat stops promptly")
        .expect("heartbeat task did not panic");
}

#[tokio::test(start_paused = true)]
async fn heartbeat_cancelled_before_first_tick_exits() {
    let ct = CancellationToken::new();
    ct.cancel();

    let handle = spawn_heartbeat(ct);
    timeout(Duration::from_secs(1), handle)
        .await
        .expect("heartbeat stops promptly")
        .expect("heartbeat task did not panic");
}
