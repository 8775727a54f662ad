//! Integration tests for the idle action catalog.
//!
//! Key holds are released by detached tasks, so these run on a paused
//! clock and step time across the hold boundaries.

use std::f64::consts::{FRAC_PI_6, TAU};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use idle_warden::models::session::{BlockPos, Control, GameMode};
use idle_warden::orchestrator::actions::{
    fly_up, jump_once, look_around, perform, walk_random, Action, ASCEND_HOLD, ASCEND_MESSAGE,
    CANNOT_ASCEND_MESSAGE, JUMP_HOLD, JUMP_MESSAGE, WALK_RANGE,
};
use idle_warden::session::GameSession;

use super::test_helpers::{Call, RecordingSession, SPAWN_POSITION};

fn session(mode: GameMode) -> (Arc<RecordingSession>, Arc<dyn GameSession>) {
    let recording = Arc::new(RecordingSession::spawned("actions", mode));
    let shared: Arc<dyn GameSession> = recording.clone();
    (recording, shared)
}

#[tokio::test(start_paused = true)]
async fn ascend_outside_creative_only_announces() {
    for mode in [GameMode::Survival, GameMode::Adventure, GameMode::Unknown] {
        let (recording, shared) = session(mode);
        fly_up(&shared, &CancellationToken::new());
        sleep(ASCEND_HOLD * 2).await;

        assert_eq!(
            recording.calls(),
            vec![Call::Chat(CANNOT_ASCEND_MESSAGE.into())],
            "{mode:?} must not touch controls"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn ascend_in_creative_holds_jump_for_three_seconds() {
    let (recording, shared) = session(GameMode::Creative);
    fly_up(&shared, &CancellationToken::new());

    assert_eq!(recording.calls()[0], Call::Chat(ASCEND_MESSAGE.into()));
    assert_eq!(recording.control_calls(), vec![(Control::Jump, true)]);

    sleep(ASCEND_HOLD - Duration::from_millis(1)).await;
    assert_eq!(recording.control_calls(), vec![(Control::Jump, true)]);

    sleep(Duration::from_millis(2)).await;
    assert_eq!(
        recording.control_calls(),
        vec![(Control::Jump, true), (Control::Jump, false)]
    );

    let timed = recording.timed_calls();
    let pressed = timed
        .iter()
        .find(|(_, c)| *c == Call::Control(Control::Jump, true))
        .map(|(at, _)| *at)
        .expect("press recorded");
    let released = timed
        .iter()
        .find(|(_, c)| *c == Call::Control(Control::Jump, false))
        .map(|(at, _)| *at)
        .expect("release recorded");
    let held = released.duration_since(pressed);
    assert!(
        held >= ASCEND_HOLD && held < ASCEND_HOLD + Duration::from_millis(5),
        "held for {held:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn jump_releases_after_half_a_second_in_any_mode() {
    for mode in [GameMode::Survival, GameMode::Creative] {
        let (recording, shared) = session(mode);
        jump_once(&shared, &CancellationToken::new());

        assert_eq!(recording.calls()[0], Call::Chat(JUMP_MESSAGE.into()));
        assert_eq!(recording.control_calls(), vec![(Control::Jump, true)]);

        sleep(JUMP_HOLD + Duration::from_millis(1)).await;
        assert_eq!(
            recording.control_calls(),
            vec![(Control::Jump, true), (Control::Jump, false)]
        );
    }
}

#[tokio::test(start_paused = true)]
async fn cancelled_token_skips_the_release() {
    let (recording, shared) = session(GameMode::Creative);
    let cancel = CancellationToken::new();
    fly_up(&shared, &cancel);

    sleep(Duration::from_secs(1)).await;
    cancel.cancel();
    sleep(ASCEND_HOLD).await;

    assert_eq!(recording.control_calls(), vec![(Control::Jump, true)]);
}

#[tokio::test(start_paused = true)]
async fn cancel_on_the_release_instant_skips_the_release() {
    let (recording, shared) = session(GameMode::Survival);
    let cancel = CancellationToken::new();
    jump_once(&shared, &cancel);

    sleep(JUMP_HOLD - Duration::from_millis(1)).await;
    tokio::time::advance(Duration::from_millis(1)).await;
    cancel.cancel();
    sleep(JUMP_HOLD).await;

    assert_eq!(recording.control_calls(), vec![(Control::Jump, true)]);
}

#[tokio::test(start_paused = true)]
async fn walk_targets_stay_within_range() {
    let (recording, _) = session(GameMode::Survival);
    let mut rng = StdRng::seed_from_u64(404);

    for _ in 0..500 {
        walk_random(recording.as_ref(), &mut rng);
    }

    let min_x = (SPAWN_POSITION.x - f64::from(WALK_RANGE)).floor() as i32;
    let max_x = (SPAWN_POSITION.x + f64::from(WALK_RANGE)).floor() as i32;
    let min_z = (SPAWN_POSITION.z - f64::from(WALK_RANGE)).floor() as i32;
    let max_z = (SPAWN_POSITION.z + f64::from(WALK_RANGE)).floor() as i32;

    let goals: Vec<BlockPos> = recording
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Goal(goal) => Some(goal),
            _ => None,
        })
        .collect();
    assert_eq!(goals.len(), 500);

    for goal in &goals {
        assert!((min_x..=max_x).contains(&goal.x), "x {} out of range", goal.x);
        assert!((min_z..=max_z).contains(&goal.z), "z {} out of range", goal.z);
        assert_eq!(goal.y, SPAWN_POSITION.y.floor() as i32, "walks stay level");
    }
    // Both ends of the range are reachable.
    assert!(goals.iter().any(|g| g.x == min_x));
    assert!(goals.iter().any(|g| g.x == max_x));
}

#[tokio::test(start_paused = true)]
async fn walk_announces_its_target() {
    let (recording, _) = session(GameMode::Survival);
    walk_random(recording.as_ref(), &mut StdRng::seed_from_u64(1));

    let calls = recording.calls();
    let Call::Chat(message) = &calls[0] else {
        panic!("expected chat first, got {calls:?}");
    };
    assert!(message.starts_with("Walking to "), "{message}");
    assert!(matches!(calls[1], Call::Goal(_)));
}

#[tokio::test(start_paused = true)]
async fn walk_without_position_does_nothing() {
    let recording = RecordingSession::new("nowhere");
    walk_random(&recording, &mut StdRng::seed_from_u64(1));
    assert!(recording.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn look_angles_stay_in_bounds() {
    let (recording, _) = session(GameMode::Survival);
    let mut rng = StdRng::seed_from_u64(90);

    for _ in 0..500 {
        look_around(recording.as_ref(), &mut rng);
    }

    for call in recording.calls() {
        let Call::Look { yaw, pitch, force } = call else {
            panic!("look issues only look calls, got {call:?}");
        };
        assert!((0.0..TAU).contains(&yaw), "yaw {yaw}");
        assert!((-FRAC_PI_6..=FRAC_PI_6).contains(&pitch), "pitch {pitch}");
        assert!(force);
    }
}

#[tokio::test(start_paused = true)]
async fn chat_failure_does_not_abort_actions() {
    let recording = Arc::new(
        RecordingSession::spawned("muted", GameMode::Creative).rejecting_chat(),
    );
    let shared: Arc<dyn GameSession> = recording.clone();
    let cancel = CancellationToken::new();
    let mut rng = StdRng::seed_from_u64(2);

    perform(Action::Locomotion, &shared, &mut rng, &cancel);
    perform(Action::Jump, &shared, &mut rng, &cancel);
    perform(Action::Ascend, &shared, &mut rng, &cancel);
    perform(Action::Look, &shared, &mut rng, &cancel);

    let calls = recording.calls();
    assert!(matches!(calls[0], Call::Goal(_)));
    assert_eq!(calls[1], Call::Control(Control::Jump, true));
    assert_eq!(calls[2], Call::Control(Control::Jump, true));
    assert!(matches!(calls[3], Call::Look { .. }));
    assert!(!calls.iter().any(|c| matches!(c, Call::Chat(_))));
}
