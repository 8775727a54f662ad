//! Unit tests for session lifecycle and world model types.

use idle_warden::models::session::{
    BlockPos, Control, GameMode, MovementSettings, SessionState, Vec3,
};

#[test]
fn connecting_may_spawn_or_end() {
    assert!(SessionState::Connecting.can_transition_to(SessionState::Spawned));
    assert!(SessionState::Connecting.can_transition_to(SessionState::Ended));
}

#[test]
fn spawned_may_only_end() {
    assert!(SessionState::Spawned.can_transition_to(SessionState::Ended));
    assert!(!SessionState::Spawned.can_transition_to(SessionState::Spawned));
    assert!(!SessionState::Spawned.can_transition_to(SessionState::Connecting));
}

#[test]
fn ended_is_terminal() {
    for next in [
        SessionState::Connecting,
        SessionState::Spawned,
        SessionState::Ended,
    ] {
        assert!(
            !SessionState::Ended.can_transition_to(next),
            "Ended must not transition to {next:?}"
        );
    }
    assert!(!SessionState::Ended.is_live());
    assert!(SessionState::Connecting.is_live());
    assert!(SessionState::Spawned.is_live());
}

#[test]
fn block_pos_floors_each_axis() {
    let pos = BlockPos::from(Vec3::new(10.9, 64.0, -3.2));
    assert_eq!(pos, BlockPos { x: 10, y: 64, z: -4 });
}

#[test]
fn offset_shifts_every_axis() {
    let moved = Vec3::new(1.0, 2.0, 3.0).offset(-1.5, 0.0, 20.0);
    assert_eq!(moved, Vec3::new(-0.5, 2.0, 23.0));
}

#[test]
fn game_mode_deserializes_known_and_unknown_names() {
    let creative: GameMode = serde_json::from_str("\"creative\"").expect("known mode");
    assert_eq!(creative, GameMode::Creative);

    let hardcore: GameMode = serde_json::from_str("\"hardcore\"").expect("unknown mode");
    assert_eq!(hardcore, GameMode::Unknown);
    assert_eq!(GameMode::default(), GameMode::Unknown);
}

#[test]
fn movement_defaults_forbid_digging() {
    assert!(!MovementSettings::default().can_dig);
}

#[test]
fn control_display_matches_wire_name() {
    for control in [Control::Jump, Control::Sneak, Control::Forward] {
        let wire = serde_json::to_value(control).expect("serialize control");
        assert_eq!(wire, serde_json::Value::String(control.to_string()));
    }
}
