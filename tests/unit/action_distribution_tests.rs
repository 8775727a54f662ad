//! Unit tests for action selection and tick jitter.
//!
//! Uses seeded `StdRng` so every run draws the same sequence.

use std::collections::HashMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use idle_warden::orchestrator::action_scheduler::{next_interval, MAX_TICK_MS, MIN_TICK_MS};
use idle_warden::orchestrator::actions::Action;

const DRAWS: usize = 10_000;

#[test]
#[allow(clippy::cast_precision_loss)]
fn every_action_is_picked_about_a_quarter_of_the_time() {
    let mut rng = StdRng::seed_from_u64(0xB07);
    let mut counts: HashMap<Action, usize> = HashMap::new();

    for _ in 0..DRAWS {
        *counts.entry(Action::pick(&mut rng)).or_default() += 1;
    }

    assert_eq!(counts.len(), Action::ALL.len(), "all actions reachable");
    for action in Action::ALL {
        let share = counts[&action] as f64 / DRAWS as f64;
        assert!(
            (0.22..=0.28).contains(&share),
            "{action} picked {share:.3} of the time"
        );
    }
}

#[test]
fn intervals_stay_inside_jitter_window() {
    let mut rng = StdRng::seed_from_u64(7);
    let min = Duration::from_millis(MIN_TICK_MS);
    let max = Duration::from_millis(MAX_TICK_MS);

    let mut lowest = max;
    let mut highest = min;
    for _ in 0..DRAWS {
        let period = next_interval(&mut rng);
        assert!(period >= min && period < max, "{period:?} out of range");
        lowest = lowest.min(period);
        highest = highest.max(period);
    }

    // The whole window is used, not just a slice of it.
    assert!(lowest < Duration::from_millis(8_100));
    assert!(highest > Duration::from_millis(11_900));
}

#[test]
fn same_seed_same_choices() {
    let mut a = StdRng::seed_from_u64(99);
    let mut b = StdRng::seed_from_u64(99);

    let left: Vec<(Action, Duration)> = (0..50)
        .map(|_| (Action::pick(&mut a), next_interval(&mut a)))
        .collect();
    let right: Vec<(Action, Duration)> = (0..50)
        .map(|_| (Action::pick(&mut b), next_interval(&mut b)))
        .collect();

    assert_eq!(left, right);
}

#[test]
fn action_names_are_stable() {
    let names: Vec<&str> = Action::ALL.iter().map(|a| a.as_str()).collect();
    assert_eq!(names, ["locomotion", "jump", "ascend", "look"]);
    assert_eq!(Action::Ascend.to_string(), "ascend");
}
