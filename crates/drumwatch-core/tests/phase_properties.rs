//! Property-style checks of the phase clock and maintenance overlay,
//! exercised through the public API against the installed battery.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use drumwatch_core::clock::{cycle_length_hours, half_cycle, minutes_until_next_phase, phase_at};
use drumwatch_core::maintenance::{MaintenanceFlags, is_offline};
use drumwatch_core::roster::{PLANT_TIME_ZONE, Roster};
use drumwatch_types::{CyclePhase, PhaseState};

fn start() -> DateTime<Tz> {
    PLANT_TIME_ZONE
        .with_ymd_and_hms(2025, 8, 7, 20, 0, 0)
        .unwrap()
}

fn assert_state(actual: PhaseState, phase: CyclePhase, progress: f64) {
    assert_eq!(actual.phase, phase);
    assert!(
        (actual.progress - progress).abs() < 1e-9,
        "progress {} != {progress}",
        actual.progress
    );
}

#[test]
fn progress_stays_in_unit_interval_over_several_cycles() {
    let s = start();
    // Every 7 minutes across three cycles, both sides of the start.
    for step in -600_i64..600 {
        let state = phase_at(&s, &(s + TimeDelta::minutes(step * 7)));
        assert!(
            (0.0..1.0).contains(&state.progress),
            "step {step}: {}",
            state.progress
        );
    }
}

#[test]
fn durations_sum_to_twenty_three_hours() {
    let total: u32 = CyclePhase::ALL.iter().map(|p| p.duration_hours()).sum();
    assert_eq!(total, 23);
    assert_eq!(cycle_length_hours(), 23);
    assert_eq!(half_cycle(), TimeDelta::minutes(690));
}

#[test]
fn boundaries_belong_to_the_next_phase() {
    let s = start();
    assert_state(phase_at(&s, &s), CyclePhase::Coking, 0.0);
    assert_state(phase_at(&s, &(s + TimeDelta::hours(18))), CyclePhase::Water, 0.0);
    assert_state(phase_at(&s, &(s + TimeDelta::hours(19))), CyclePhase::Drilling, 0.0);
    assert_state(phase_at(&s, &(s + TimeDelta::hours(21))), CyclePhase::Heating, 0.0);
    assert_state(phase_at(&s, &(s + TimeDelta::hours(23))), CyclePhase::Coking, 0.0);
}

#[test]
fn second_cycle_wraps_into_coking() {
    let s = start();
    assert_state(
        phase_at(&s, &(s + TimeDelta::hours(25))),
        CyclePhase::Coking,
        2.0 / 18.0,
    );
}

#[test]
fn time_before_the_start_wraps_backwards() {
    let s = start();
    assert_eq!(
        phase_at(&s, &(s - TimeDelta::hours(1))),
        phase_at(&s, &(s + TimeDelta::hours(22)))
    );
    assert_state(phase_at(&s, &(s - TimeDelta::hours(1))), CyclePhase::Heating, 0.5);
}

#[test]
fn mirrored_drums_run_in_lock_step() {
    let roster = Roster::coking_battery().unwrap();
    for (lead, lag) in [("DC-101A", "DC-101B"), ("DC-101C", "DC-101D")] {
        let a = roster.unit(lead).unwrap().cycle_start.unwrap();
        let b = roster.unit(lag).unwrap().cycle_start.unwrap();
        assert_eq!(b - a, half_cycle());
        for step in 0..(23 * 4) {
            let t = a + TimeDelta::minutes(step * 15 + 3);
            assert_eq!(phase_at(&b, &(t + half_cycle())), phase_at(&a, &t), "{lead} at {t}");
        }
    }
}

#[test]
fn countdown_reaches_zero_only_at_boundaries() {
    let s = start();
    assert_eq!(minutes_until_next_phase(&s, &s), 18 * 60);
    assert_eq!(minutes_until_next_phase(&s, &(s + TimeDelta::minutes(18 * 60 - 1))), 1);
    assert_eq!(minutes_until_next_phase(&s, &(s + TimeDelta::hours(18))), 60);
}

#[test]
fn overlay_truth_table() {
    assert!(is_offline(true, Some(false)));
    assert!(is_offline(true, None));
    assert!(is_offline(false, Some(true)));
    assert!(!is_offline(false, Some(false)));
    assert!(!is_offline(false, None));

    let flags = MaintenanceFlags::parse("maintenance_21_10: true\nmaintenance_DC101C: true\n")
        .unwrap();
    assert!(flags.unit_offline("maintenance_21_10", "maintenance_R2"));
    assert!(flags.unit_offline("maintenance_21_20", "maintenance_DC101C"));
    assert!(!flags.unit_offline("maintenance_21_20", "maintenance_DC101D"));
    assert!(!flags.unit_offline("maintenance_unknown_row", "maintenance_unknown"));
}
