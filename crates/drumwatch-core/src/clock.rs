//! Phase clock for bottom-row coke drums.
//!
//! A drum's state is a pure function of two instants: when its current
//! cycle series started and what time it is now. The clock never stores
//! anything; callers recompute the state on every render.
//!
//! # Algorithm
//!
//! 1. Measure elapsed time in whole minutes (truncated toward zero). The
//!    value may be negative when `now` precedes the cycle start.
//! 2. Normalize into `[0, cycle length)` with a Euclidean remainder.
//! 3. Walk the phases in order, subtracting each duration until the
//!    remainder is strictly less than the next duration.
//!
//! A remainder exactly equal to a phase boundary therefore belongs to the
//! *next* phase with progress 0. Working in integer minutes keeps every
//! boundary exact, so the mirrored-drum invariant holds bit for bit.

use chrono::{DateTime, TimeDelta, TimeZone};
use drumwatch_types::{CyclePhase, PhaseState};

/// Seconds in one minute.
const SECONDS_PER_MINUTE: i64 = 60;

/// Length of one full cycle in minutes (23 hours).
pub const CYCLE_MINUTES: i64 = cycle_minutes();

/// Offset between the two drums of a mirrored pair (11 h 30 min).
pub const HALF_CYCLE_MINUTES: i64 = CYCLE_MINUTES / 2;

const fn cycle_minutes() -> i64 {
    let mut total: i64 = 0;
    let mut i = 0;
    while i < CyclePhase::ALL.len() {
        #[allow(clippy::indexing_slicing)]
        let phase = CyclePhase::ALL[i];
        // Widening u32 -> i64; `i64::from` is not const.
        #[allow(clippy::cast_lossless)]
        let minutes = phase.duration_minutes() as i64;
        total = total.saturating_add(minutes);
        i = i.saturating_add(1);
    }
    total
}

/// Length of one full cycle in hours.
pub const fn cycle_length_hours() -> u32 {
    let mut total: u32 = 0;
    let mut i = 0;
    while i < CyclePhase::ALL.len() {
        #[allow(clippy::indexing_slicing)]
        let phase = CyclePhase::ALL[i];
        total = total.saturating_add(phase.duration_hours());
        i = i.saturating_add(1);
    }
    total
}

/// The offset between mirrored drums as a [`TimeDelta`].
pub fn half_cycle() -> TimeDelta {
    TimeDelta::minutes(HALF_CYCLE_MINUTES)
}

/// Compute the phase and progress of a drum whose cycle started at
/// `cycle_start`, evaluated at `now`.
///
/// Total for every pair of representable instants. Both arguments carry the
/// plant's named time zone; only the instants matter, so results do not
/// depend on where the computation runs or on daylight-saving shifts.
pub fn phase_at<Tz: TimeZone>(cycle_start: &DateTime<Tz>, now: &DateTime<Tz>) -> PhaseState {
    let position = cycle_position(cycle_start, now);
    let mut remainder = position;
    for phase in CyclePhase::ALL {
        let duration = i64::from(phase.duration_minutes());
        if remainder < duration {
            return PhaseState::new(phase, fraction(remainder, duration));
        }
        remainder = remainder.saturating_sub(duration);
    }
    // `position < CYCLE_MINUTES`, so the walk above always returns.
    PhaseState::new(CyclePhase::Coking, 0.0)
}

/// Minutes remaining until the drum enters its next phase.
///
/// Always in `1..=duration` of the active phase.
pub fn minutes_until_next_phase<Tz: TimeZone>(
    cycle_start: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> i64 {
    let mut remainder = cycle_position(cycle_start, now);
    for phase in CyclePhase::ALL {
        let duration = i64::from(phase.duration_minutes());
        if remainder < duration {
            return duration.saturating_sub(remainder);
        }
        remainder = remainder.saturating_sub(duration);
    }
    i64::from(CyclePhase::Coking.duration_minutes())
}

/// Minutes into the current cycle, in `[0, CYCLE_MINUTES)`.
fn cycle_position<Tz: TimeZone>(cycle_start: &DateTime<Tz>, now: &DateTime<Tz>) -> i64 {
    let elapsed_seconds = now.timestamp().saturating_sub(cycle_start.timestamp());
    let elapsed_minutes = elapsed_seconds.checked_div(SECONDS_PER_MINUTE).unwrap_or(0);
    elapsed_minutes.rem_euclid(CYCLE_MINUTES)
}

/// `part / whole` for small non-negative minute counts.
fn fraction(part: i64, whole: i64) -> f64 {
    let part = u32::try_from(part).map_or(0.0, f64::from);
    let whole = u32::try_from(whole).map_or(1.0, f64::from);
    part / whole
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Berlin;
    use chrono_tz::Tz;

    fn start() -> DateTime<Tz> {
        Berlin.with_ymd_and_hms(2025, 8, 7, 20, 0, 0).single().unwrap()
    }

    fn hours(h: i64) -> TimeDelta {
        TimeDelta::hours(h)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn cycle_is_twenty_three_hours() {
        assert_eq!(cycle_length_hours(), 23);
        assert_eq!(CYCLE_MINUTES, 23 * 60);
        assert_eq!(HALF_CYCLE_MINUTES, 690);
        assert_eq!(half_cycle(), TimeDelta::minutes(11 * 60 + 30));
    }

    #[test]
    fn cycle_start_is_coking_at_zero() {
        let s = start();
        let state = phase_at(&s, &s);
        assert_eq!(state.phase, CyclePhase::Coking);
        assert_eq!(state.progress, 0.0);
    }

    #[test]
    fn exact_boundary_rolls_forward() {
        let s = start();
        let state = phase_at(&s, &(s + hours(18)));
        assert_eq!(state.phase, CyclePhase::Water);
        assert_eq!(state.progress, 0.0);

        let state = phase_at(&s, &(s + hours(19)));
        assert_eq!(state.phase, CyclePhase::Drilling);
        assert_eq!(state.progress, 0.0);

        let state = phase_at(&s, &(s + hours(21)));
        assert_eq!(state.phase, CyclePhase::Heating);
        assert_eq!(state.progress, 0.0);

        let state = phase_at(&s, &(s + hours(23)));
        assert_eq!(state.phase, CyclePhase::Coking);
        assert_eq!(state.progress, 0.0);
    }

    #[test]
    fn wraps_after_a_full_cycle() {
        let s = start();
        let state = phase_at(&s, &(s + hours(25)));
        assert_eq!(state.phase, CyclePhase::Coking);
        assert_close(state.progress, 2.0 / 18.0);
    }

    #[test]
    fn negative_elapsed_normalizes() {
        let s = start();
        let before = phase_at(&s, &(s - hours(1)));
        let after = phase_at(&s, &(s + hours(22)));
        assert_eq!(before, after);
        assert_eq!(before.phase, CyclePhase::Heating);
        assert_close(before.progress, 0.5);
    }

    #[test]
    fn progress_stays_in_unit_interval() {
        let s = start();
        // Every 7 minutes across three cycles in both directions.
        for step in -600_i64..600 {
            let now = s + TimeDelta::minutes(step * 7);
            let state = phase_at(&s, &now);
            assert!(
                (0.0..1.0).contains(&state.progress),
                "progress {} out of range at step {step}",
                state.progress
            );
        }
    }

    #[test]
    fn last_minute_of_a_phase_is_below_one() {
        let s = start();
        let state = phase_at(&s, &(s + hours(18) - TimeDelta::minutes(1)));
        assert_eq!(state.phase, CyclePhase::Coking);
        assert!(state.progress < 1.0);
        assert_close(state.progress, 1079.0 / 1080.0);
    }

    #[test]
    fn mirrored_drums_move_in_lock_step() {
        let a = start();
        let b = a + half_cycle();
        for step in 0_i64..300 {
            let t = a + TimeDelta::minutes(step * 13);
            assert_eq!(phase_at(&a, &t), phase_at(&b, &(t + half_cycle())));
        }
    }

    #[test]
    fn sub_minute_offsets_truncate() {
        let s = start();
        let state = phase_at(&s, &(s + TimeDelta::seconds(59)));
        assert_eq!(state.progress, 0.0);
        let state = phase_at(&s, &(s - TimeDelta::seconds(59)));
        assert_eq!(state.phase, CyclePhase::Coking);
        assert_eq!(state.progress, 0.0);
    }

    #[test]
    fn daylight_saving_change_does_not_shift_phases() {
        // Berlin leaves summer time on 2025-10-26; elapsed time is measured
        // between instants, so exactly 23 real hours later is a cycle start.
        let s = Berlin.with_ymd_and_hms(2025, 10, 25, 20, 0, 0).single().unwrap();
        let state = phase_at(&s, &(s + hours(23)));
        assert_eq!(state.phase, CyclePhase::Coking);
        assert_eq!(state.progress, 0.0);
    }

    #[test]
    fn minutes_until_next_phase_counts_down() {
        let s = start();
        assert_eq!(minutes_until_next_phase(&s, &s), 18 * 60);
        assert_eq!(minutes_until_next_phase(&s, &(s + hours(18))), 60);
        assert_eq!(
            minutes_until_next_phase(&s, &(s + hours(22) + TimeDelta::minutes(59))),
            1
        );
    }
}
