//! Enumeration types for the coking-drum battery.

use serde::{Deserialize, Serialize};

/// Minutes in one hour, used to express phase durations exactly.
const MINUTES_PER_HOUR: u32 = 60;

// ---------------------------------------------------------------------------
// Cycle phases
// ---------------------------------------------------------------------------

/// One discrete stage of a bottom-row drum's repeating cycle.
///
/// The order of the variants is the order of the cycle; after
/// [`CyclePhase::Heating`] the drum starts coking again. Durations are fixed
/// plant constants and always sum to 23 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CyclePhase {
    /// Feed is coking inside the drum; solid coke accumulates.
    Coking,
    /// Quench water is filling the drum.
    Water,
    /// The coke bed is cut out with a drill from the top.
    Drilling,
    /// The empty drum is warmed up before the next fill.
    Heating,
}

impl CyclePhase {
    /// Every phase in cycle order.
    pub const ALL: [Self; 4] = [Self::Coking, Self::Water, Self::Drilling, Self::Heating];

    /// Nominal duration of the phase in whole hours.
    pub const fn duration_hours(self) -> u32 {
        match self {
            Self::Coking => 18,
            Self::Water => 1,
            Self::Drilling | Self::Heating => 2,
        }
    }

    /// Nominal duration of the phase in minutes.
    pub const fn duration_minutes(self) -> u32 {
        self.duration_hours().saturating_mul(MINUTES_PER_HOUR)
    }

    /// The phase that follows this one, wrapping from `Heating` to `Coking`.
    pub const fn next(self) -> Self {
        match self {
            Self::Coking => Self::Water,
            Self::Water => Self::Drilling,
            Self::Drilling => Self::Heating,
            Self::Heating => Self::Coking,
        }
    }

    /// Operator-facing name in the plant's working language.
    ///
    /// Presentation only; nothing branches on this string.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Coking => "Коксование",
            Self::Water => "Вода",
            Self::Drilling => "Бурение",
            Self::Heating => "Прогрев",
        }
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// The row of the battery a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Row {
    /// Reactor row drawn on top. Units here have no modeled cycle.
    Top,
    /// Coke-drum row drawn at the bottom, each drum on its own cycle.
    Bottom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_sum_to_cycle_length() {
        let hours: u32 = CyclePhase::ALL.iter().map(|p| p.duration_hours()).sum();
        assert_eq!(hours, 23);
        let minutes: u32 = CyclePhase::ALL.iter().map(|p| p.duration_minutes()).sum();
        assert_eq!(minutes, 23 * 60);
    }

    #[test]
    fn next_walks_the_cycle_in_order() {
        let mut phase = CyclePhase::Coking;
        for expected in [
            CyclePhase::Water,
            CyclePhase::Drilling,
            CyclePhase::Heating,
            CyclePhase::Coking,
        ] {
            phase = phase.next();
            assert_eq!(phase, expected);
        }
    }

    #[test]
    fn all_matches_declaration_order() {
        let mut sorted = CyclePhase::ALL;
        sorted.sort();
        assert_eq!(sorted, CyclePhase::ALL);
    }

    #[test]
    fn display_names_are_distinct() {
        let names: std::collections::BTreeSet<_> =
            CyclePhase::ALL.iter().map(|p| p.display_name()).collect();
        assert_eq!(names.len(), 4);
    }
}
