//! Value types computed fresh on every render.

use serde::{Deserialize, Serialize};

use crate::enums::CyclePhase;

/// Where a bottom-row drum is in its cycle at one instant.
///
/// Never stored: it is recomputed from the drum's cycle start and the
/// current time on every render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    /// The active phase.
    pub phase: CyclePhase,
    /// Fraction of the phase's nominal duration already elapsed, in `[0, 1)`.
    pub progress: f64,
}

impl PhaseState {
    /// Build a state for `phase` with the given progress.
    pub const fn new(phase: CyclePhase, progress: f64) -> Self {
        Self { phase, progress }
    }
}

/// What a single unit should look like in the current render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UnitState {
    /// Under maintenance: drawn as an empty shell.
    Offline,
    /// A top-row unit in service, shown with the light warming decoration.
    Idle,
    /// A bottom-row drum in service at the given point of its cycle.
    Active(PhaseState),
}

impl UnitState {
    /// Whether the unit is drawn as an empty shell.
    pub const fn is_offline(&self) -> bool {
        matches!(self, Self::Offline)
    }

    /// The cycle state, if the unit has one.
    pub const fn phase_state(&self) -> Option<PhaseState> {
        match self {
            Self::Active(state) => Some(*state),
            Self::Offline | Self::Idle => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn phase_state_only_for_active_units() {
        let active = UnitState::Active(PhaseState::new(CyclePhase::Water, 0.5));
        assert_eq!(
            active.phase_state().map(|s| s.phase),
            Some(CyclePhase::Water)
        );
        assert!(UnitState::Idle.phase_state().is_none());
        assert!(UnitState::Offline.phase_state().is_none());
        assert!(UnitState::Offline.is_offline());
        assert!(!active.is_offline());
    }

    #[test]
    fn unit_state_serializes_with_variant_names() {
        let yaml = serde_yml::to_string(&UnitState::Active(PhaseState::new(
            CyclePhase::Drilling,
            0.25,
        )))
        .unwrap();
        assert!(yaml.contains("Drilling"));
        let back: UnitState = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(back.phase_state().map(|s| s.phase), Some(CyclePhase::Drilling));
    }
}
