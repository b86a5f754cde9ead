//! The fixed roster of the coking-drum battery.
//!
//! Two rows of four units. The top row holds reactors with no modeled
//! cycle; the bottom row holds coke drums, each with its own cycle start.
//! The four drums form two mirrored pairs whose starts are half a cycle
//! apart, so one drum of each pair is always coking while its partner is
//! being emptied.
//!
//! The roster is plant configuration fixed at build time. Cycle starts are
//! given in plant local time and resolved in [`PLANT_TIME_ZONE`].

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use drumwatch_types::Row;

use crate::clock::half_cycle;

/// The named time zone all plant timestamps are interpreted in.
pub const PLANT_TIME_ZONE: Tz = chrono_tz::Europe::Berlin;

/// Errors that can occur when building a roster.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// A configured local cycle start does not name exactly one instant.
    #[error("cycle start for {unit} is not a single instant in {zone}")]
    AmbiguousStart {
        /// The unit whose start could not be resolved.
        unit: &'static str,
        /// The time zone it was resolved in.
        zone: Tz,
    },

    /// A bottom-row unit has no cycle start.
    #[error("bottom-row unit {unit} has no cycle start")]
    MissingStart {
        /// The offending unit.
        unit: &'static str,
    },
}

/// One unit of the battery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Display identifier, e.g. `DC-101A`.
    pub id: &'static str,
    /// Row the unit is drawn in.
    pub row: Row,
    /// Key of the unit's own maintenance flag.
    pub flag_key: &'static str,
    /// Start of the drum's cycle series. `None` for top-row units.
    pub cycle_start: Option<DateTime<Tz>>,
}

/// One row of units and its row-level maintenance flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSpec {
    /// Which row this is.
    pub row: Row,
    /// Title drawn above the row, e.g. `21-20`.
    pub title: &'static str,
    /// Key of the row-level maintenance flag.
    pub flag_key: &'static str,
    /// Units in left-to-right order.
    pub units: Vec<Unit>,
}

/// The complete battery: rows of units plus the plant time zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    time_zone: Tz,
    rows: Vec<RowSpec>,
}

impl Roster {
    /// The battery as installed: reactors R-1..R-4 over drums DC-101A..D.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::AmbiguousStart`] if a configured local start
    /// falls into a daylight-saving gap or overlap.
    pub fn coking_battery() -> Result<Self, RosterError> {
        let tz = PLANT_TIME_ZONE;
        let start_a = local_start(tz, "DC-101A", (2025, 8, 7, 20, 0))?;
        let start_c = local_start(tz, "DC-101C", (2025, 8, 7, 12, 0))?;
        let start_b = start_a + half_cycle();
        let start_d = start_c + half_cycle();

        let top = RowSpec {
            row: Row::Top,
            title: "21-10",
            flag_key: "maintenance_21_10",
            units: vec![
                reactor("R-1", "maintenance_R1"),
                reactor("R-2", "maintenance_R2"),
                reactor("R-3", "maintenance_R3"),
                reactor("R-4", "maintenance_R4"),
            ],
        };
        let bottom = RowSpec {
            row: Row::Bottom,
            title: "21-20",
            flag_key: "maintenance_21_20",
            units: vec![
                drum("DC-101A", "maintenance_DC101A", start_a),
                drum("DC-101B", "maintenance_DC101B", start_b),
                drum("DC-101C", "maintenance_DC101C", start_c),
                drum("DC-101D", "maintenance_DC101D", start_d),
            ],
        };
        Self::from_rows(tz, vec![top, bottom])
    }

    /// Build a roster from explicit rows (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::MissingStart`] if a bottom-row unit has no
    /// cycle start.
    pub fn from_rows(time_zone: Tz, rows: Vec<RowSpec>) -> Result<Self, RosterError> {
        for group in &rows {
            for unit in &group.units {
                if unit.row == Row::Bottom && unit.cycle_start.is_none() {
                    return Err(RosterError::MissingStart { unit: unit.id });
                }
            }
        }
        Ok(Self { time_zone, rows })
    }

    /// The plant time zone.
    pub const fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// All rows, top first.
    pub fn rows(&self) -> &[RowSpec] {
        &self.rows
    }

    /// The given row and its units, if present.
    pub fn row(&self, row: Row) -> Option<&RowSpec> {
        self.rows.iter().find(|group| group.row == row)
    }

    /// Find a unit by id.
    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units().find(|unit| unit.id == id)
    }

    /// Every unit, row by row.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.rows.iter().flat_map(|group| group.units.iter())
    }

    /// The widest row, which sets the number of layout columns.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|group| group.units.len()).max().unwrap_or(0)
    }
}

fn reactor(id: &'static str, flag_key: &'static str) -> Unit {
    Unit {
        id,
        row: Row::Top,
        flag_key,
        cycle_start: None,
    }
}

fn drum(id: &'static str, flag_key: &'static str, start: DateTime<Tz>) -> Unit {
    Unit {
        id,
        row: Row::Bottom,
        flag_key,
        cycle_start: Some(start),
    }
}

/// Resolve a plant-local `(year, month, day, hour, minute)` start.
fn local_start(
    tz: Tz,
    unit: &'static str,
    (year, month, day, hour, minute): (i32, u32, u32, u32, u32),
) -> Result<DateTime<Tz>, RosterError> {
    tz.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .ok_or(RosterError::AmbiguousStart { unit, zone: tz })
}
