//! Shared type definitions for the Drumwatch coking-drum battery display.
//!
//! This crate holds the vocabulary every other crate speaks: the cycle
//! phases a drum passes through, the row a unit sits in, and the per-unit
//! state a render is built from. It has no behavior beyond small lookup
//! helpers on the enums.
//!
//! # Modules
//!
//! - [`enums`] -- [`CyclePhase`] and [`Row`]
//! - [`structs`] -- [`PhaseState`] and [`UnitState`]

pub mod enums;
pub mod structs;

pub use enums::{CyclePhase, Row};
pub use structs::{PhaseState, UnitState};
