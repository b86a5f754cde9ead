//! Phase clock, maintenance overlay, roster and configuration for the
//! Drumwatch coking-drum battery display.
//!
//! Everything here is pure with respect to time: the current instant and the
//! maintenance flags are always passed in, never read from the environment,
//! so every derivation can be reproduced from its inputs.
//!
//! # Modules
//!
//! - [`clock`] -- Maps a drum's cycle start and the current time to the
//!   active [`CyclePhase`] and its progress.
//! - [`maintenance`] -- Row/unit maintenance overrides and the flag table.
//! - [`roster`] -- The fixed roster of units, rows and cycle starts.
//! - [`config`] -- Configuration loading from `drumwatch-config.yaml`.
//!
//! [`CyclePhase`]: drumwatch_types::CyclePhase

pub mod clock;
pub mod config;
pub mod maintenance;
pub mod roster;
