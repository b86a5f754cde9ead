//! Error types for the Drumwatch host binary.
//!
//! [`HostError`] is the top-level error type that wraps every failure mode
//! of host startup and snapshot output.

use std::path::PathBuf;

/// Top-level error for the host binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: drumwatch_core::config::ConfigError,
    },

    /// The configured label font could not be loaded.
    #[error("font error: {source}")]
    Font {
        /// The underlying font error.
        #[from]
        source: drumwatch_render::FontError,
    },

    /// The unit roster could not be built.
    #[error("roster error: {source}")]
    Roster {
        /// The underlying roster error.
        #[from]
        source: drumwatch_core::roster::RosterError,
    },

    /// The rendered image could not be encoded as PNG.
    #[error("failed to encode snapshot: {source}")]
    Encode {
        /// The underlying encoder error.
        #[from]
        source: image::ImageError,
    },

    /// Writing the rendered snapshot failed.
    #[error("failed to write snapshot to {}: {source}", path.display())]
    Output {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
