//! Procedural vessel renderer and scene composer for the Drumwatch
//! coking-drum battery display.
//!
//! Rendering is a discrete snapshot: [`compose_scene`] takes the current
//! instant, the maintenance flags and a canvas size, and returns an RGBA
//! image plus a whole-image tap target. Nothing is cached between calls.
//!
//! # Modules
//!
//! - [`raster`] -- RGBA surface, fill primitives and PNG encoding.
//! - [`font`] -- Built-in bitmap face and optional TTF outline face.
//! - [`jitter`] -- Injectable randomness for decorative drilling debris.
//! - [`vessel`] -- Draws a single vessel for a given state.
//! - [`scene`] -- Decides unit states and composes the full image.

pub mod font;
pub mod jitter;
pub mod raster;
pub mod scene;
pub mod vessel;

pub use font::{FontError, Typeface};
pub use jitter::{Jitter, SeededJitter, WallClockJitter};
pub use raster::{Raster, Rect, Rgba};
pub use scene::{
    MIN_DRAWABLE_PX, RefreshRequest, RenderContext, RenderedScene, TapTarget, UnitPlan,
    compose_scene, plan_scene,
};
pub use vessel::{VesselPainter, VesselState, VesselStyle};
