//! Scene composition: the whole battery in one image.
//!
//! The composer owns no state of its own. Each call takes the current
//! instant and the maintenance flags, decides every unit's state with the
//! phase clock and the maintenance overlay, lays the units out on a
//! two-row grid and asks the vessel painter to draw each one.
//!
//! # Layout
//!
//! For `n` columns on a `W` x `H` canvas, each column is `W / (2n + 0.5)`
//! wide (`W / 8.5` for the four-unit battery), vessels are `H / 3.5` tall,
//! and the remaining width is split into `n + 1` equal gaps. The top row
//! sits at `H * 80/600` and the bottom row at `H * 0.55`.

use chrono::DateTime;
use chrono_tz::Tz;
use drumwatch_core::clock::phase_at;
use drumwatch_core::maintenance::MaintenanceFlags;
use drumwatch_core::roster::{Roster, RowSpec};
use drumwatch_types::{Row, UnitState};
use tracing::debug;

use crate::font::Typeface;
use crate::jitter::Jitter;
use crate::raster::{Raster, Rect, Rgba, clamp_dim, dim_f32, round_px, to_f32, trunc_px};
use crate::vessel::{VesselPainter, VesselState, VesselStyle};

/// Canvases this small or smaller are returned fully transparent.
pub const MIN_DRAWABLE_PX: u32 = 32;

/// Top of the upper row as a fraction of canvas height.
const TOP_BAND: f32 = 80.0 / 600.0;
/// Top of the lower row as a fraction of canvas height.
const BOTTOM_BAND: f32 = 0.55;
/// Baseline of the upper row title as a fraction of canvas height.
const TOP_TITLE_BASELINE: f32 = 60.0 / 600.0;
/// Baseline of the lower row title, above the middle of the canvas.
const BOTTOM_TITLE_BASELINE: f32 = 0.5;
/// Horizontal position of row titles as a fraction of canvas width.
const TITLE_X: f32 = 0.1;

/// What activating the tap target asks the host to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshRequest {
    /// Compose the scene again with the current time.
    RenderNow,
}

/// The single interactive region of a rendered scene.
///
/// The composer never acts on a tap; the host wires the target to its
/// refresh trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapTarget {
    /// The region that accepts taps: the whole image.
    pub area: Rect,
    /// The request a tap produces.
    pub action: RefreshRequest,
}

impl TapTarget {
    /// The request produced by a tap at `(x, y)`, if it lands on the target.
    pub const fn activate(&self, x: i32, y: i32) -> Option<RefreshRequest> {
        if self.area.contains(x, y) {
            Some(self.action)
        } else {
            None
        }
    }
}

/// The decided state of one unit, before any drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitPlan {
    /// Unit identifier.
    pub id: &'static str,
    /// Row the unit is drawn in.
    pub row: Row,
    /// Zero-based column within the row.
    pub column: usize,
    /// What the unit shows.
    pub state: UnitState,
    /// `HH:MM` cycle start for drums in service; `None` otherwise.
    pub time_label: Option<String>,
}

/// Everything a render needs besides the instant and the flags.
#[derive(Debug, Clone)]
pub struct RenderContext {
    roster: Roster,
    typeface: Typeface,
}

impl RenderContext {
    /// Bundle a roster and a typeface.
    pub const fn new(roster: Roster, typeface: Typeface) -> Self {
        Self { roster, typeface }
    }

    /// The unit roster.
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The label typeface.
    pub const fn typeface(&self) -> &Typeface {
        &self.typeface
    }
}

/// The output of one composition.
#[derive(Debug, Clone)]
pub struct RenderedScene {
    /// The image, transparent outside drawn shapes.
    pub image: Raster,
    /// The whole-image tap target.
    pub tap: TapTarget,
    /// The per-unit decisions the image was drawn from.
    pub units: Vec<UnitPlan>,
}

/// Pixel positions of the grid for one canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Width of each vessel.
    pub column_width: i32,
    /// Height of each vessel body.
    pub vessel_height: i32,
    /// Horizontal gap before each column and after the last.
    pub gap: i32,
    /// Top edge of the upper row.
    pub top_y: i32,
    /// Top edge of the lower row.
    pub bottom_y: i32,
}

impl Layout {
    /// Compute the grid for a canvas and column count.
    pub fn new(width: u32, height: u32, columns: usize) -> Self {
        let w = dim_f32(width);
        let h = dim_f32(height);
        let n = u16::try_from(columns.max(1)).map_or(f32::from(u16::MAX), f32::from);
        let column_width = trunc_px(w / (2.0 * n + 0.5));
        let vessel_height = trunc_px(h / 3.5);
        let used = n * to_f32(column_width);
        let gap = trunc_px((w - used) / (n + 1.0));
        Self {
            column_width,
            vessel_height,
            gap,
            top_y: round_px(h * TOP_BAND),
            bottom_y: trunc_px(h * BOTTOM_BAND),
        }
    }

    /// Body rectangle of the vessel in `row` at `column`.
    pub fn cell(&self, row: Row, column: usize) -> Rect {
        let column = i32::try_from(column).unwrap_or(i32::MAX);
        let pitch = self.column_width.saturating_add(self.gap);
        let x = self.gap.saturating_add(column.saturating_mul(pitch));
        let y = match row {
            Row::Top => self.top_y,
            Row::Bottom => self.bottom_y,
        };
        Rect::new(x, y, self.column_width, self.vessel_height)
    }
}

/// Decide every unit's state at `now`.
///
/// Top-row units are `Idle` or `Offline` from the maintenance overlay
/// alone. Bottom-row units are `Offline` if overridden, otherwise `Active`
/// at the phase the clock computes from their cycle start.
pub fn plan_scene(now: &DateTime<Tz>, flags: &MaintenanceFlags, roster: &Roster) -> Vec<UnitPlan> {
    let tz = roster.time_zone();
    let now = now.with_timezone(&tz);
    let mut plans = Vec::with_capacity(roster.units().count());
    for group in roster.rows() {
        for (column, unit) in group.units.iter().enumerate() {
            let offline = flags.unit_offline(group.flag_key, unit.flag_key);
            let (state, time_label) = match (offline, unit.cycle_start) {
                (true, _) => (UnitState::Offline, None),
                (false, Some(start)) => {
                    let start = start.with_timezone(&tz);
                    let label = start.format("%H:%M").to_string();
                    (UnitState::Active(phase_at(&start, &now)), Some(label))
                }
                (false, None) => (UnitState::Idle, None),
            };
            plans.push(UnitPlan {
                id: unit.id,
                row: group.row,
                column,
                state,
                time_label,
            });
        }
    }
    plans
}

/// Render the whole battery at `now` into a `width` x `height` image.
///
/// Canvases at or below [`MIN_DRAWABLE_PX`] in either dimension come back
/// fully transparent. The result is independent of any earlier call.
pub fn compose_scene(
    now: &DateTime<Tz>,
    flags: &MaintenanceFlags,
    width: u32,
    height: u32,
    ctx: &RenderContext,
    jitter: &mut dyn Jitter,
) -> RenderedScene {
    let roster = ctx.roster();
    let units = plan_scene(now, flags, roster);
    let mut image = Raster::new(width, height);
    let tap = TapTarget {
        area: image.bounds(),
        action: RefreshRequest::RenderNow,
    };

    if width <= MIN_DRAWABLE_PX || height <= MIN_DRAWABLE_PX {
        debug!(width, height, "canvas below drawable size, returning empty image");
        return RenderedScene { image, tap, units };
    }

    let layout = Layout::new(width, height, roster.column_count());
    let style = VesselStyle::for_canvas(width, height);
    let painter = VesselPainter::new(ctx.typeface(), style);

    for group in roster.rows() {
        draw_title(&mut image, ctx.typeface(), style, group, width, height);
    }

    for plan in &units {
        let bounds = layout.cell(plan.row, plan.column);
        painter.render(
            &mut image,
            bounds,
            plan.id,
            VesselState::from(plan.state),
            plan.time_label.as_deref().unwrap_or(""),
            jitter,
        );
    }

    debug!(
        width,
        height,
        offline = units.iter().filter(|p| p.state.is_offline()).count(),
        "scene composed"
    );
    RenderedScene { image, tap, units }
}

fn draw_title(
    image: &mut Raster,
    face: &Typeface,
    style: VesselStyle,
    group: &RowSpec,
    width: u32,
    height: u32,
) {
    let h = dim_f32(height);
    let baseline = match group.row {
        Row::Top => trunc_px(h * TOP_TITLE_BASELINE),
        Row::Bottom => trunc_px(h * BOTTOM_TITLE_BASELINE).saturating_sub(style.px(20.0)),
    };
    let mask = face.rasterize(group.title, style.font(40.0));
    let x = trunc_px(dim_f32(width) * TITLE_X);
    let top = baseline.saturating_sub(clamp_dim(mask.height()));
    image.draw_mask(&mask, x, top, Rgba::BLACK);
}
