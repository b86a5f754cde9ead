//! Procedural drawing of a single vessel.
//!
//! A vessel is a metallic cylinder with elliptical caps, a slide gate above
//! and below, an internal fill that encodes the active phase, a name label
//! above and, for drums in service, a time label across the body.
//!
//! # Phase visuals
//!
//! | State    | Fill                                                   | Top gate | Bottom gate |
//! |----------|--------------------------------------------------------|----------|-------------|
//! | Offline  | none                                                   | closed   | closed      |
//! | Idle     | heating fill at a fixed 10 %                           | closed   | closed      |
//! | Coking   | near-black block rising with progress                  | closed   | closed      |
//! | Water    | red-to-dark backdrop plus rising blue water            | open     | closed      |
//! | Drilling | shrinking coke block, shaft and bit, falling debris    | closed   | open        |
//! | Heating  | red fill rising with progress, hotter toward the top   | closed   | closed      |
//!
//! Geometry is designed for a 1000x600 canvas and scaled by
//! [`VesselStyle::for_canvas`].

use drumwatch_types::{CyclePhase, PhaseState, UnitState};
use tracing::trace;

use crate::font::{Typeface, draw_outlined};
use crate::jitter::Jitter;
use crate::raster::{Raster, Rect, Rgba, channel, clamp_dim, dim_f32, narrow, round_px, to_f32};

/// Progress at which the idle warming decoration is drawn.
pub const IDLE_PROGRESS: f64 = 0.1;

/// Width of the canvas the base geometry is designed for.
const DESIGN_WIDTH: f32 = 1000.0;
/// Height of the canvas the base geometry is designed for.
const DESIGN_HEIGHT: f32 = 600.0;

/// Number of debris marks under a drum being drilled.
const DEBRIS_COUNT: u64 = 7;
/// Milliseconds per step of the debris fall animation.
const DEBRIS_MS_PER_STEP: u64 = 60;
/// Fall distance, in design pixels, before a mark wraps to the top.
const DEBRIS_FALL_RANGE: u64 = 50;

const GATE_COLOR: Rgba = Rgba::rgb(80, 80, 80);
const SHAFT_COLOR: Rgba = Rgba::rgb(170, 170, 170);
const BIT_COLOR: Rgba = Rgba::rgb(120, 120, 120);
const COKE_COLOR: Rgba = Rgba::new(0, 0, 0, 230);
const REMAINING_COKE_COLOR: Rgba = Rgba::new(20, 20, 20, 220);
const SHELL_ALPHA: u8 = 220;

/// What a vessel should show.
///
/// `Steaming` is never produced by the scene composer: no cycle phase maps
/// to it. It is kept so the steam-out visual stays available to callers
/// that ask for it explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VesselState {
    /// Under maintenance: empty shell, gates closed, no time label.
    Offline,
    /// Top-row unit in service: light warming decoration.
    Idle,
    /// Drum in service at the given point of its cycle.
    Active(PhaseState),
    /// Steam-out: red gradient over the full body with the top gate open.
    /// The visual is static, so it carries no progress.
    Steaming,
}

impl From<UnitState> for VesselState {
    fn from(state: UnitState) -> Self {
        match state {
            UnitState::Offline => Self::Offline,
            UnitState::Idle => Self::Idle,
            UnitState::Active(phase) => Self::Active(phase),
        }
    }
}

impl VesselState {
    /// Whether the top slide gate is drawn open.
    pub const fn top_gate_open(&self) -> bool {
        match self {
            Self::Active(state) => matches!(state.phase, CyclePhase::Water),
            Self::Steaming => true,
            Self::Offline | Self::Idle => false,
        }
    }

    /// Whether the bottom slide gate is drawn open.
    pub const fn bottom_gate_open(&self) -> bool {
        match self {
            Self::Active(state) => matches!(state.phase, CyclePhase::Drilling),
            Self::Offline | Self::Idle | Self::Steaming => false,
        }
    }
}

/// Pixel geometry of a vessel, scaled from the 1000x600 design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VesselStyle {
    scale: f32,
}

impl Default for VesselStyle {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl VesselStyle {
    /// Style scaled so the design geometry fits a `width` x `height` canvas.
    pub fn for_canvas(width: u32, height: u32) -> Self {
        let sx = dim_f32(width) / DESIGN_WIDTH;
        let sy = dim_f32(height) / DESIGN_HEIGHT;
        Self {
            scale: sx.min(sy).max(0.1),
        }
    }

    /// The scale factor relative to the design canvas.
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// A design length in pixels, at least one.
    pub fn px(&self, design: f32) -> i32 {
        round_px((design * self.scale).max(1.0))
    }

    /// A design font size in pixels.
    pub fn font(&self, design: f32) -> f32 {
        (design * self.scale).max(1.0)
    }

    fn cap_half(&self) -> i32 {
        self.px(8.0)
    }

    fn gate(&self, open: bool) -> i32 {
        if open { self.px(2.0) } else { self.px(10.0) }
    }
}

/// Draws vessels with one typeface and style.
#[derive(Debug, Clone, Copy)]
pub struct VesselPainter<'a> {
    face: &'a Typeface,
    style: VesselStyle,
}

impl<'a> VesselPainter<'a> {
    /// Create a painter.
    pub const fn new(face: &'a Typeface, style: VesselStyle) -> Self {
        Self { face, style }
    }

    /// The painter's style.
    pub const fn style(&self) -> VesselStyle {
        self.style
    }

    /// Draw one vessel whose body occupies `bounds`.
    ///
    /// Caps, gates, the name label and drilling debris extend a little
    /// outside `bounds`. An empty `bounds` draws nothing. The time label is
    /// only drawn for states other than `Offline`.
    pub fn render(
        &self,
        raster: &mut Raster,
        bounds: Rect,
        label: &str,
        state: VesselState,
        time_label: &str,
        jitter: &mut dyn Jitter,
    ) {
        if bounds.is_empty() {
            return;
        }
        trace!(label, ?state, "drawing vessel");

        self.draw_shell(raster, bounds);
        match state {
            VesselState::Offline => {}
            VesselState::Idle => fill_heating(raster, bounds, IDLE_PROGRESS),
            VesselState::Active(phase) => {
                let progress = phase.progress.clamp(0.0, 1.0);
                match phase.phase {
                    CyclePhase::Coking => fill_coking(raster, bounds, progress),
                    CyclePhase::Water => fill_water(raster, bounds, progress),
                    CyclePhase::Drilling => self.fill_drilling(raster, bounds, progress, jitter),
                    CyclePhase::Heating => fill_heating(raster, bounds, progress),
                }
            }
            VesselState::Steaming => fill_steam(raster, bounds),
        }
        self.draw_gates(raster, bounds, state);

        if !matches!(state, VesselState::Offline) && !time_label.is_empty() {
            self.draw_time_label(raster, bounds, time_label);
        }
        self.draw_name_label(raster, bounds, label);
    }

    fn draw_shell(&self, raster: &mut Raster, b: Rect) {
        let width = to_f32(b.w);
        let half = (width / 2.0).max(0.5);
        for i in 0..b.w {
            let k = ((to_f32(i) - width / 2.0) / half).abs();
            let shade = channel(190.0 + 45.0 * k);
            raster.vline(b.x.saturating_add(i), b.y, b.bottom(), Rgba::grey(shade, SHELL_ALPHA));
        }
        let cap = self.style.cap_half();
        let cap_h = cap.saturating_mul(2);
        raster.fill_ellipse(
            Rect::new(b.x, b.y.saturating_sub(cap), b.w, cap_h),
            Rgba::grey(210, SHELL_ALPHA),
        );
        raster.fill_ellipse(
            Rect::new(b.x, b.bottom().saturating_sub(cap), b.w, cap_h),
            Rgba::grey(185, SHELL_ALPHA),
        );
    }

    fn draw_gates(&self, raster: &mut Raster, b: Rect, state: VesselState) {
        let cap = self.style.cap_half();
        let top = self.style.gate(state.top_gate_open());
        raster.fill_rect(Rect::new(b.x, b.y.saturating_sub(cap), b.w, top), GATE_COLOR);
        let bottom = self.style.gate(state.bottom_gate_open());
        raster.fill_rect(
            Rect::new(b.x, b.bottom().saturating_add(cap), b.w, bottom),
            GATE_COLOR,
        );
    }

    fn fill_drilling(&self, raster: &mut Raster, b: Rect, progress: f64, jitter: &mut dyn Jitter) {
        let coke = rows(1.0 - progress, b.h);
        raster.fill_rect(
            Rect::new(b.x, b.bottom().saturating_sub(coke), b.w, coke),
            REMAINING_COKE_COLOR,
        );

        let shaft_w = self.style.px(10.0);
        let drill_len = rows(progress, b.h);
        let dx = b.center_x().saturating_sub(shaft_w / 2);
        raster.fill_rect(Rect::new(dx, b.y, shaft_w, drill_len), SHAFT_COLOR);
        let tip = b.y.saturating_add(drill_len);
        let shoulder = tip.saturating_sub(self.style.px(5.0));
        raster.fill_triangle(
            (dx, shoulder),
            (dx.saturating_add(shaft_w), shoulder),
            (
                dx.saturating_add(shaft_w / 2),
                tip.saturating_add(self.style.px(8.0)),
            ),
            BIT_COLOR,
        );

        // Falling coke under the open bottom gate.
        let hole_y = b.bottom().saturating_add(self.style.px(6.0));
        let cutoff = b.bottom().saturating_add(self.style.px(44.0));
        let spread = self.style.px(16.0);
        let mark = self.style.px(2.0);
        let step = jitter.millis().checked_div(DEBRIS_MS_PER_STEP).unwrap_or(0);
        for i in 0..DEBRIS_COUNT {
            let fall = step
                .wrapping_add(i.saturating_mul(7))
                .checked_rem(DEBRIS_FALL_RANGE)
                .unwrap_or(0);
            let fall = u16::try_from(fall).map_or(0.0, f32::from);
            let px = b
                .center_x()
                .saturating_add(jitter.spread(spread.saturating_neg(), spread));
            let py = hole_y.saturating_add(round_px(fall * self.style.scale()));
            if py < cutoff {
                raster.fill_rect(Rect::new(px, py, mark, mark), Rgba::BLACK);
            }
        }
    }

    fn draw_time_label(&self, raster: &mut Raster, b: Rect, text: &str) {
        let mask = self.face.rasterize(text, self.style.font(36.0));
        let tx = b.x.saturating_add(b.w.saturating_sub(clamp_dim(mask.width())) / 2);
        let ty = b.y.saturating_add(b.h.saturating_sub(clamp_dim(mask.height())) / 2);
        draw_outlined(raster, &mask, (tx, ty), Rgba::WHITE, Rgba::BLACK, self.style.px(2.0));
    }

    fn draw_name_label(&self, raster: &mut Raster, b: Rect, text: &str) {
        let mask = self.face.rasterize(text, self.style.font(28.0));
        let baseline = b.y.saturating_sub(self.style.px(12.0));
        let top = baseline.saturating_sub(clamp_dim(mask.height()));
        raster.draw_mask(&mask, b.x, top, Rgba::BLACK);
    }
}

fn fill_coking(raster: &mut Raster, b: Rect, progress: f64) {
    let level = rows(progress, b.h);
    raster.fill_rect(
        Rect::new(b.x, b.bottom().saturating_sub(level), b.w, level),
        COKE_COLOR,
    );
}

fn fill_water(raster: &mut Raster, b: Rect, progress: f64) {
    backdrop(raster, b, 160);
    let level = rows(progress, b.h);
    let h = to_f32(b.h);
    for i in 0..level {
        let blue = channel(255.0 - to_f32(i) / h * 100.0 - narrow(progress) * 80.0);
        raster.hline(b.x, b.right(), row_from_bottom(b, i), Rgba::new(0, 120, blue, 200));
    }
}

fn fill_heating(raster: &mut Raster, b: Rect, progress: f64) {
    let level = rows(progress, b.h);
    let h = to_f32(b.h);
    for i in 0..level {
        let red = channel(150.0 + to_f32(i) / h * 105.0);
        raster.hline(b.x, b.right(), row_from_bottom(b, i), Rgba::new(red, 0, 0, 180));
    }
}

fn fill_steam(raster: &mut Raster, b: Rect) {
    backdrop(raster, b, 180);
}

/// Red fading to dark red from the top of the body to the bottom.
fn backdrop(raster: &mut Raster, b: Rect, alpha: u8) {
    let h = to_f32(b.h);
    for i in 0..b.h {
        let red = channel(255.0 * (1.0 - to_f32(i) / h * 0.5));
        raster.hline(b.x, b.right(), b.y.saturating_add(i), Rgba::new(red, 0, 0, alpha));
    }
}

/// The `i`-th body row counting up from the bottom edge.
const fn row_from_bottom(b: Rect, i: i32) -> i32 {
    b.bottom().saturating_sub(1).saturating_sub(i)
}

/// Whole pixel rows covering `fraction` of `height`.
#[allow(clippy::cast_possible_truncation)]
fn rows(fraction: f64, height: i32) -> i32 {
    (fraction.clamp(0.0, 1.0) * f64::from(height)) as i32
}
