//! RGBA raster surface and the fill primitives the renderer is built from.
//!
//! Pixels are stored row-major as straight (non-premultiplied) RGBA bytes.
//! A new raster is fully transparent, and every primitive composites with
//! source-over blending, so untouched pixels keep alpha 0.
//!
//! All primitives clip to the surface; drawing partly or wholly outside it
//! is not an error.

use std::io::Cursor;
use std::ops::Range;

use image::{ExtendedColorType, ImageError, ImageFormat};

/// An RGBA color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (0 = transparent).
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// A grey level with the given alpha.
    pub const fn grey(level: u8, a: u8) -> Self {
        Self::new(level, level, level, a)
    }
}

/// An integer pixel rectangle. Width or height of zero or less is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}

impl Rect {
    /// Build a rectangle from its top-left corner and size.
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Whether the rectangle covers no pixels.
    pub const fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// One past the right edge.
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    /// One past the bottom edge.
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    /// Horizontal center.
    pub const fn center_x(&self) -> i32 {
        self.x.saturating_add(self.w / 2)
    }

    /// Whether the pixel at `(px, py)` lies inside.
    pub const fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

/// A coverage mask, one value in `[0, 1]` per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: u32,
    height: u32,
    coverage: Vec<f32>,
}

impl Mask {
    /// An empty (all zero) mask of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let len = dim_usize(width).saturating_mul(dim_usize(height));
        Self {
            width,
            height,
            coverage: vec![0.0; len],
        }
    }

    /// Mask width in pixels.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Coverage at `(x, y)`, zero outside the mask.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.cell(x, y)
            .and_then(|idx| self.coverage.get(idx).copied())
            .unwrap_or(0.0)
    }

    /// Raise the coverage at `(x, y)` to at least `value`.
    pub fn accumulate(&mut self, x: u32, y: u32, value: f32) {
        let Some(idx) = self.cell(x, y) else {
            return;
        };
        if let Some(cell) = self.coverage.get_mut(idx) {
            *cell = cell.max(value.clamp(0.0, 1.0));
        }
    }

    /// Whether no pixel has any coverage.
    pub fn is_blank(&self) -> bool {
        self.coverage.iter().all(|c| *c <= 0.0)
    }

    fn cell(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        dim_usize(y)
            .checked_mul(dim_usize(self.width))?
            .checked_add(dim_usize(x))
    }
}

/// A width x height RGBA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// A fully transparent raster.
    ///
    /// A size whose byte count cannot be allocated yields an empty 0x0
    /// raster.
    pub fn new(width: u32, height: u32) -> Self {
        let len = dim_usize(width)
            .checked_mul(dim_usize(height))
            .and_then(|n| n.checked_mul(4));
        let mut pixels = Vec::new();
        match len {
            Some(len) if pixels.try_reserve_exact(len).is_ok() => {
                pixels.resize(len, 0);
                Self {
                    width,
                    height,
                    pixels,
                }
            }
            _ => Self {
                width: 0,
                height: 0,
                pixels,
            },
        }
    }

    /// Width in pixels.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// The whole surface as a rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, clamp_dim(self.width), clamp_dim(self.height))
    }

    /// The pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        let px = self.pixels.get(self.span(x, y)?)?;
        match *px {
            [r, g, b, a] => Some(Rgba::new(r, g, b, a)),
            _ => None,
        }
    }

    /// Whether every pixel has alpha 0.
    pub fn is_fully_transparent(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px.get(3) == Some(&0))
    }

    /// Count the pixels inside `area` matching `pred`.
    pub fn count_in(&self, area: Rect, pred: impl Fn(Rgba) -> bool) -> usize {
        (area.y..area.bottom())
            .flat_map(|y| (area.x..area.right()).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y).is_some_and(&pred))
            .count()
    }

    /// Composite `color` onto the pixel at `(x, y)` scaled by `coverage`.
    pub fn blend(&mut self, x: i32, y: i32, color: Rgba, coverage: f32) {
        let Some(span) = self.span(x, y) else {
            return;
        };
        let Some(dst) = self.pixels.get_mut(span) else {
            return;
        };
        let sa = f32::from(color.a) / 255.0 * coverage.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let [dr, dg, db, da] = match *dst {
            [r, g, b, a] => [r, g, b, a].map(f32::from),
            _ => return,
        };
        let da = da / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let mix = |src: u8, dst: f32| {
            channel((f32::from(src) * sa + dst * da * (1.0 - sa)) / out_a)
        };
        dst.copy_from_slice(&[
            mix(color.r, dr),
            mix(color.g, dg),
            mix(color.b, db),
            channel(out_a * 255.0),
        ]);
    }

    /// Fill a rectangle.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let Some(clip) = self.clip(rect) else {
            return;
        };
        for y in clip.y..clip.bottom() {
            for x in clip.x..clip.right() {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    /// A one-pixel-wide vertical line from `y0` (inclusive) to `y1` (exclusive).
    pub fn vline(&mut self, x: i32, y0: i32, y1: i32, color: Rgba) {
        self.fill_rect(Rect::new(x, y0, 1, y1.saturating_sub(y0)), color);
    }

    /// A one-pixel-high horizontal line from `x0` (inclusive) to `x1` (exclusive).
    pub fn hline(&mut self, x0: i32, x1: i32, y: i32, color: Rgba) {
        self.fill_rect(Rect::new(x0, y, x1.saturating_sub(x0), 1), color);
    }

    /// Fill the ellipse inscribed in `rect`, with a one-pixel soft edge.
    pub fn fill_ellipse(&mut self, rect: Rect, color: Rgba) {
        if rect.is_empty() {
            return;
        }
        let rx = to_f32(rect.w) / 2.0;
        let ry = to_f32(rect.h) / 2.0;
        let cx = to_f32(rect.x) + rx;
        let cy = to_f32(rect.y) + ry;
        let edge = rx.min(ry);
        let Some(clip) = self.clip(rect) else {
            return;
        };
        for y in clip.y..clip.bottom() {
            for x in clip.x..clip.right() {
                let nx = (to_f32(x) + 0.5 - cx) / rx;
                let ny = (to_f32(y) + 0.5 - cy) / ry;
                let dist = ((nx * nx + ny * ny).sqrt() - 1.0) * edge;
                let coverage = (0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    /// Fill a triangle given its three corners.
    pub fn fill_triangle(&mut self, a: (i32, i32), b: (i32, i32), c: (i32, i32), color: Rgba) {
        let min_x = a.0.min(b.0).min(c.0);
        let max_x = a.0.max(b.0).max(c.0);
        let min_y = a.1.min(b.1).min(c.1);
        let max_y = a.1.max(b.1).max(c.1);
        let hull = Rect::new(
            min_x,
            min_y,
            max_x.saturating_sub(min_x).saturating_add(1),
            max_y.saturating_sub(min_y).saturating_add(1),
        );
        let Some(clip) = self.clip(hull) else {
            return;
        };
        let to_f = |p: (i32, i32)| (to_f32(p.0), to_f32(p.1));
        let (a, b, c) = (to_f(a), to_f(b), to_f(c));
        let area = edge(a, b, c);
        if area.abs() < f32::EPSILON {
            return;
        }
        for y in clip.y..clip.bottom() {
            for x in clip.x..clip.right() {
                let p = (to_f32(x) + 0.5, to_f32(y) + 0.5);
                let w0 = edge(b, c, p) / area;
                let w1 = edge(c, a, p) / area;
                let w2 = edge(a, b, p) / area;
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.blend(x, y, color, 1.0);
                }
            }
        }
    }

    /// Paint `color` through `mask` with its top-left corner at `(x, y)`.
    pub fn draw_mask(&mut self, mask: &Mask, x: i32, y: i32, color: Rgba) {
        for my in 0..mask.height() {
            for mx in 0..mask.width() {
                let coverage = mask.get(mx, my);
                if coverage > 0.0 {
                    let px = x.saturating_add(clamp_dim(mx));
                    let py = y.saturating_add(clamp_dim(my));
                    self.blend(px, py, color, coverage);
                }
            }
        }
    }

    /// Encode the raster as a PNG image with an alpha channel.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError`] if the encoder rejects the image, e.g. a
    /// zero-sized raster.
    pub fn encode_png(&self) -> Result<Vec<u8>, ImageError> {
        let mut out = Cursor::new(Vec::new());
        image::write_buffer_with_format(
            &mut out,
            &self.pixels,
            self.width,
            self.height,
            ExtendedColorType::Rgba8,
            ImageFormat::Png,
        )?;
        Ok(out.into_inner())
    }

    /// Byte range of the pixel at `(x, y)`, or `None` outside the surface.
    fn span(&self, x: i32, y: i32) -> Option<Range<usize>> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = dim_usize(y)
            .checked_mul(dim_usize(self.width))?
            .checked_add(dim_usize(x))?
            .checked_mul(4)?;
        Some(start..start.checked_add(4)?)
    }

    fn clip(&self, rect: Rect) -> Option<Rect> {
        if rect.is_empty() {
            return None;
        }
        let bounds = self.bounds();
        let x0 = rect.x.max(bounds.x);
        let y0 = rect.y.max(bounds.y);
        let x1 = rect.right().min(bounds.right());
        let y1 = rect.bottom().min(bounds.bottom());
        let clipped = Rect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0));
        (!clipped.is_empty()).then_some(clipped)
    }
}

/// Convert a surface dimension to signed geometry.
pub fn clamp_dim(dim: u32) -> i32 {
    i32::try_from(dim).unwrap_or(i32::MAX)
}

/// A surface dimension as an index-sized count.
pub(crate) fn dim_usize(dim: u32) -> usize {
    usize::try_from(dim).unwrap_or(usize::MAX)
}

/// A pixel coordinate as a float. Exact for any coordinate a raster can hold.
#[allow(clippy::cast_precision_loss)]
pub(crate) const fn to_f32(value: i32) -> f32 {
    value as f32
}

/// A surface dimension as a float.
#[allow(clippy::cast_precision_loss)]
pub(crate) const fn dim_f32(dim: u32) -> f32 {
    dim as f32
}

/// Narrow a progress fraction for shading math.
#[allow(clippy::cast_possible_truncation)]
pub(crate) const fn narrow(value: f64) -> f32 {
    value as f32
}

/// A float length in whole pixels, truncated toward zero and saturated to
/// the `i32` range.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn trunc_px(value: f32) -> i32 {
    value as i32
}

/// A float length rounded to whole pixels.
pub(crate) fn round_px(value: f32) -> i32 {
    trunc_px(value.round())
}

/// Round and clamp a float channel value to a byte.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Twice the signed area of triangle `(a, b, p)`.
fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_raster_is_transparent() {
        let raster = Raster::new(10, 5);
        assert_eq!(raster.as_bytes().len(), 200);
        assert!(raster.is_fully_transparent());
    }

    #[test]
    fn opaque_fill_replaces_pixel() {
        let mut raster = Raster::new(4, 4);
        raster.fill_rect(Rect::new(1, 1, 2, 2), Rgba::rgb(10, 20, 30));
        assert_eq!(raster.pixel(1, 1), Some(Rgba::rgb(10, 20, 30)));
        assert_eq!(raster.pixel(0, 0), Some(Rgba::TRANSPARENT));
        assert_eq!(raster.pixel(3, 3), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn translucent_fill_on_transparent_keeps_color() {
        let mut raster = Raster::new(1, 1);
        raster.fill_rect(Rect::new(0, 0, 1, 1), Rgba::new(200, 0, 0, 128));
        let px = raster.pixel(0, 0).unwrap();
        assert_eq!(px.r, 200);
        assert_eq!(px.a, 128);
    }

    #[test]
    fn source_over_accumulates_alpha() {
        let mut raster = Raster::new(1, 1);
        raster.fill_rect(Rect::new(0, 0, 1, 1), Rgba::new(0, 0, 255, 128));
        raster.fill_rect(Rect::new(0, 0, 1, 1), Rgba::new(255, 0, 0, 128));
        let px = raster.pixel(0, 0).unwrap();
        assert!(px.a > 128);
        assert!(px.r > px.b);
    }

    #[test]
    fn drawing_outside_is_clipped() {
        let mut raster = Raster::new(4, 4);
        raster.fill_rect(Rect::new(-10, -10, 5, 5), Rgba::BLACK);
        raster.fill_ellipse(Rect::new(10, 10, 4, 4), Rgba::BLACK);
        raster.fill_triangle((-5, -5), (-1, -5), (-3, -1), Rgba::BLACK);
        assert!(raster.is_fully_transparent());
        assert_eq!(raster.pixel(-1, 0), None);
        assert_eq!(raster.pixel(4, 0), None);
    }

    #[test]
    fn ellipse_covers_center_not_corners() {
        let mut raster = Raster::new(20, 10);
        raster.fill_ellipse(Rect::new(0, 0, 20, 10), Rgba::BLACK);
        assert_eq!(raster.pixel(10, 5).map(|p| p.a), Some(255));
        assert_eq!(raster.pixel(0, 0).map(|p| p.a), Some(0));
        assert_eq!(raster.pixel(19, 9).map(|p| p.a), Some(0));
    }

    #[test]
    fn triangle_fills_inside() {
        let mut raster = Raster::new(10, 10);
        raster.fill_triangle((0, 0), (9, 0), (4, 9), Rgba::BLACK);
        assert_eq!(raster.pixel(4, 2).map(|p| p.a), Some(255));
        assert_eq!(raster.pixel(0, 9).map(|p| p.a), Some(0));
    }

    #[test]
    fn mask_paints_coverage() {
        let mut mask = Mask::new(2, 1);
        mask.accumulate(1, 0, 1.0);
        assert!(!mask.is_blank());
        let mut raster = Raster::new(3, 3);
        raster.draw_mask(&mask, 1, 1, Rgba::WHITE);
        assert_eq!(raster.pixel(1, 1), Some(Rgba::TRANSPARENT));
        assert_eq!(raster.pixel(2, 1), Some(Rgba::WHITE));
    }

    #[test]
    fn count_in_counts_matching_pixels() {
        let mut raster = Raster::new(5, 5);
        raster.fill_rect(Rect::new(0, 0, 2, 5), Rgba::BLACK);
        assert_eq!(raster.count_in(raster.bounds(), |p| p.a > 0), 10);
    }

    #[test]
    fn png_round_trips_straight_alpha() {
        let mut raster = Raster::new(3, 2);
        raster.fill_rect(Rect::new(0, 0, 1, 1), Rgba::WHITE);
        raster.fill_rect(Rect::new(2, 1, 1, 1), Rgba::new(200, 10, 10, 128));
        let png = raster.encode_png().unwrap();
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.as_raw().as_slice(), raster.as_bytes());
    }

    #[test]
    fn unallocatable_size_yields_empty_raster() {
        for (w, h) in [(0x8000_0000, 0x4000_0000), (u32::MAX, u32::MAX)] {
            let raster = Raster::new(w, h);
            assert_eq!((raster.width(), raster.height()), (0, 0), "{w}x{h}");
            assert!(raster.as_bytes().is_empty());
            assert_eq!(raster.pixel(0, 0), None);
        }
    }

    #[test]
    fn conversions_saturate() {
        assert_eq!(channel(300.0), 255);
        assert_eq!(channel(-4.0), 0);
        assert_eq!(trunc_px(2.9), 2);
        assert_eq!(trunc_px(-2.9), -2);
        assert_eq!(round_px(2.5), 3);
        assert_eq!(trunc_px(f32::MAX), i32::MAX);
        assert_eq!(clamp_dim(u32::MAX), i32::MAX);
    }

    #[test]
    fn rect_helpers() {
        let rect = Rect::new(10, 20, 30, 40);
        assert_eq!(rect.right(), 40);
        assert_eq!(rect.bottom(), 60);
        assert_eq!(rect.center_x(), 25);
        assert!(rect.contains(10, 20));
        assert!(!rect.contains(40, 20));
        assert!(Rect::new(0, 0, 0, 5).is_empty());
    }
}
