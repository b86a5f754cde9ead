//! Text rasterization for unit labels, row titles and time labels.
//!
//! Two faces are supported. The built-in face is a 5x7 bitmap covering
//! digits, Latin capitals, the Cyrillic capitals that share their shapes,
//! and the punctuation unit ids use; it needs no files and renders the
//! same everywhere, which keeps snapshot tests stable. A `TrueType` face can
//! be loaded at startup with `rusttype` for nicer output.
//!
//! Both faces produce a [`Mask`] sized to the ink of the string, which the
//! caller positions and paints.

use std::path::{Path, PathBuf};

use rusttype::{Font, Scale, point};
use tracing::info;

use crate::raster::{Mask, Raster, Rgba, clamp_dim, round_px};

/// Rows in a bitmap glyph.
const GLYPH_ROWS: u32 = 7;
/// Columns in a bitmap glyph.
const GLYPH_COLS: u32 = 5;
/// Horizontal advance of a bitmap glyph, in dots.
const GLYPH_ADVANCE: u32 = GLYPH_COLS + 1;
/// Nominal em height of the bitmap face, in dots.
const BITMAP_EM: f32 = 8.0;

/// Errors that can occur when loading a `TrueType` face.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// The font file could not be read.
    #[error("failed to read font file {path}: {source}")]
    Io {
        /// Path of the font file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not a usable `TrueType`/`OpenType` font.
    #[error("failed to parse font file {path}")]
    Parse {
        /// Path of the font file.
        path: PathBuf,
    },
}

/// A face that can turn a string into a coverage mask.
#[derive(Clone, Default)]
pub enum Typeface {
    /// The built-in 5x7 bitmap face.
    #[default]
    Bitmap,
    /// A `TrueType` face loaded with `rusttype`.
    Outline(Font<'static>),
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bitmap => f.write_str("Typeface::Bitmap"),
            Self::Outline(font) => write!(f, "Typeface::Outline({} glyphs)", font.glyph_count()),
        }
    }
}

impl Typeface {
    /// Load a `TrueType` face from disk.
    ///
    /// # Errors
    ///
    /// Returns [`FontError::Io`] if the file cannot be read, or
    /// [`FontError::Parse`] if it is not a font.
    pub fn from_file(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| FontError::Parse {
            path: path.to_path_buf(),
        })?;
        info!(path = %path.display(), glyphs = font.glyph_count(), "TrueType face loaded");
        Ok(Self::Outline(font))
    }

    /// Load the configured face, or the bitmap face when none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`FontError`] if a configured face cannot be loaded.
    pub fn from_config(path: Option<&Path>) -> Result<Self, FontError> {
        path.map_or(Ok(Self::Bitmap), Self::from_file)
    }

    /// Rasterize `text` at roughly `size` pixels per em.
    ///
    /// The mask is cropped to the ink; an empty or all-space string yields
    /// a blank mask.
    pub fn rasterize(&self, text: &str, size: f32) -> Mask {
        match self {
            Self::Bitmap => rasterize_bitmap(text, size),
            Self::Outline(font) => rasterize_outline(font, text, size),
        }
    }
}

/// Paint `mask` with an outline of `outline` color and `radius` pixels,
/// then the fill on top, with the mask's top-left corner at `(x, y)`.
pub fn draw_outlined(
    raster: &mut Raster,
    mask: &Mask,
    (x, y): (i32, i32),
    fill: Rgba,
    outline: Rgba,
    radius: i32,
) {
    let r_sq = radius.saturating_mul(radius);
    for dy in radius.saturating_neg()..=radius {
        for dx in radius.saturating_neg()..=radius {
            let d_sq = dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy));
            if (dx != 0 || dy != 0) && d_sq <= r_sq {
                raster.draw_mask(mask, x.saturating_add(dx), y.saturating_add(dy), outline);
            }
        }
    }
    raster.draw_mask(mask, x, y, fill);
}

fn rasterize_bitmap(text: &str, size: f32) -> Mask {
    let dot = u32::try_from(round_px((size / BITMAP_EM).max(1.0))).unwrap_or(1);
    let glyphs: Vec<[u8; 7]> = text.chars().map(bitmap_glyph).collect();
    let Some(count) = u32::try_from(glyphs.len()).ok().filter(|n| *n > 0) else {
        return Mask::new(0, 0);
    };
    let width = count
        .saturating_mul(GLYPH_ADVANCE)
        .saturating_sub(1)
        .saturating_mul(dot);
    let mut mask = Mask::new(width, GLYPH_ROWS.saturating_mul(dot));
    for (i, rows) in (0_u32..).zip(&glyphs) {
        let origin = i.saturating_mul(GLYPH_ADVANCE).saturating_mul(dot);
        for (row, bits) in (0_u32..).zip(rows) {
            let top = row.saturating_mul(dot);
            for col in 0..GLYPH_COLS {
                if bits & 0x10_u8.checked_shr(col).unwrap_or(0) == 0 {
                    continue;
                }
                let left = origin.saturating_add(col.saturating_mul(dot));
                for sy in 0..dot {
                    for sx in 0..dot {
                        mask.accumulate(left.saturating_add(sx), top.saturating_add(sy), 1.0);
                    }
                }
            }
        }
    }
    mask
}

fn rasterize_outline(font: &Font<'static>, text: &str, size: f32) -> Mask {
    let scale = Scale::uniform(size);
    let ascent = font.v_metrics(scale).ascent;
    let glyphs: Vec<_> = font.layout(text, scale, point(0.0, ascent)).collect();
    let bounds = glyphs
        .iter()
        .filter_map(|glyph| glyph.pixel_bounding_box())
        .fold(None, |acc: Option<(i32, i32, i32, i32)>, bb| {
            Some(acc.map_or((bb.min.x, bb.min.y, bb.max.x, bb.max.y), |(x0, y0, x1, y1)| {
                (x0.min(bb.min.x), y0.min(bb.min.y), x1.max(bb.max.x), y1.max(bb.max.y))
            }))
        });
    let Some((min_x, min_y, max_x, max_y)) = bounds else {
        return Mask::new(0, 0);
    };
    let width = u32::try_from(max_x.saturating_sub(min_x)).unwrap_or(0);
    let height = u32::try_from(max_y.saturating_sub(min_y)).unwrap_or(0);
    let mut mask = Mask::new(width, height);
    for glyph in &glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            let ox = bb.min.x.saturating_sub(min_x);
            let oy = bb.min.y.saturating_sub(min_y);
            glyph.draw(|gx, gy, v| {
                let px = u32::try_from(ox.saturating_add(clamp_dim(gx))).ok();
                let py = u32::try_from(oy.saturating_add(clamp_dim(gy))).ok();
                if let (Some(px), Some(py)) = (px, py) {
                    mask.accumulate(px, py, v);
                }
            });
        }
    }
    mask
}

/// Rows of a 5x7 glyph, bit 4 is the leftmost column.
fn bitmap_glyph(c: char) -> [u8; 7] {
    match fold_char(c) {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ' ' => [0x00; 7],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

/// Upper-case, and map Cyrillic capitals onto their Latin look-alikes.
fn fold_char(c: char) -> char {
    match c.to_uppercase().next().unwrap_or(c) {
        'А' => 'A',
        'В' => 'B',
        'С' => 'C',
        'Е' => 'E',
        'К' => 'K',
        'М' => 'M',
        'Н' => 'H',
        'О' => 'O',
        'Р' => 'P',
        'Т' => 'T',
        'Х' => 'X',
        other => other,
    }
}
