use crate::foundation::error::{PenError, PenResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Largest canvas edge the software device accepts, in pixels.
pub(crate) const MAX_CANVAS_EDGE: u32 = 16384;

/// Stage dimensions in stage units.
///
/// The stage is centered on the origin with the y-axis pointing up, so the default stage spans
/// `[-240, 240] x [-180, 180]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StageSize {
    /// Width in stage units.
    pub width: u32,
    /// Height in stage units.
    pub height: u32,
}

impl Default for StageSize {
    fn default() -> Self {
        Self {
            width: 480,
            height: 360,
        }
    }
}

impl StageSize {
    /// Stage extents in stage coordinates.
    pub fn bounds(self) -> Rect {
        let hw = f64::from(self.width) / 2.0;
        let hh = f64::from(self.height) / 2.0;
        Rect::new(-hw, -hh, hw, hh)
    }
}

/// Mapping between stage coordinates and canvas pixels at a given render quality.
///
/// Stage space: origin at the center, y up. Canvas space: origin at the top-left, y down,
/// scaled by `quality`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageMapping {
    stage: StageSize,
    quality: f64,
    width: u32,
    height: u32,
}

impl StageMapping {
    /// Create a validated mapping.
    pub fn new(stage: StageSize, quality: f64) -> PenResult<Self> {
        if !quality.is_finite() || quality <= 0.0 {
            return Err(PenError::validation(format!(
                "render quality must be finite and > 0, got {quality}"
            )));
        }
        let width = (f64::from(stage.width) * quality).round();
        let height = (f64::from(stage.height) * quality).round();
        if width < 1.0 || height < 1.0 {
            return Err(PenError::validation("canvas must be at least 1x1 pixels"));
        }
        if width > f64::from(MAX_CANVAS_EDGE) || height > f64::from(MAX_CANVAS_EDGE) {
            return Err(PenError::validation(format!(
                "canvas {width}x{height} exceeds {MAX_CANVAS_EDGE}px edge limit"
            )));
        }
        Ok(Self {
            stage,
            quality,
            width: width as u32,
            height: height as u32,
        })
    }

    /// Stage dimensions this mapping was built for.
    pub fn stage(self) -> StageSize {
        self.stage
    }

    /// Canvas pixels per stage unit.
    pub fn quality(self) -> f64 {
        self.quality
    }

    /// Canvas width in pixels.
    pub fn canvas_width(self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    pub fn canvas_height(self) -> u32 {
        self.height
    }

    /// Map a stage point to (fractional) canvas pixel coordinates.
    pub fn stage_to_canvas(self, x: f64, y: f64) -> Point {
        self.stage_to_canvas_affine() * Point::new(x, y)
    }

    /// Map (fractional) canvas pixel coordinates back to stage coordinates.
    pub fn canvas_to_stage(self, px: f64, py: f64) -> Point {
        let q = self.quality;
        let hw = f64::from(self.stage.width) / 2.0;
        let hh = f64::from(self.stage.height) / 2.0;
        Point::new(px / q - hw, hh - py / q)
    }

    /// Affine form of [`StageMapping::stage_to_canvas`].
    pub fn stage_to_canvas_affine(self) -> Affine {
        let q = self.quality;
        let hw = f64::from(self.stage.width) / 2.0;
        let hh = f64::from(self.stage.height) / 2.0;
        Affine::new([q, 0.0, 0.0, -q, hw * q, hh * q])
    }

    /// Canvas pixel containing the stage point, or `None` when it falls outside the canvas.
    ///
    /// Integer stage coordinates `(x, y)` select the pixel spanning `[x, x + 1) x [y, y + 1)` at
    /// quality 1.
    pub fn canvas_pixel(self, x: f64, y: f64) -> Option<(u32, u32)> {
        let p = self.stage_to_canvas(x, y);
        let (px, py) = (p.x.floor(), p.y.ceil() - 1.0);
        if !(px >= 0.0 && py >= 0.0) || px >= f64::from(self.width) || py >= f64::from(self.height)
        {
            return None;
        }
        Some((px as u32, py as u32))
    }
}

/// Opaque RGB color, 0..=255 per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a packed `0xRRGGBB` value. Bits above 24 are ignored.
    pub fn from_u32(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >> 8) & 0xFF) as u8,
            b: (rgb & 0xFF) as u8,
        }
    }

    /// Parse `#RRGGBB` or `RRGGBB` (case-insensitive).
    pub fn from_hex(s: &str) -> PenResult<Self> {
        let s = s.trim();
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PenError::validation(format!(
                "hex color must be #RRGGBB, got \"{s}\""
            )));
        }
        let packed = u32::from_str_radix(digits, 16)
            .map_err(|e| PenError::validation(format!("invalid hex color \"{s}\": {e}")))?;
        Ok(Self::from_u32(packed))
    }

    /// Channels as an array.
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
