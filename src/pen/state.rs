use crate::foundation::core::{Point, Rgb8};
use crate::foundation::math::finite_or;
use crate::pen::color::{legacy_shade_rgb, rgb_to_hsv, scratch_color_to_rgba};
use crate::pen::renderer::PenRenderer;

const DEFAULT_SIZE: f64 = 1.0;
const DEFAULT_HUE: f64 = 66.66;
const DEFAULT_SHADE: f64 = 50.0;

/// Snapshot of every pen attribute.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PenProperties {
    /// Whether moves draw.
    pub down: bool,
    /// Stroke diameter in stage units.
    pub size: f64,
    /// Hue, `[0, 100)`.
    pub hue: f64,
    /// Saturation, `[0, 100]`.
    pub saturation: f64,
    /// Brightness, `[0, 100]`.
    pub brightness: f64,
    /// Transparency, `[0, 100]`.
    pub transparency: f64,
    /// Legacy shade, `[0, 200)`.
    pub shade: f64,
    /// Last tracked x, if any.
    pub last_x: Option<f64>,
    /// Last tracked y, if any.
    pub last_y: Option<f64>,
}

/// Per-sprite pen attributes and position tracking.
///
/// Cloning yields an independent copy, which is what a sprite clone gets.
#[derive(Clone, Debug, PartialEq)]
pub struct PenState {
    down: bool,
    size: f64,
    hue: f64,
    saturation: f64,
    brightness: f64,
    transparency: f64,
    shade: f64,
    last: Option<Point>,
}

impl Default for PenState {
    fn default() -> Self {
        Self {
            down: false,
            size: DEFAULT_SIZE,
            hue: DEFAULT_HUE,
            saturation: 100.0,
            brightness: 100.0,
            transparency: 0.0,
            shade: DEFAULT_SHADE,
            last: None,
        }
    }
}

impl PenState {
    /// Pen up, size 1, opaque fully saturated blue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the pen is down.
    pub fn is_down(&self) -> bool {
        self.down
    }

    /// Raise or lower the pen at `(x, y)`.
    ///
    /// The point becomes the start of the next line; nothing is drawn.
    pub fn set_down(&mut self, down: bool, x: f64, y: f64) {
        self.down = down;
        self.last = Some(Point::new(x, y));
    }

    /// Set the stroke diameter. Not clamped.
    pub fn set_size(&mut self, size: f64) {
        self.size = finite_or(size, self.size);
    }

    /// Add to the stroke diameter. Not clamped.
    pub fn change_size(&mut self, delta: f64) {
        self.set_size(self.size + delta);
    }

    /// Set hue, wrapping into `[0, 100)`.
    pub fn set_hue(&mut self, hue: f64) {
        self.hue = wrap(finite_or(hue, 0.0), 100.0);
    }

    /// Add to hue, wrapping into `[0, 100)`.
    pub fn change_hue(&mut self, delta: f64) {
        self.set_hue(self.hue + delta);
    }

    /// Set saturation, clamped to `[0, 100]`.
    pub fn set_saturation(&mut self, v: f64) {
        self.saturation = clamp_percent(v);
    }

    /// Add to saturation, clamped to `[0, 100]`.
    pub fn change_saturation(&mut self, delta: f64) {
        self.set_saturation(self.saturation + delta);
    }

    /// Set brightness, clamped to `[0, 100]`.
    pub fn set_brightness(&mut self, v: f64) {
        self.brightness = clamp_percent(v);
    }

    /// Add to brightness, clamped to `[0, 100]`.
    pub fn change_brightness(&mut self, delta: f64) {
        self.set_brightness(self.brightness + delta);
    }

    /// Set transparency, clamped to `[0, 100]`.
    pub fn set_transparency(&mut self, v: f64) {
        self.transparency = clamp_percent(v);
    }

    /// Add to transparency, clamped to `[0, 100]`.
    pub fn change_transparency(&mut self, delta: f64) {
        self.set_transparency(self.transparency + delta);
    }

    /// Set the legacy shade (wrapped into `[0, 200)`) and recompute hue, saturation and
    /// brightness from it.
    pub fn set_shade(&mut self, shade: f64) {
        self.shade = wrap(finite_or(shade, DEFAULT_SHADE), 200.0);
        self.apply_legacy_shade();
    }

    /// Add to the legacy shade.
    pub fn change_shade(&mut self, delta: f64) {
        self.set_shade(self.shade + delta);
    }

    /// Legacy "set pen color to number": `value` is a 0..200 hue.
    ///
    /// Resets transparency and re-applies the current legacy shade.
    pub fn set_color_from_hue(&mut self, value: f64) {
        self.set_hue(finite_or(value, 0.0) / 2.0);
        self.transparency = 0.0;
        self.apply_legacy_shade();
    }

    /// Set the color from an RGB value; transparency resets to 0 and the legacy shade follows
    /// the new brightness.
    pub fn set_color_from_rgb(&mut self, rgb: Rgb8) {
        let (h, s, v) = rgb_to_hsv(rgb.to_array().map(|c| f64::from(c) / 255.0));
        self.hue = wrap(h * 100.0 / 360.0, 100.0);
        self.saturation = s * 100.0;
        self.brightness = v * 100.0;
        self.transparency = 0.0;
        self.shade = self.brightness / 2.0;
    }

    /// Straight-alpha RGBA in `[0, 1]` that strokes are drawn with.
    pub fn pen_color_rgba(&self) -> [f32; 4] {
        scratch_color_to_rgba(
            self.hue,
            self.saturation,
            self.brightness,
            self.transparency,
        )
    }

    /// Move the sprite to `(x, y)`, drawing from the previous position when the pen is down.
    ///
    /// Returns `true` when a line was queued.
    pub fn update_position(&mut self, x: f64, y: f64, renderer: &mut PenRenderer) -> bool {
        let next = Point::new(x, y);
        let prev = self.last.replace(next);
        if !self.down {
            return false;
        }
        match prev {
            None => {
                tracing::debug!(x, y, "pen is down without a start point; establishing one");
                false
            }
            Some(p) if p == next => false,
            Some(p) => {
                renderer.queue_line(p.x, p.y, x, y, self.size, self.pen_color_rgba());
                true
            }
        }
    }

    /// Every attribute at once.
    pub fn properties(&self) -> PenProperties {
        PenProperties {
            down: self.down,
            size: self.size,
            hue: self.hue,
            saturation: self.saturation,
            brightness: self.brightness,
            transparency: self.transparency,
            shade: self.shade,
            last_x: self.last.map(|p| p.x),
            last_y: self.last.map(|p| p.y),
        }
    }

    /// Restore default attributes. Position tracking is kept.
    pub fn reset_defaults(&mut self) {
        let last = self.last;
        *self = Self {
            last,
            ..Self::default()
        };
    }

    /// Forget the tracked position.
    pub fn reset_position(&mut self) {
        self.last = None;
    }

    fn apply_legacy_shade(&mut self) {
        let (h, s, v) = rgb_to_hsv(legacy_shade_rgb(self.hue, self.shade));
        self.hue = wrap(h * 100.0 / 360.0, 100.0);
        self.saturation = s * 100.0;
        self.brightness = v * 100.0;
    }
}

/// `v mod m` into `[0, m)`, negative-safe.
fn wrap(v: f64, m: f64) -> f64 {
    let w = v.rem_euclid(m);
    if w >= m { 0.0 } else { w }
}

fn clamp_percent(v: f64) -> f64 {
    finite_or(v, 0.0).clamp(0.0, 100.0)
}

#[cfg(test)]
#[path = "../../tests/unit/pen/state.rs"]
mod tests;
