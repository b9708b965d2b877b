//! Color conversions for pen attributes.
//!
//! Pen colors are tracked as hue/saturation/brightness/transparency on a 0..100 scale and only
//! become RGBA when a stroke is queued.

/// Convert HSV to RGB.
///
/// `h` is in degrees (any value, wrapped), `s` and `v` in `[0, 1]`. Channels come back in `[0, 1]`.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);
    let h = h.rem_euclid(360.0) / 60.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

/// Convert RGB (`[0, 1]` channels) to `(hue_degrees, saturation, value)`.
///
/// Hue lands in `[0, 360)`; achromatic inputs report hue 0.
pub fn rgb_to_hsv(rgb: [f64; 3]) -> (f64, f64, f64) {
    let [r, g, b] = rgb.map(|c| c.clamp(0.0, 1.0));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };
    if h < 0.0 {
        h += 360.0;
    }
    if h >= 360.0 {
        h -= 360.0;
    }

    let s = if max == 0.0 { 0.0 } else { delta / max };
    (h, s, max)
}

/// Linear blend `a * (1 - f) + b * f`, per channel.
pub fn mix_rgb(a: [f64; 3], b: [f64; 3], f: f64) -> [f64; 3] {
    let f = f.clamp(0.0, 1.0);
    [
        a[0] * (1.0 - f) + b[0] * f,
        a[1] * (1.0 - f) + b[1] * f,
        a[2] * (1.0 - f) + b[2] * f,
    ]
}

/// RGB produced by the legacy shade parameter for a hue (0..100 scale).
///
/// The hue is taken at full saturation and value, then mixed toward black below the midpoint
/// and toward white above it. Shades above 100 mirror back down (`200 - shade`).
pub(crate) fn legacy_shade_rgb(hue: f64, shade: f64) -> [f64; 3] {
    const BLACK: [f64; 3] = [0.0, 0.0, 0.0];
    const WHITE: [f64; 3] = [1.0, 1.0, 1.0];

    let pure = hsv_to_rgb(hue * 360.0 / 100.0, 1.0, 1.0);
    let shade = if shade > 100.0 { 200.0 - shade } else { shade };
    if shade < 50.0 {
        mix_rgb(BLACK, pure, (10.0 + shade) / 60.0)
    } else {
        mix_rgb(pure, WHITE, (shade - 50.0) / 60.0)
    }
}

/// Convert pen attributes (0..100 scales) into straight-alpha RGBA in `[0, 1]`.
///
/// Alpha is `1 - clamp(transparency, 0, 100) / 100`.
pub fn scratch_color_to_rgba(
    hue: f64,
    saturation: f64,
    brightness: f64,
    transparency: f64,
) -> [f32; 4] {
    let [r, g, b] = hsv_to_rgb(
        hue * 360.0 / 100.0,
        saturation / 100.0,
        brightness / 100.0,
    );
    let a = 1.0 - transparency.clamp(0.0, 100.0) / 100.0;
    [r as f32, g as f32, b as f32, a as f32]
}

#[cfg(test)]
#[path = "../../tests/unit/pen/color.rs"]
mod tests;
