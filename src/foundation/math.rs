/// Per-channel mask used to bucket colors for touching-color comparisons (5/5/4 bits kept).
pub(crate) const QUANTIZE_MASK: [u8; 3] = [0xF8, 0xF8, 0xF0];

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

/// Convert a unit-range channel to a byte with round-to-nearest.
pub(crate) fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub(crate) fn quantize_rgb(rgb: [u8; 3]) -> [u8; 3] {
    [
        rgb[0] & QUANTIZE_MASK[0],
        rgb[1] & QUANTIZE_MASK[1],
        rgb[2] & QUANTIZE_MASK[2],
    ]
}

/// Replace NaN/infinite inputs so wrapped and clamped attributes stay well-defined.
pub(crate) fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
