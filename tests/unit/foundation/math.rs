use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(255, 0), 0);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(100, 128), 50);
}

#[test]
fn quantize_drops_low_bits_per_channel() {
    assert_eq!(quantize_rgb([0xFF, 0xFF, 0xFF]), [0xF8, 0xF8, 0xF0]);
    assert_eq!(quantize_rgb([0x07, 0x07, 0x0F]), [0, 0, 0]);
    assert_eq!(quantize_rgb([0x08, 0x08, 0x0F]), [0x08, 0x08, 0x00]);
}

#[test]
fn unit_to_u8_clamps() {
    assert_eq!(unit_to_u8(-1.0), 0);
    assert_eq!(unit_to_u8(2.0), 255);
    assert_eq!(unit_to_u8(0.5), 128);
}

#[test]
fn finite_or_replaces_nan_and_infinity() {
    assert_eq!(finite_or(f64::NAN, 3.0), 3.0);
    assert_eq!(finite_or(f64::INFINITY, 3.0), 3.0);
    assert_eq!(finite_or(-2.5, 3.0), -2.5);
}
