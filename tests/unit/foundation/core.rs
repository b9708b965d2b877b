use super::*;

#[test]
fn default_stage_bounds_are_centered() {
    let b = StageSize::default().bounds();
    assert_eq!(b, Rect::new(-240.0, -180.0, 240.0, 180.0));
}

#[test]
fn stage_origin_maps_to_canvas_center() {
    let m = StageMapping::new(StageSize::default(), 1.0).unwrap();
    assert_eq!(m.stage_to_canvas(0.0, 0.0), Point::new(240.0, 180.0));
    assert_eq!(m.stage_to_canvas(-240.0, 180.0), Point::new(0.0, 0.0));
    assert_eq!(m.stage_to_canvas(240.0, -180.0), Point::new(480.0, 360.0));
}

#[test]
fn render_quality_scales_canvas() {
    let m = StageMapping::new(StageSize::default(), 2.0).unwrap();
    assert_eq!((m.canvas_width(), m.canvas_height()), (960, 720));
    assert_eq!(m.stage_to_canvas(10.0, 10.0), Point::new(500.0, 340.0));
    let back = m.canvas_to_stage(500.0, 340.0);
    assert!((back.x - 10.0).abs() < 1e-9 && (back.y - 10.0).abs() < 1e-9);
}

#[test]
fn invalid_quality_is_rejected() {
    assert!(StageMapping::new(StageSize::default(), 0.0).is_err());
    assert!(StageMapping::new(StageSize::default(), -1.0).is_err());
    assert!(StageMapping::new(StageSize::default(), f64::NAN).is_err());
    assert!(
        StageMapping::new(
            StageSize {
                width: 0,
                height: 10
            },
            1.0
        )
        .is_err()
    );
}

#[test]
fn canvas_pixel_is_none_outside_canvas() {
    let m = StageMapping::new(StageSize::default(), 1.0).unwrap();
    assert_eq!(m.canvas_pixel(0.0, 0.0), Some((240, 179)));
    assert_eq!(m.canvas_pixel(0.5, 0.5), Some((240, 179)));
    assert_eq!(m.canvas_pixel(-240.0, 179.5), Some((0, 0)));
    assert_eq!(m.canvas_pixel(0.0, -180.0), Some((240, 359)));
    assert_eq!(m.canvas_pixel(240.0, 0.0), None);
    assert_eq!(m.canvas_pixel(0.0, 180.0), None);
    assert_eq!(m.canvas_pixel(-241.0, 0.0), None);
}

#[test]
fn hex_colors_parse() {
    assert_eq!(Rgb8::from_hex("#ff8000").unwrap(), Rgb8::new(255, 128, 0));
    assert_eq!(Rgb8::from_hex("00FF10").unwrap(), Rgb8::new(0, 255, 16));
    assert!(Rgb8::from_hex("#fff").is_err());
    assert!(Rgb8::from_hex("#gggggg").is_err());
}
