use super::*;

fn approx(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

#[test]
fn from_rgba_checks_length() {
    let err = Costume::from_rgba(CostumeId(1), 2, 2, vec![0; 15], Point::ZERO).unwrap_err();
    assert!(err.to_string().starts_with("validation error:"));
    assert!(Costume::from_rgba(CostumeId(1), 2, 2, vec![0; 16], Point::ZERO).is_ok());
}

#[test]
fn solid_costume_texels() {
    let c = Costume::solid(CostumeId(3), 4, 2, [10, 20, 30, 255]);
    assert_eq!(c.texel(3, 1), [10, 20, 30, 255]);
    assert_eq!(c.texel(4, 0), [0, 0, 0, 0]);
    assert_eq!(c.rotation_center(), Point::new(2.0, 1.0));
    assert_eq!(c.size(), Vec2::new(4.0, 2.0));
}

#[test]
fn image_costume_defaults_center() {
    let img = image::RgbaImage::from_pixel(6, 4, image::Rgba([1, 2, 3, 4]));
    let c = Costume::from_rgba_image(CostumeId(0), img, None);
    assert_eq!((c.width(), c.height()), (6, 4));
    assert_eq!(c.rotation_center(), Point::new(3.0, 2.0));
    assert_eq!(c.texel(5, 3), [1, 2, 3, 4]);
}

#[test]
fn placement_puts_rotation_center_on_position_with_y_up() {
    let c = Costume::solid(CostumeId(0), 10, 6, [0, 0, 0, 255]);
    let t = c.placement(0.0, 0.0, 1.0, 90.0);
    assert!(approx(t * Point::new(5.0, 3.0), Point::ZERO));
    assert!(approx(t * Point::new(0.0, 0.0), Point::new(-5.0, 3.0)));
}

#[test]
fn placement_direction_zero_points_up() {
    let c = Costume::solid(CostumeId(0), 10, 6, [0, 0, 0, 255]);
    let t = c.placement(0.0, 0.0, 1.0, 0.0);
    assert!(approx(t * Point::new(10.0, 3.0), Point::new(0.0, 5.0)));
}

#[test]
fn stage_bounds_follow_scale_and_position() {
    let c = Rc::new(Costume::solid(CostumeId(0), 10, 6, [0, 0, 0, 255]));
    let t = c.placement(10.0, 20.0, 2.0, 90.0);
    let view = SpriteView::new(SpriteId(1), c, t, 0);
    let b = view.stage_bounds().unwrap();
    assert!((b.x0 - 0.0).abs() < 1e-9 && (b.x1 - 20.0).abs() < 1e-9);
    assert!((b.y0 - 14.0).abs() < 1e-9 && (b.y1 - 26.0).abs() < 1e-9);

    let bare = SpriteView {
        costume: None,
        ..view
    };
    assert!(bare.stage_bounds().is_none());
}
