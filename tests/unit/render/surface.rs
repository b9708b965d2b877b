use super::*;

#[test]
fn new_surface_is_transparent() {
    let s = Surface::new(4, 3);
    assert_eq!(s.data().len(), 4 * 3 * 4);
    assert!(s.data().iter().all(|&b| b == 0));
    assert_eq!(s.pixel(10, 10), [0, 0, 0, 0]);
    assert_eq!(s.stencil(0, 0), 0);
}

#[test]
fn premultiplied_blend_is_source_over() {
    let mut s = Surface::new(2, 2);
    s.shade(0, 0, [1.0, 0.0, 0.0, 1.0], BlendMode::Premultiplied, StencilMode::Disabled);
    assert_eq!(s.pixel(0, 0), [255, 0, 0, 255]);

    s.shade(0, 0, [0.0, 0.0, 0.5, 0.5], BlendMode::Premultiplied, StencilMode::Disabled);
    assert_eq!(s.pixel(0, 0), [128, 0, 128, 255]);
}

#[test]
fn alpha_blend_premultiplies_straight_input() {
    let mut s = Surface::new(1, 1);
    s.shade(0, 0, [0.0, 0.0, 1.0, 0.5], BlendMode::Alpha, StencilMode::Disabled);
    assert_eq!(s.pixel(0, 0), [0, 0, 128, 128]);
}

#[test]
fn stencil_write_masks_color_and_test_gates_draws() {
    let mut s = Surface::new(3, 1);
    s.clear_stencil();
    s.shade(1, 0, [1.0, 1.0, 1.0, 1.0], BlendMode::Premultiplied, StencilMode::Write);
    assert_eq!(s.pixel(1, 0), [0, 0, 0, 0]);
    assert_eq!(s.stencil(1, 0), 1);
    assert_eq!(s.stencil(0, 0), 0);

    for x in 0..3 {
        s.shade(x, 0, [0.0, 1.0, 0.0, 1.0], BlendMode::Premultiplied, StencilMode::TestEqualOne);
    }
    assert_eq!(s.pixel(0, 0), [0, 0, 0, 0]);
    assert_eq!(s.pixel(1, 0), [0, 255, 0, 255]);
    assert_eq!(s.pixel(2, 0), [0, 0, 0, 0]);

    s.clear_stencil();
    assert_eq!(s.stencil(1, 0), 0);
}

#[test]
fn clear_fills_every_pixel() {
    let mut s = Surface::new(2, 2);
    s.clear([1, 2, 3, 4]);
    assert!(s.data().chunks_exact(4).all(|px| px == [1, 2, 3, 4]));
}

#[test]
fn read_region_clamps_to_surface() {
    let mut s = Surface::new(4, 3);
    s.shade(3, 2, [1.0, 1.0, 1.0, 1.0], BlendMode::Premultiplied, StencilMode::Disabled);
    let mut out = Vec::new();
    let region = s.read_region(2, 1, 10, 10, &mut out);
    assert_eq!(region, (2, 1, 2, 2));
    assert_eq!(out.len(), 16);
    assert_eq!(&out[12..16], &[255, 255, 255, 255]);

    let empty = s.read_region(9, 9, 2, 2, &mut out);
    assert_eq!((empty.2, empty.3), (0, 0));
    assert!(out.is_empty());
}

#[test]
fn rasterize_quad_visits_covered_pixel_centers() {
    let mut hits = Vec::new();
    rasterize_quad(4, 4, Affine::scale(2.0), |x, y, uv| hits.push((x, y, uv)));
    assert_eq!(hits.len(), 4);
    let (x, y, uv) = hits[0];
    assert_eq!((x, y), (0, 0));
    assert!((uv.x - 0.25).abs() < 1e-12 && (uv.y - 0.25).abs() < 1e-12);
}

#[test]
fn rasterize_quad_skips_degenerate_transforms() {
    let mut count = 0;
    rasterize_quad(4, 4, Affine::scale_non_uniform(0.0, 3.0), |_, _, _| count += 1);
    assert_eq!(count, 0);
}
