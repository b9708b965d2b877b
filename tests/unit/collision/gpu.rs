use std::rc::Rc;

use super::*;
use crate::collision::{Candidate, SolidBackdrop};
use crate::foundation::core::{Rect, Rgb8};
use crate::pen::renderer::PenRendererOpts;
use crate::render::costume::{CostumeId, SpriteId, SpriteView};
use crate::render::device::PipelineState;

const WHITE: Rgb8 = Rgb8::new(255, 255, 255);
const GREEN: Rgb8 = Rgb8::new(0, 200, 0);
const BLUE: Rgb8 = Rgb8::new(0, 0, 255);
const RED: Rgb8 = Rgb8::new(255, 0, 0);

fn square(id: u64, rgb: Rgb8, layer: i32) -> SpriteView {
    let [r, g, b] = rgb.to_array();
    let costume = Rc::new(Costume::solid(CostumeId(id), 10, 10, [r, g, b, 255]));
    let t = costume.placement(0.0, 0.0, 1.0, 90.0);
    SpriteView::new(SpriteId(id), costume, t, layer)
}

fn setup() -> (PenRenderer, GpuCollisionStrategy) {
    let mut pen = PenRenderer::new(PenRendererOpts::default()).unwrap();
    let gpu = GpuCollisionStrategy::new(&mut pen, GpuCollisionOpts::default()).unwrap();
    (pen, gpu)
}

#[test]
fn scratch_matches_the_pen_canvas() {
    let (pen, gpu) = setup();
    assert_eq!(gpu.scratch().width(), pen.canvas().width());
    assert_eq!(gpu.scratch().height(), pen.canvas().height());
}

#[test]
fn readback_square_covers_the_sprite() {
    let c = Costume::solid(CostumeId(0), 10, 10, [0, 0, 0, 255]);
    let mapping = StageMapping::new(Default::default(), 1.0).unwrap();
    let (x, y, side) = readback_square(&c, c.placement(0.0, 0.0, 1.0, 45.0), mapping).unwrap();
    assert!(x <= 233 && y <= 173);
    assert!(x + side >= 247 && y + side >= 187);

    let off = readback_square(&c, c.placement(1000.0, 0.0, 1.0, 90.0), mapping);
    assert!(off.is_none());
}

#[test]
fn missing_scene_or_costume_degrades_to_no_match() {
    let (mut pen, mut gpu) = setup();
    let focal = square(1, GREEN, 0);
    assert_eq!(gpu.check(&CollisionQuery::new(&focal, WHITE), &mut pen), None);

    let scene = SolidBackdrop { rgb: WHITE };
    let bare = SpriteView {
        costume: None,
        ..focal.clone()
    };
    let q = CollisionQuery::new(&bare, WHITE).with_scene(&scene);
    assert_eq!(gpu.check(&q, &mut pen), None);
}

#[test]
fn finds_backdrop_under_the_sprite() {
    let (mut pen, mut gpu) = setup();
    let focal = square(1, GREEN, 0);
    let scene = SolidBackdrop { rgb: WHITE };
    let q = CollisionQuery::new(&focal, WHITE).with_scene(&scene);
    assert_eq!(gpu.check(&q, &mut pen), Some(Point::new(-4.5, 4.5)));

    let own = CollisionQuery::new(&focal, GREEN).with_scene(&scene);
    assert_eq!(gpu.check(&own, &mut pen), None);
}

#[test]
fn stencil_limits_draws_to_the_silhouette() {
    let (mut pen, mut gpu) = setup();
    let focal = square(1, GREEN, 0);
    let scene = SolidBackdrop { rgb: WHITE };
    let q = CollisionQuery::new(&focal, WHITE).with_scene(&scene);
    gpu.check(&q, &mut pen);

    let scratch = gpu.scratch();
    assert_eq!(scratch.pixel(240, 180), [255, 255, 255, 255]);
    assert_eq!(scratch.pixel(100, 100), [0, 0, 0, 0]);
    assert_eq!(scratch.stencil(240, 180), 1);
    assert_eq!(scratch.stencil(100, 100), 0);
}

#[test]
fn finds_flushed_pen_strokes() {
    let (mut pen, mut gpu) = setup();
    pen.queue_line(-20.0, 0.0, 20.0, 0.0, 4.0, [1.0, 0.0, 0.0, 1.0]);
    pen.flush();

    let focal = square(1, GREEN, 0);
    let scene = SolidBackdrop { rgb: WHITE };
    let q = CollisionQuery::new(&focal, RED).with_scene(&scene);
    assert_eq!(gpu.check(&q, &mut pen), Some(Point::new(-4.5, 1.5)));
}

#[test]
fn covering_sprites_hide_what_is_beneath() {
    let (mut pen, mut gpu) = setup();
    let focal = square(1, GREEN, 0);
    let cover = square(2, BLUE, 1);
    let scene = SolidBackdrop { rgb: WHITE };
    let candidates = [Candidate {
        sprite: &cover,
        overlap: Rect::new(-5.0, -5.0, 5.0, 5.0),
    }];
    let q = CollisionQuery::new(&focal, WHITE)
        .with_scene(&scene)
        .with_candidates(&candidates);
    assert_eq!(gpu.check(&q, &mut pen), None);
    assert!(gpu.check(&CollisionQuery { target: BLUE, ..q }, &mut pen).is_some());
}

#[test]
fn device_state_is_restored_after_checks() {
    let (mut pen, mut gpu) = setup();
    let focal = square(1, GREEN, 0);
    let scene = SolidBackdrop { rgb: WHITE };
    let q = CollisionQuery::new(&focal, WHITE).with_scene(&scene);
    gpu.check(&q, &mut pen);
    assert_eq!(pen.device().state(), PipelineState::default());

    let miss = CollisionQuery::new(&focal, RED).with_scene(&scene);
    gpu.check(&miss, &mut pen);
    assert_eq!(pen.device().state(), PipelineState::default());
}
