use std::rc::Rc;

use super::*;
use crate::render::costume::{Costume, CostumeId, SpriteId};

fn square(id: u64, x: f64, y: f64, layer: i32) -> SpriteView {
    let costume = Rc::new(Costume::solid(CostumeId(id), 10, 10, [0, 0, 0, 255]));
    let t = costume.placement(x, y, 1.0, 90.0);
    SpriteView::new(SpriteId(id), costume, t, layer)
}

#[test]
fn others_exclude_focal_and_hidden_and_sort_by_layer() {
    let focal = square(1, 0.0, 0.0, 1);
    let top = square(2, 0.0, 0.0, 5);
    let bottom = square(3, 0.0, 0.0, -2);
    let mut hidden = square(4, 0.0, 0.0, 3);
    hidden.visible = false;

    let candidates: Vec<Candidate<'_>> = [&top, &focal, &hidden, &bottom]
        .into_iter()
        .map(|s| Candidate {
            sprite: s,
            overlap: Rect::ZERO,
        })
        .collect();
    let query = CollisionQuery::new(&focal, Rgb8::new(0, 0, 0)).with_candidates(&candidates);
    let ids: Vec<u64> = query
        .others_in_draw_order()
        .iter()
        .map(|s| s.id.0)
        .collect();
    assert_eq!(ids, [3, 2]);
}

#[test]
fn broad_phase_keeps_overlapping_visible_sprites() {
    let focal = square(1, 0.0, 0.0, 0);
    let mut hidden = square(4, 2.0, 0.0, 0);
    hidden.visible = false;
    let sprites = vec![
        focal.clone(),
        square(2, 5.0, 0.0, 0),
        square(3, 200.0, 0.0, 0),
        hidden,
    ];

    let (bounds, candidates) = broad_phase(&focal, &sprites).unwrap();
    assert_eq!(bounds, Rect::new(-5.0, -5.0, 5.0, 5.0));
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].sprite.id, SpriteId(2));
    assert_eq!(candidates[0].overlap, Rect::new(0.0, -5.0, 5.0, 5.0));
}

#[test]
fn broad_phase_needs_a_costume() {
    let mut focal = square(1, 0.0, 0.0, 0);
    focal.costume = None;
    assert!(broad_phase(&focal, &[]).is_none());
}

#[test]
fn query_debug_is_compact() {
    let focal = square(1, 0.0, 0.0, 0);
    let backdrop = SolidBackdrop {
        rgb: Rgb8::new(255, 255, 255),
    };
    let query = CollisionQuery::new(&focal, Rgb8::new(1, 2, 3))
        .with_sprite_mask(Rgb8::new(0, 0, 0))
        .with_scene(&backdrop);
    let s = format!("{query:?}");
    assert!(s.contains("CollisionQuery"));
    assert!(s.contains("has_scene: true"));
    assert_eq!(query.sprite_mask, Some(Rgb8::new(0, 0, 0)));
    assert!(query.bounds.is_none());
}
