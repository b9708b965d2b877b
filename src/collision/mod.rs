//! Touching-color queries.
//!
//! A query asks whether any point covered by a sprite currently shows a given color in the
//! composited scene (other sprites, pen layer, backdrop). Two strategies answer it:
//! [`CpuCollisionStrategy`] samples costumes and the pen snapshot point by point, and
//! [`GpuCollisionStrategy`] re-renders the scene under a stencil of the sprite and scans a
//! read-back region. They trade accuracy for cost and agree within their tolerances.

pub(crate) mod cpu;
pub(crate) mod gpu;
pub(crate) mod sampler;

use crate::foundation::core::{Point, Rect, Rgb8};
use crate::pen::renderer::PenRenderer;
use crate::render::costume::SpriteView;
use crate::render::painter::Painter;

pub use cpu::{CpuCollisionOpts, CpuCollisionStrategy};
pub use gpu::{GpuCollisionOpts, GpuCollisionStrategy};

/// Scene collaborator: supplies the backdrop and draws sprites.
pub trait Scene {
    /// Stage background color.
    fn background_rgb(&self) -> Rgb8;

    /// Draw the backdrop.
    fn draw_backdrop(&self, painter: &mut Painter<'_>);

    /// Draw one sprite.
    fn draw_sprite(&self, painter: &mut Painter<'_>, sprite: &SpriteView) {
        painter.draw_sprite(sprite);
    }
}

/// A scene whose backdrop is a single color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolidBackdrop {
    /// Backdrop color.
    pub rgb: Rgb8,
}

impl Scene for SolidBackdrop {
    fn background_rgb(&self) -> Rgb8 {
        self.rgb
    }

    fn draw_backdrop(&self, painter: &mut Painter<'_>) {
        painter.fill_rgb(self.rgb);
    }
}

/// A sprite whose bounds intersect the query region, from the broad phase.
#[derive(Clone, Copy, Debug)]
pub struct Candidate<'a> {
    /// The sprite.
    pub sprite: &'a SpriteView,
    /// Intersection of its bounds with the query region, in stage coordinates.
    ///
    /// Broad-phase metadata only; both strategies sample the whole candidate.
    pub overlap: Rect,
}

/// Inputs of one touching-color check.
#[derive(Clone, Copy)]
pub struct CollisionQuery<'a> {
    /// Sprite doing the touching.
    pub sprite: &'a SpriteView,
    /// Color to look for.
    pub target: Rgb8,
    /// Restrict to the sprite's pixels of this color ("color is touching color").
    pub sprite_mask: Option<Rgb8>,
    /// Other sprites that may be visible under the sprite.
    pub candidates: &'a [Candidate<'a>],
    /// Stage-space region to scan.
    pub bounds: Option<Rect>,
    /// Scene collaborator.
    pub scene: Option<&'a dyn Scene>,
}

impl std::fmt::Debug for CollisionQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionQuery")
            .field("sprite", &self.sprite.id)
            .field("target", &self.target)
            .field("sprite_mask", &self.sprite_mask)
            .field("candidates", &self.candidates.len())
            .field("bounds", &self.bounds)
            .field("has_scene", &self.scene.is_some())
            .finish()
    }
}

impl<'a> CollisionQuery<'a> {
    /// A query with no candidates, bounds or scene.
    pub fn new(sprite: &'a SpriteView, target: Rgb8) -> Self {
        Self {
            sprite,
            target,
            sprite_mask: None,
            candidates: &[],
            bounds: None,
            scene: None,
        }
    }

    /// Restrict to the sprite's pixels of `mask`.
    pub fn with_sprite_mask(mut self, mask: Rgb8) -> Self {
        self.sprite_mask = Some(mask);
        self
    }

    /// Set the candidate list.
    pub fn with_candidates(mut self, candidates: &'a [Candidate<'a>]) -> Self {
        self.candidates = candidates;
        self
    }

    /// Set the region to scan.
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Set the scene collaborator.
    pub fn with_scene(mut self, scene: &'a dyn Scene) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Visible candidates other than the queried sprite, bottom layer first.
    pub(crate) fn others_in_draw_order(&self) -> Vec<&'a SpriteView> {
        let mut others: Vec<&'a SpriteView> = self
            .candidates
            .iter()
            .map(|c| c.sprite)
            .filter(|s| s.id != self.sprite.id && s.visible)
            .collect();
        others.sort_by_key(|s| s.layer);
        others
    }
}

/// A touching-color check.
///
/// `None` means no match, including every degraded case (missing scene, bounds or costume, empty
/// region). Implementations never fail and never panic on bad input.
pub trait CollisionStrategy {
    /// Return the stage point of the first match, if any.
    fn check(&mut self, query: &CollisionQuery<'_>, pen: &mut PenRenderer) -> Option<Point>;
}

/// Simple broad phase: sprites (other than `focal`) whose stage bounds meet `focal`'s.
///
/// Returns the focal bounds to use as the query region alongside the candidates.
pub fn broad_phase<'a>(
    focal: &SpriteView,
    sprites: &'a [SpriteView],
) -> Option<(Rect, Vec<Candidate<'a>>)> {
    let bounds = focal.stage_bounds()?;
    let candidates = sprites
        .iter()
        .filter(|s| s.id != focal.id && s.visible)
        .filter_map(|s| {
            let overlap = s.stage_bounds()?.intersect(bounds);
            (overlap.width() > 0.0 && overlap.height() > 0.0).then_some(Candidate {
                sprite: s,
                overlap,
            })
        })
        .collect();
    Some((bounds, candidates))
}

#[cfg(test)]
#[path = "../../tests/unit/collision/query.rs"]
mod tests;
