use crate::collision::{CollisionQuery, CollisionStrategy};
use crate::foundation::core::{Affine, Point, StageMapping};
use crate::foundation::error::PenResult;
use crate::pen::renderer::PenRenderer;
use crate::render::costume::Costume;
use crate::render::device::{Device, ProgramId, TargetKind, ValueKind};
use crate::render::painter::Painter;
use crate::render::shader::{SILHOUETTE_PROGRAM, silhouette_fragment};
use crate::render::surface::{BlendMode, StencilMode, Surface, rasterize_quad};

/// Options for [`GpuCollisionStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GpuCollisionOpts {
    /// Distance between scanned pixels of the read-back region.
    pub stride: u32,
    /// Absolute per-channel tolerance against the target color.
    pub tolerance: u8,
    /// Scanned pixels must have alpha strictly above this.
    pub min_alpha: u8,
}

impl Default for GpuCollisionOpts {
    fn default() -> Self {
        Self {
            stride: 1,
            tolerance: 25,
            min_alpha: 25,
        }
    }
}

/// Stencil-and-readback strategy.
///
/// Renders the scene without the queried sprite, restricted to the sprite's silhouette, into a
/// scratch canvas, then scans a read-back square around the sprite.
#[derive(Debug)]
pub struct GpuCollisionStrategy {
    opts: GpuCollisionOpts,
    silhouette: ProgramId,
    scratch: Surface,
    readback: Vec<u8>,
}

impl GpuCollisionStrategy {
    /// Link the silhouette program on `pen`'s device and allocate the scratch canvas.
    pub fn new(pen: &mut PenRenderer, opts: GpuCollisionOpts) -> PenResult<Self> {
        let desc = SILHOUETTE_PROGRAM;
        desc.require_uniform("u_skin", ValueKind::Sampler2D)?;
        desc.require_uniform("u_colorMask", ValueKind::Vec4)?;
        let mapping = pen.mapping();
        let (device, _) = pen.device_and_canvas();
        let silhouette = device.link(desc)?;
        Ok(Self {
            opts,
            silhouette,
            scratch: Surface::new(mapping.canvas_width(), mapping.canvas_height()),
            readback: Vec::new(),
        })
    }

    /// The scratch canvas holding the last rendered query.
    pub fn scratch(&self) -> &Surface {
        &self.scratch
    }

    fn ensure_scratch(&mut self, mapping: StageMapping) {
        let (w, h) = (mapping.canvas_width(), mapping.canvas_height());
        if self.scratch.width() != w || self.scratch.height() != h {
            self.scratch = Surface::new(w, h);
        }
    }
}

impl CollisionStrategy for GpuCollisionStrategy {
    #[tracing::instrument(skip_all, fields(sprite = query.sprite.id.0))]
    fn check(&mut self, query: &CollisionQuery<'_>, pen: &mut PenRenderer) -> Option<Point> {
        let Some(scene) = query.scene else {
            tracing::debug!("no scene");
            return None;
        };
        let Some(costume) = query.sprite.costume.as_deref() else {
            tracing::debug!("sprite has no costume");
            return None;
        };
        if costume.width() == 0 || costume.height() == 0 {
            tracing::debug!("sprite costume is empty");
            return None;
        }

        let mapping = pen.mapping();
        let Some((x0, y0, side)) = readback_square(costume, query.sprite.transform, mapping) else {
            tracing::debug!("sprite covers no canvas pixels");
            return None;
        };
        self.ensure_scratch(mapping);
        let sprite_program = pen.sprite_program();
        let others = query.others_in_draw_order();
        let (device, pen_canvas) = pen.device_and_canvas();

        {
            let mut gl = device.scope();
            gl.bind_target(TargetKind::CollisionScratch);

            self.scratch.clear([0, 0, 0, 0]);
            self.scratch.clear_stencil();
            gl.use_program(self.silhouette);
            gl.set_stencil(StencilMode::Write);
            stencil_silhouette(
                &mut gl,
                &mut self.scratch,
                mapping,
                costume,
                query.sprite.transform,
                query.sprite_mask.map(|m| m.to_array()),
            );

            gl.set_stencil(StencilMode::TestEqualOne);
            gl.set_blend(BlendMode::Premultiplied);
            let mut painter = Painter::new(&mut gl, &mut self.scratch, mapping, sprite_program);
            scene.draw_backdrop(&mut painter);
            painter.draw_surface(pen_canvas, mapping.stage().bounds());
            for sprite in others {
                scene.draw_sprite(&mut painter, sprite);
            }
        }

        let (rx, ry, rw, rh) = self
            .scratch
            .read_region(x0, y0, side, side, &mut self.readback);
        if rw == 0 || rh == 0 {
            tracing::debug!(x0, y0, side, "empty readback region");
            return None;
        }

        let target = query.target.to_array();
        let tol = i16::from(self.opts.tolerance);
        let step = self.opts.stride.max(1) as usize;
        for row in (0..rh as usize).step_by(step) {
            for col in (0..rw as usize).step_by(step) {
                let i = (row * rw as usize + col) * 4;
                let px = &self.readback[i..i + 4];
                if px[3] <= self.opts.min_alpha {
                    continue;
                }
                let close = (0..3).all(|c| (i16::from(px[c]) - i16::from(target[c])).abs() <= tol);
                if close {
                    let cx = f64::from(rx) + col as f64 + 0.5;
                    let cy = f64::from(ry) + row as f64 + 0.5;
                    return Some(mapping.canvas_to_stage(cx, cy));
                }
            }
        }
        None
    }
}

/// Write 1 into the stencil wherever the costume survives the silhouette fragment.
fn stencil_silhouette(
    device: &mut Device,
    target: &mut Surface,
    mapping: StageMapping,
    costume: &Costume,
    transform: Affine,
    mask: Option<[u8; 3]>,
) {
    let state = device.state();
    let size = costume.size();
    let quad_to_target =
        mapping.stage_to_canvas_affine() * transform * Affine::scale_non_uniform(size.x, size.y);
    let (cw, ch) = (costume.width(), costume.height());
    let (w, h) = (target.width(), target.height());
    rasterize_quad(w, h, quad_to_target, |px, py, uv| {
        let tx = ((uv.x * f64::from(cw)) as u32).min(cw - 1);
        let ty = ((uv.y * f64::from(ch)) as u32).min(ch - 1);
        if silhouette_fragment(costume.texel(tx, ty), mask) {
            target.shade(px, py, [0.0; 4], state.blend, state.stencil);
        }
    });
}

/// Canvas-pixel square centered on the costume, as wide as its diagonal.
///
/// Returns `(x, y, side)` clamped to the canvas, or `None` when nothing of it is on the canvas.
fn readback_square(
    costume: &Costume,
    transform: Affine,
    mapping: StageMapping,
) -> Option<(u32, u32, u32)> {
    let size = costume.size();
    let [a, b, c, d, _, _] = transform.as_coeffs();
    let span_x = (a * size.x).hypot(b * size.x);
    let span_y = (c * size.y).hypot(d * size.y);
    let diagonal = span_x.hypot(span_y) * mapping.quality();
    if !(diagonal.is_finite() && diagonal > 0.0) {
        return None;
    }

    let center = transform * Point::new(size.x / 2.0, size.y / 2.0);
    let center = mapping.stage_to_canvas(center.x, center.y);
    let half = diagonal.ceil() / 2.0 + 1.0;
    let (w, h) = (
        f64::from(mapping.canvas_width()),
        f64::from(mapping.canvas_height()),
    );
    let x0 = (center.x - half).floor().clamp(0.0, w);
    let y0 = (center.y - half).floor().clamp(0.0, h);
    let x1 = (center.x + half).ceil().clamp(0.0, w);
    let y1 = (center.y + half).ceil().clamp(0.0, h);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let side = (x1 - x0).max(y1 - y0) as u32;
    Some((x0 as u32, y0 as u32, side))
}

#[cfg(test)]
#[path = "../../tests/unit/collision/gpu.rs"]
mod tests;
