use crate::foundation::core::{Affine, Rect, Rgb8, StageMapping};
use crate::foundation::math::mul_div255_u8;
use crate::render::costume::{Costume, SpriteView};
use crate::render::device::{Device, ProgramId};
use crate::render::surface::{BlendMode, Surface, rasterize_quad};

/// Draw-call surface handed to external callbacks (stamps, backdrop and sprite draws).
///
/// Coordinates are stage coordinates; the painter maps them onto its target. Every draw uses the
/// blend and stencil state active on the device at the time of the call.
#[derive(Debug)]
pub struct Painter<'a> {
    device: &'a mut Device,
    target: &'a mut Surface,
    mapping: StageMapping,
    program: ProgramId,
}

impl<'a> Painter<'a> {
    pub(crate) fn new(
        device: &'a mut Device,
        target: &'a mut Surface,
        mapping: StageMapping,
        program: ProgramId,
    ) -> Self {
        Self {
            device,
            target,
            mapping,
            program,
        }
    }

    /// Mapping between stage coordinates and target pixels.
    pub fn mapping(&self) -> StageMapping {
        self.mapping
    }

    /// Fill the whole target with an opaque color.
    pub fn fill_rgb(&mut self, rgb: Rgb8) {
        self.device.use_program(self.program);
        let state = self.device.state();
        let src = [
            f32::from(rgb.r) / 255.0,
            f32::from(rgb.g) / 255.0,
            f32::from(rgb.b) / 255.0,
            1.0,
        ];
        for py in 0..self.target.height() {
            for px in 0..self.target.width() {
                self.target.shade(px, py, src, state.blend, state.stencil);
            }
        }
    }

    /// Draw a costume; `transform` maps costume pixels to stage coordinates.
    pub fn draw_costume(&mut self, costume: &Costume, transform: Affine) {
        self.device.use_program(self.program);
        let state = self.device.state();
        let size = costume.size();
        let quad_to_target = self.mapping.stage_to_canvas_affine()
            * transform
            * Affine::scale_non_uniform(size.x, size.y);
        let (cw, ch) = (costume.width(), costume.height());
        let (w, h) = (self.target.width(), self.target.height());
        let target = &mut *self.target;
        rasterize_quad(w, h, quad_to_target, |px, py, uv| {
            let tx = ((uv.x * f64::from(cw)) as u32).min(cw.saturating_sub(1));
            let ty = ((uv.y * f64::from(ch)) as u32).min(ch.saturating_sub(1));
            let t = costume.texel(tx, ty);
            if t[3] == 0 {
                return;
            }
            let texel = match state.blend {
                BlendMode::Premultiplied => [
                    mul_div255_u8(u16::from(t[0]), u16::from(t[3])),
                    mul_div255_u8(u16::from(t[1]), u16::from(t[3])),
                    mul_div255_u8(u16::from(t[2]), u16::from(t[3])),
                    t[3],
                ],
                BlendMode::Alpha => t,
            };
            let src = texel.map(|c| f32::from(c) / 255.0);
            target.shade(px, py, src, state.blend, state.stencil);
        });
    }

    /// Draw a sprite's current costume. Hidden or costume-less sprites draw nothing.
    pub fn draw_sprite(&mut self, sprite: &SpriteView) {
        if !sprite.visible {
            return;
        }
        if let Some(costume) = sprite.costume.as_deref() {
            self.draw_costume(costume, sprite.transform);
        }
    }

    /// Stretch a premultiplied surface over a stage-space rectangle.
    pub fn draw_surface(&mut self, src: &Surface, dest: Rect) {
        if src.width() == 0 || src.height() == 0 {
            return;
        }
        self.device.use_program(self.program);
        let state = self.device.state();
        // Unit quad (0,0) is the top-left texel; stage y grows upward.
        let quad_to_stage = Affine::new([dest.width(), 0.0, 0.0, -dest.height(), dest.x0, dest.y1]);
        let quad_to_target = self.mapping.stage_to_canvas_affine() * quad_to_stage;
        let (sw, sh) = (src.width(), src.height());
        let (w, h) = (self.target.width(), self.target.height());
        let target = &mut *self.target;
        rasterize_quad(w, h, quad_to_target, |px, py, uv| {
            let sx = ((uv.x * f64::from(sw)) as u32).min(sw - 1);
            let sy = ((uv.y * f64::from(sh)) as u32).min(sh - 1);
            let p = src.pixel(sx, sy);
            if p[3] == 0 {
                return;
            }
            let premul = p.map(|c| f32::from(c) / 255.0);
            let color = match state.blend {
                BlendMode::Premultiplied => premul,
                BlendMode::Alpha => {
                    let a = premul[3];
                    [premul[0] / a, premul[1] / a, premul[2] / a, a]
                }
            };
            target.shade(px, py, color, state.blend, state.stencil);
        });
    }
}
