//! Pen line program and the stencil silhouette program.
//!
//! Both run on the software device: the vertex stage produces an affine placing the static unit
//! quad on the target, and the fragment stage is evaluated at every covered pixel center.

use std::f64::consts::SQRT_2;

use crate::foundation::core::{Affine, Point, Vec2};
use crate::foundation::error::PenResult;
use crate::render::device::{Device, ProgramDesc, ProgramId, ValueKind};
use crate::render::surface::{Surface, rasterize_quad};

/// Anti-alias margin added around every stroke, in canvas pixels.
pub const AA_MARGIN: f64 = SQRT_2;

/// Direction substituted for segments too short to orient.
const DEGENERATE_EPSILON: f64 = 1e-4;

/// Silhouette texels below this alpha are discarded.
pub const SILHOUETTE_MIN_ALPHA: f32 = 0.1;

/// Per-channel tolerance of the silhouette color mask.
pub const SILHOUETTE_MASK_TOLERANCE: f32 = 3.0 / 255.0;

/// Interface of the pen line program.
pub const LINE_PROGRAM: ProgramDesc = ProgramDesc {
    name: "pen_line",
    attributes: &[
        ("a_position", ValueKind::Vec2),
        ("a_texCoord", ValueKind::Vec2),
    ],
    uniforms: &[
        ("u_penPoints", ValueKind::Vec4),
        ("u_penColor", ValueKind::Vec4),
        ("u_penSize", ValueKind::Float),
        ("u_lineLength", ValueKind::Float),
    ],
};

/// Interface of the costume program used for stamps and scene sprites.
pub const SPRITE_PROGRAM: ProgramDesc = ProgramDesc {
    name: "sprite",
    attributes: &[
        ("a_position", ValueKind::Vec2),
        ("a_texCoord", ValueKind::Vec2),
    ],
    uniforms: &[
        ("u_skin", ValueKind::Sampler2D),
        ("u_modelMatrix", ValueKind::Vec4),
    ],
};

/// Interface of the stencil silhouette program.
pub const SILHOUETTE_PROGRAM: ProgramDesc = ProgramDesc {
    name: "silhouette",
    attributes: &[
        ("a_position", ValueKind::Vec2),
        ("a_texCoord", ValueKind::Vec2),
    ],
    uniforms: &[
        ("u_skin", ValueKind::Sampler2D),
        ("u_colorMask", ValueKind::Vec4),
        ("u_colorMaskTolerance", ValueKind::Float),
    ],
};

/// The static unit-quad mesh shared by every stroke.
pub struct UnitQuad;

impl UnitQuad {
    /// Corner positions.
    pub const POSITIONS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    /// Corner texture coordinates.
    pub const TEXCOORDS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    /// Two triangles.
    pub const INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];
}

/// Values for one pen draw, all in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineUniforms {
    /// `(x0, y0, dx, dy)`
    pub pen_points: [f32; 4],
    /// Premultiplied RGBA.
    pub pen_color: [f32; 4],
    /// Stroke diameter, already scaled by render quality.
    pub pen_size: f32,
    /// Segment length.
    pub line_length: f32,
}

/// Last values sent to the line program, tracked per uniform.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShaderUniformState {
    /// Last `u_penPoints`.
    pub pen_points: Option<[f32; 4]>,
    /// Last `u_penColor`.
    pub pen_color: Option<[f32; 4]>,
    /// Last `u_penSize`.
    pub pen_size: Option<f32>,
    /// Last `u_lineLength`.
    pub line_length: Option<f32>,
}

impl ShaderUniformState {
    /// Forget every cached value so the next draw re-sends all uniforms.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    fn apply(&mut self, u: &LineUniforms, device: &mut Device) {
        fn send<T: PartialEq + Copy>(slot: &mut Option<T>, v: T, device: &mut Device) {
            if *slot != Some(v) {
                *slot = Some(v);
                device.record_uniform_upload();
            }
        }
        send(&mut self.pen_points, u.pen_points, device);
        send(&mut self.pen_color, u.pen_color, device);
        send(&mut self.pen_size, u.pen_size, device);
        send(&mut self.line_length, u.line_length, device);
    }
}

/// Placement of the unit quad produced by the line vertex stage.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LineGeometry {
    /// Unit quad to line-local space; line-local space is also the interpolated texcoord.
    pub(crate) quad_to_local: Affine,
    /// Line-local space to canvas pixels.
    pub(crate) local_to_canvas: Affine,
}

pub(crate) fn line_vertex_stage(u: &LineUniforms) -> LineGeometry {
    let [x0, y0, dx, dy] = u.pen_points.map(f64::from);
    let radius = f64::from(u.pen_size) * 0.5 + AA_MARGIN;
    let length = f64::from(u.line_length);

    let mut dir = Vec2::new(dx, dy);
    if dir.x.abs() < DEGENERATE_EPSILON && dir.y.abs() < DEGENERATE_EPSILON {
        dir = Vec2::new(DEGENERATE_EPSILON, DEGENERATE_EPSILON);
    }

    LineGeometry {
        quad_to_local: Affine::new([
            length + 2.0 * radius,
            0.0,
            0.0,
            2.0 * radius,
            -radius,
            -radius,
        ]),
        local_to_canvas: Affine::translate(Vec2::new(x0, y0)) * Affine::rotate(dir.atan2()),
    }
}

/// Stroke coverage at a line-local position: distance to the centerline with clamped projection.
pub(crate) fn line_fragment_stage(local: Point, u: &LineUniforms) -> f32 {
    let length = f64::from(u.line_length);
    let along = local.x - local.x.clamp(0.0, length);
    let distance = along.hypot(local.y);
    let coverage = 1.0 - (distance * 2.0 - (f64::from(u.pen_size) - 1.0));
    coverage.clamp(0.0, 1.0) as f32
}

/// Driver for the pen line program.
#[derive(Debug)]
pub struct LineShader {
    program: ProgramId,
    uniforms: ShaderUniformState,
}

impl LineShader {
    /// Link the line program. Failure is fatal for the pen pipeline.
    pub fn new(device: &mut Device) -> PenResult<Self> {
        Self::with_desc(device, LINE_PROGRAM)
    }

    pub(crate) fn with_desc(device: &mut Device, desc: ProgramDesc) -> PenResult<Self> {
        desc.require_attribute("a_position", ValueKind::Vec2)?;
        desc.require_attribute("a_texCoord", ValueKind::Vec2)?;
        desc.require_uniform("u_penPoints", ValueKind::Vec4)?;
        desc.require_uniform("u_penColor", ValueKind::Vec4)?;
        desc.require_uniform("u_penSize", ValueKind::Float)?;
        desc.require_uniform("u_lineLength", ValueKind::Float)?;
        let program = device.link(desc)?;
        Ok(Self {
            program,
            uniforms: ShaderUniformState::default(),
        })
    }

    /// Cached uniform values.
    pub fn uniform_state(&self) -> &ShaderUniformState {
        &self.uniforms
    }

    /// Drop cached uniform values.
    pub fn reset(&mut self) {
        self.uniforms.invalidate();
    }

    /// Make the line program active, invalidating the cache if it was not already.
    pub fn activate(&mut self, device: &mut Device) {
        if device.use_program(self.program) {
            self.uniforms.invalidate();
        }
    }

    /// Draw one capsule into `target` using the device's current blend and stencil state.
    pub fn draw(&mut self, device: &mut Device, target: &mut Surface, uniforms: LineUniforms) {
        self.activate(device);
        self.uniforms.apply(&uniforms, device);

        let state = device.state();
        let geom = line_vertex_stage(&uniforms);
        let quad_to_canvas = geom.local_to_canvas * geom.quad_to_local;
        let color = uniforms.pen_color;
        let (w, h) = (target.width(), target.height());
        rasterize_quad(w, h, quad_to_canvas, |px, py, uv| {
            let coverage = line_fragment_stage(geom.quad_to_local * uv, &uniforms);
            if coverage <= 0.0 {
                return;
            }
            let src = color.map(|c| c * coverage);
            target.shade(px, py, src, state.blend, state.stencil);
        });
    }
}

/// Silhouette fragment: `true` when the texel survives the alpha cutoff and optional color mask.
pub(crate) fn silhouette_fragment(texel: [u8; 4], mask: Option<[u8; 3]>) -> bool {
    if f32::from(texel[3]) / 255.0 < SILHOUETTE_MIN_ALPHA {
        return false;
    }
    match mask {
        None => true,
        Some(m) => (0..3).all(|i| {
            (f32::from(texel[i]) - f32::from(m[i])).abs() / 255.0 <= SILHOUETTE_MASK_TOLERANCE
        }),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/shader.rs"]
mod tests;
