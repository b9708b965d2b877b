//! Stagepen is the persistent pen layer of a 2D sprite stage, plus touching-color collision
//! checks against the composited stage.
//!
//! - Track per-sprite pen attributes with [`PenState`]
//! - Queue strokes, dots and stamps into a [`PenRenderer`] and commit them once per frame
//! - Answer "is this sprite touching that color?" with a [`CollisionStrategy`]: the
//!   point-sampling [`CpuCollisionStrategy`] or the stencil-and-readback
//!   [`GpuCollisionStrategy`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod collision;
pub(crate) mod pen;
pub(crate) mod render;
/// Replayable pen scripts, used by the `stagepen` binary.
pub mod script;

pub use crate::foundation::core::{Affine, Point, Rect, Rgb8, StageMapping, StageSize, Vec2};
pub use crate::foundation::error::{PenError, PenResult};

pub use crate::collision::{
    Candidate, CollisionQuery, CollisionStrategy, CpuCollisionOpts, CpuCollisionStrategy,
    GpuCollisionOpts, GpuCollisionStrategy, Scene, SolidBackdrop, broad_phase,
};
pub use crate::pen::color::{hsv_to_rgb, mix_rgb, rgb_to_hsv, scratch_color_to_rgba};
pub use crate::pen::path::{PathNode, StampFn};
pub use crate::pen::renderer::{PenRenderer, PenRendererOpts, PenStats, RENDER_QUALITY_ENV};
pub use crate::pen::state::{PenProperties, PenState};
pub use crate::render::costume::{Costume, CostumeId, SpriteId, SpriteView};
pub use crate::render::device::{
    Device, DeviceStats, PipelineState, ProgramDesc, ProgramId, StateScope, TargetKind, ValueKind,
};
pub use crate::render::painter::Painter;
pub use crate::render::shader::{
    AA_MARGIN, LINE_PROGRAM, LineShader, LineUniforms, SILHOUETTE_MASK_TOLERANCE,
    SILHOUETTE_MIN_ALPHA, ShaderUniformState, UnitQuad,
};
pub use crate::render::surface::{BlendMode, StencilMode, Surface};
