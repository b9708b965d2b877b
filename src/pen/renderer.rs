//! Persistent pen canvas.
//!
//! Strokes are queued as [`PathNode`]s and committed once per frame by [`PenRenderer::flush`].
//! The canvas is never redrawn from history; it only accumulates. A CPU-readable snapshot of it
//! is kept lazily for pixel sampling.

use crate::foundation::core::{Affine, Point, StageMapping, StageSize};
use crate::foundation::error::PenResult;
use crate::pen::path::{PathNode, StampFn};
use crate::render::device::{Device, ProgramDesc, ProgramId, TargetKind};
use crate::render::painter::Painter;
use crate::render::shader::{LINE_PROGRAM, LineShader, LineUniforms, SPRITE_PROGRAM};
use crate::render::surface::{BlendMode, StencilMode, Surface};

/// Environment variable overriding [`PenRendererOpts::render_quality`].
pub const RENDER_QUALITY_ENV: &str = "STAGEPEN_RENDER_QUALITY";

/// Options for [`PenRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PenRendererOpts {
    /// Stage dimensions in stage units.
    pub stage: StageSize,
    /// Canvas pixels per stage unit.
    pub render_quality: f64,
}

impl Default for PenRendererOpts {
    fn default() -> Self {
        Self {
            stage: StageSize::default(),
            render_quality: 1.0,
        }
    }
}

impl PenRendererOpts {
    /// Return options with a different render quality.
    pub fn with_render_quality(mut self, quality: f64) -> Self {
        self.render_quality = quality;
        self
    }

    /// Return options with a different stage size.
    pub fn with_stage(mut self, stage: StageSize) -> Self {
        self.stage = stage;
        self
    }

    /// Apply `STAGEPEN_RENDER_QUALITY` when it holds a positive finite number.
    pub fn with_env_overrides(self) -> Self {
        self.with_quality_override(std::env::var(RENDER_QUALITY_ENV).ok().as_deref())
    }

    fn with_quality_override(mut self, raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().parse::<f64>()) {
            Some(Ok(q)) if q.is_finite() && q > 0.0 => self.render_quality = q,
            Some(_) => tracing::debug!(?raw, "ignoring invalid render quality override"),
            None => {}
        }
        self
    }
}

/// Counters describing renderer activity.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PenStats {
    /// Non-empty flushes.
    pub flushes: u64,
    /// Nodes replayed into the canvas.
    pub nodes_committed: u64,
    /// Lines drawn.
    pub lines_drawn: u64,
    /// Points drawn.
    pub points_drawn: u64,
    /// Stamps drawn.
    pub stamps_drawn: u64,
    /// Canvas clears.
    pub clears: u64,
    /// Snapshot captures.
    pub snapshot_refreshes: u64,
}

/// CPU copy of the canvas, same dimensions, premultiplied RGBA8.
struct Snapshot {
    pixels: Vec<u8>,
}

/// Owner of the pen canvas and its queue of pending strokes.
pub struct PenRenderer {
    mapping: StageMapping,
    device: Device,
    line_shader: LineShader,
    sprite_program: ProgramId,
    canvas: Surface,
    queue: Vec<PathNode>,
    dirty: bool,
    snapshot: Option<Snapshot>,
    stats: PenStats,
}

impl std::fmt::Debug for PenRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PenRenderer")
            .field("mapping", &self.mapping)
            .field("queued", &self.queue.len())
            .field("dirty", &self.dirty)
            .field("has_snapshot", &self.snapshot.is_some())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl PenRenderer {
    /// Create a renderer with a transparent canvas.
    ///
    /// Fails when the options are invalid or the line program cannot be linked.
    pub fn new(opts: PenRendererOpts) -> PenResult<Self> {
        Self::with_line_program(opts, LINE_PROGRAM)
    }

    pub(crate) fn with_line_program(opts: PenRendererOpts, line: ProgramDesc) -> PenResult<Self> {
        let mapping = StageMapping::new(opts.stage, opts.render_quality)?;
        let mut device = Device::new();
        let line_shader = LineShader::with_desc(&mut device, line)?;
        let sprite_program = device.link(SPRITE_PROGRAM)?;
        Ok(Self {
            mapping,
            device,
            line_shader,
            sprite_program,
            canvas: Surface::new(mapping.canvas_width(), mapping.canvas_height()),
            queue: Vec::new(),
            dirty: false,
            snapshot: None,
            stats: PenStats::default(),
        })
    }

    /// Stage/canvas mapping.
    pub fn mapping(&self) -> StageMapping {
        self.mapping
    }

    /// The persistent canvas.
    pub fn canvas(&self) -> &Surface {
        &self.canvas
    }

    /// The graphics device driving the canvas.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Line program driver.
    pub fn line_shader(&self) -> &LineShader {
        &self.line_shader
    }

    /// Nodes queued since the last flush.
    pub fn queued(&self) -> &[PathNode] {
        &self.queue
    }

    /// `true` when the canvas changed since the snapshot was last captured.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// `true` while a CPU snapshot is held.
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Activity counters.
    pub fn stats(&self) -> PenStats {
        self.stats.clone()
    }

    pub(crate) fn sprite_program(&self) -> ProgramId {
        self.sprite_program
    }

    pub(crate) fn device_and_canvas(&mut self) -> (&mut Device, &Surface) {
        (&mut self.device, &self.canvas)
    }

    /// Stage coordinates to canvas pixels.
    pub fn scratch_to_canvas(&self, x: f64, y: f64) -> Point {
        self.mapping.stage_to_canvas(x, y)
    }

    /// Queue a stroked segment. Zero-length segments are dropped.
    pub fn queue_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, size: f64, rgba: [f32; 4]) {
        if x0 == x1 && y0 == y1 {
            return;
        }
        if ![x0, y0, x1, y1, size].iter().all(|v| v.is_finite()) {
            tracing::debug!(x0, y0, x1, y1, size, "dropping non-finite pen line");
            return;
        }
        let off = alignment_offset(size);
        self.queue.push(PathNode::Line {
            x0: x0 + off,
            y0: y0 + off,
            x1: x1 + off,
            y1: y1 + off,
            size,
            rgba,
        });
    }

    /// Queue a dot.
    pub fn queue_point(&mut self, x: f64, y: f64, size: f64, rgba: [f32; 4]) {
        if ![x, y, size].iter().all(|v| v.is_finite()) {
            tracing::debug!(x, y, size, "dropping non-finite pen point");
            return;
        }
        let off = alignment_offset(size);
        self.queue.push(PathNode::Point {
            x: x + off,
            y: y + off,
            size,
            rgba,
        });
    }

    /// Queue a stamp drawn with `draw` under `transform` at flush time.
    pub fn queue_stamp(&mut self, draw: StampFn, transform: Affine) {
        self.queue.push(PathNode::Stamp { draw, transform });
    }

    /// Queue a canvas wipe, discarding everything queued before it.
    pub fn queue_clear(&mut self) {
        self.queue.clear();
        self.queue.push(PathNode::Clear);
    }

    /// Commit queued nodes into the canvas, in order.
    #[tracing::instrument(skip_all)]
    pub fn flush(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let nodes = std::mem::take(&mut self.queue);
        let mapping = self.mapping;
        let q = mapping.quality();

        {
            let mut gl = self.device.scope();
            gl.bind_target(TargetKind::PenCanvas);
            gl.set_blend(BlendMode::Premultiplied);
            gl.set_stencil(StencilMode::Disabled);

            for node in &nodes {
                match node {
                    PathNode::Clear => {
                        self.canvas.clear([0, 0, 0, 0]);
                        self.line_shader.reset();
                        self.stats.clears += 1;
                    }
                    PathNode::Line {
                        x0,
                        y0,
                        x1,
                        y1,
                        size,
                        rgba,
                    } => {
                        let a = mapping.stage_to_canvas(*x0, *y0);
                        let b = mapping.stage_to_canvas(*x1, *y1);
                        let uniforms = line_uniforms(a, b, *size * q, *rgba);
                        self.line_shader.draw(&mut gl, &mut self.canvas, uniforms);
                        self.stats.lines_drawn += 1;
                    }
                    PathNode::Point { x, y, size, rgba } => {
                        let a = mapping.stage_to_canvas(*x, *y);
                        let uniforms = line_uniforms(a, a, *size * q, *rgba);
                        self.line_shader.draw(&mut gl, &mut self.canvas, uniforms);
                        self.stats.points_drawn += 1;
                    }
                    PathNode::Stamp { draw, transform } => {
                        gl.set_blend(BlendMode::Alpha);
                        {
                            let mut painter =
                                Painter::new(&mut gl, &mut self.canvas, mapping, self.sprite_program);
                            draw(&mut painter, *transform);
                        }
                        gl.set_blend(BlendMode::Premultiplied);
                        self.stats.stamps_drawn += 1;
                    }
                }
            }
        }

        self.stats.flushes += 1;
        self.stats.nodes_committed += nodes.len() as u64;
        tracing::trace!(nodes = nodes.len(), "pen flush committed");
        self.invalidate();
    }

    /// Color of the canvas pixel under a stage point, premultiplied, 0..=255.
    ///
    /// Points outside the canvas read as transparent black.
    pub fn sample_color(&mut self, x: f64, y: f64) -> [u8; 4] {
        let Some((px, py)) = self.mapping.canvas_pixel(x, y) else {
            return [0, 0, 0, 0];
        };
        if self.dirty || self.snapshot.is_none() {
            self.refresh();
        }
        let Some(snapshot) = self.snapshot.as_ref() else {
            return [0, 0, 0, 0];
        };
        let i = ((py as usize) * (self.canvas.width() as usize) + (px as usize)) * 4;
        [
            snapshot.pixels[i],
            snapshot.pixels[i + 1],
            snapshot.pixels[i + 2],
            snapshot.pixels[i + 3],
        ]
    }

    /// Drop the CPU snapshot. The next sample captures a fresh one.
    pub fn release_cached_data(&mut self) {
        self.snapshot = None;
    }

    /// Mark the snapshot stale.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Replace the snapshot with a fresh copy of the canvas.
    pub fn refresh(&mut self) {
        self.snapshot = None;
        let mut pixels = Vec::new();
        self.canvas.read_region(
            0,
            0,
            self.canvas.width(),
            self.canvas.height(),
            &mut pixels,
        );
        self.snapshot = Some(Snapshot { pixels });
        self.dirty = false;
        self.stats.snapshot_refreshes += 1;
    }
}

/// Sizes 1 and 3 are nudged half a stage unit to land strokes on pixel centers.
fn alignment_offset(size: f64) -> f64 {
    if size == 1.0 || size == 3.0 { 0.5 } else { 0.0 }
}

fn line_uniforms(a: Point, b: Point, pen_size: f64, rgba: [f32; 4]) -> LineUniforms {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let alpha = rgba[3].clamp(0.0, 1.0);
    let premul = [
        rgba[0].clamp(0.0, 1.0) * alpha,
        rgba[1].clamp(0.0, 1.0) * alpha,
        rgba[2].clamp(0.0, 1.0) * alpha,
        alpha,
    ];
    LineUniforms {
        pen_points: [a.x as f32, a.y as f32, dx as f32, dy as f32],
        pen_color: premul,
        pen_size: pen_size as f32,
        line_length: dx.hypot(dy) as f32,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pen/renderer.rs"]
mod tests;
