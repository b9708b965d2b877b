use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context as _;

use crate::collision::{
    CollisionQuery, CollisionStrategy, CpuCollisionOpts, CpuCollisionStrategy, GpuCollisionOpts,
    GpuCollisionStrategy, SolidBackdrop, broad_phase,
};
use crate::foundation::core::{Affine, Point, Rgb8};
use crate::foundation::error::{PenError, PenResult};
use crate::pen::path::StampFn;
use crate::pen::renderer::{PenRenderer, PenRendererOpts, PenStats};
use crate::pen::state::PenState;
use crate::render::costume::{Costume, CostumeId, SpriteId, SpriteView};
use crate::render::painter::Painter;

/// JSON-facing description of a pen session: costumes, sprites and an ordered list of steps.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PenScript {
    /// Renderer options.
    #[serde(default)]
    pub renderer: PenRendererOpts,
    /// Backdrop color as `#RRGGBB`.
    #[serde(default = "default_background")]
    pub background: String,
    /// Costumes by name.
    #[serde(default)]
    pub costumes: BTreeMap<String, CostumeDef>,
    /// Sprites, in creation order.
    #[serde(default)]
    pub sprites: Vec<SpriteDef>,
    /// Steps replayed in order.
    pub steps: Vec<Step>,
}

fn default_background() -> String {
    "#ffffff".to_string()
}

/// Costume source.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum CostumeDef {
    /// Single-color rectangle.
    Solid {
        /// Width in costume pixels.
        width: u32,
        /// Height in costume pixels.
        height: u32,
        /// `#RRGGBB`.
        color: String,
        /// Straight alpha.
        #[serde(default = "opaque")]
        alpha: u8,
    },
    /// Bitmap decoded from disk, relative to the script's directory.
    Image {
        /// Image path.
        path: PathBuf,
        /// Rotation center in costume pixels; the bitmap center when absent.
        #[serde(default)]
        rotation_center: Option<[f64; 2]>,
    },
}

fn opaque() -> u8 {
    255
}

/// Initial sprite placement.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpriteDef {
    /// Unique sprite name, referenced by steps.
    pub name: String,
    /// Costume name.
    pub costume: String,
    /// Stage x.
    #[serde(default)]
    pub x: f64,
    /// Stage y.
    #[serde(default)]
    pub y: f64,
    /// Uniform scale.
    #[serde(default = "unit_scale")]
    pub scale: f64,
    /// Direction in degrees; 90 points right.
    #[serde(default = "default_direction")]
    pub direction: f64,
    /// Draw order.
    #[serde(default)]
    pub layer: i32,
    /// Visibility.
    #[serde(default = "visible")]
    pub visible: bool,
}

fn unit_scale() -> f64 {
    1.0
}

fn default_direction() -> f64 {
    90.0
}

fn visible() -> bool {
    true
}

/// One replayed operation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Lower the pen and mark a dot at the sprite's position.
    PenDown {
        /// Sprite name.
        sprite: String,
    },
    /// Raise the pen.
    PenUp {
        /// Sprite name.
        sprite: String,
    },
    /// Move the sprite, drawing when its pen is down.
    MoveTo {
        /// Sprite name.
        sprite: String,
        /// Stage x.
        x: f64,
        /// Stage y.
        y: f64,
    },
    /// Set the pen diameter.
    SetPenSize {
        /// Sprite name.
        sprite: String,
        /// Diameter in stage units.
        size: f64,
    },
    /// Set the pen color from `#RRGGBB`.
    SetPenColor {
        /// Sprite name.
        sprite: String,
        /// `#RRGGBB`.
        color: String,
    },
    /// Set the pen hue (0..100).
    SetPenHue {
        /// Sprite name.
        sprite: String,
        /// Hue.
        hue: f64,
    },
    /// Set the legacy pen shade (0..200).
    SetPenShade {
        /// Sprite name.
        sprite: String,
        /// Shade.
        shade: f64,
    },
    /// Set pen transparency (0..100).
    SetPenTransparency {
        /// Sprite name.
        sprite: String,
        /// Transparency.
        transparency: f64,
    },
    /// Stamp the sprite's costume onto the pen layer.
    Stamp {
        /// Sprite name.
        sprite: String,
    },
    /// Wipe the pen layer.
    Clear,
    /// Commit queued pen nodes.
    Flush,
    /// Ask whether a sprite is touching a color.
    TouchingColor {
        /// Sprite name.
        sprite: String,
        /// `#RRGGBB` color to look for.
        color: String,
        /// Restrict to the sprite's pixels of this `#RRGGBB` color.
        #[serde(default)]
        mask: Option<String>,
    },
}

/// Which collision strategies answer probes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyChoice {
    /// Point sampling only.
    Cpu,
    /// Stencil and read-back only.
    Gpu,
    /// Both, side by side.
    Both,
}

impl StrategyChoice {
    fn cpu(self) -> bool {
        matches!(self, Self::Cpu | Self::Both)
    }

    fn gpu(self) -> bool {
        matches!(self, Self::Gpu | Self::Both)
    }
}

/// Answer of one strategy to one probe.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProbeHit {
    /// Whether the color was found.
    pub touching: bool,
    /// Stage x of the first match.
    pub x: Option<f64>,
    /// Stage y of the first match.
    pub y: Option<f64>,
}

impl From<Option<Point>> for ProbeHit {
    fn from(hit: Option<Point>) -> Self {
        Self {
            touching: hit.is_some(),
            x: hit.map(|p| p.x),
            y: hit.map(|p| p.y),
        }
    }
}

/// Result of a `touching_color` step.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProbeOutcome {
    /// Index of the step in the script.
    pub step: usize,
    /// Probing sprite.
    pub sprite: String,
    /// Probed color as given.
    pub color: String,
    /// CPU strategy answer, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<ProbeHit>,
    /// GPU strategy answer, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu: Option<ProbeHit>,
}

/// Everything a replay produced.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ReplayReport {
    /// Probe results in step order.
    pub probes: Vec<ProbeOutcome>,
    /// Renderer counters at the end of the replay.
    pub pen: PenStats,
}

struct SpriteRuntime {
    name: String,
    costume: Rc<Costume>,
    position: Point,
    scale: f64,
    direction: f64,
    layer: i32,
    visible: bool,
    pen: PenState,
}

impl SpriteRuntime {
    fn view(&self, id: SpriteId) -> SpriteView {
        let transform = self.costume.placement(
            self.position.x,
            self.position.y,
            self.scale,
            self.direction,
        );
        let mut view = SpriteView::new(id, Rc::clone(&self.costume), transform, self.layer);
        view.visible = self.visible;
        view
    }
}

/// Replays a [`PenScript`] against a fresh renderer.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    script: PenScript,
    base_dir: PathBuf,
}

impl ScriptRunner {
    /// Wrap a parsed script; image costumes resolve relative to `base_dir`.
    pub fn new(script: PenScript, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            script,
            base_dir: base_dir.into(),
        }
    }

    /// Parse a script from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R, base_dir: impl Into<PathBuf>) -> PenResult<Self> {
        let script: PenScript = serde_json::from_reader(r)
            .map_err(|e| PenError::serde(format!("parse pen script JSON: {e}")))?;
        Ok(Self::new(script, base_dir))
    }

    /// Parse a script file; its directory becomes the base directory.
    pub fn from_path(path: impl AsRef<Path>) -> PenResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PenError::validation(format!("open pen script '{}': {e}", path.display()))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        Self::from_reader(BufReader::new(f), base)
    }

    /// The parsed script.
    pub fn script(&self) -> &PenScript {
        &self.script
    }

    /// Return a runner whose renderer uses `opts` instead of the script's own options.
    pub fn with_renderer_opts(mut self, opts: PenRendererOpts) -> Self {
        self.script.renderer = opts;
        self
    }

    /// Replay every step against a fresh renderer.
    #[tracing::instrument(skip_all)]
    pub fn run(&self, strategy: StrategyChoice) -> PenResult<ReplayReport> {
        let mut renderer = PenRenderer::new(self.script.renderer)?;
        let scene = SolidBackdrop {
            rgb: Rgb8::from_hex(&self.script.background)?,
        };
        let mut sprites = self.load_sprites()?;

        let mut cpu = strategy
            .cpu()
            .then(|| CpuCollisionStrategy::new(CpuCollisionOpts::default()));
        let mut gpu = if strategy.gpu() {
            Some(GpuCollisionStrategy::new(
                &mut renderer,
                GpuCollisionOpts::default(),
            )?)
        } else {
            None
        };

        let mut probes = Vec::new();
        for (index, step) in self.script.steps.iter().enumerate() {
            match step {
                Step::PenDown { sprite } => {
                    let s = find_mut(&mut sprites, sprite)?;
                    let p = s.position;
                    s.pen.set_down(true, p.x, p.y);
                    renderer.queue_point(p.x, p.y, s.pen.properties().size, s.pen.pen_color_rgba());
                }
                Step::PenUp { sprite } => {
                    let s = find_mut(&mut sprites, sprite)?;
                    let p = s.position;
                    s.pen.set_down(false, p.x, p.y);
                }
                Step::MoveTo { sprite, x, y } => {
                    let s = find_mut(&mut sprites, sprite)?;
                    s.position = Point::new(*x, *y);
                    s.pen.update_position(*x, *y, &mut renderer);
                }
                Step::SetPenSize { sprite, size } => {
                    find_mut(&mut sprites, sprite)?.pen.set_size(*size);
                }
                Step::SetPenColor { sprite, color } => {
                    let rgb = Rgb8::from_hex(color)?;
                    find_mut(&mut sprites, sprite)?.pen.set_color_from_rgb(rgb);
                }
                Step::SetPenHue { sprite, hue } => {
                    find_mut(&mut sprites, sprite)?.pen.set_hue(*hue);
                }
                Step::SetPenShade { sprite, shade } => {
                    find_mut(&mut sprites, sprite)?.pen.set_shade(*shade);
                }
                Step::SetPenTransparency {
                    sprite,
                    transparency,
                } => {
                    find_mut(&mut sprites, sprite)?
                        .pen
                        .set_transparency(*transparency);
                }
                Step::Stamp { sprite } => {
                    let idx = find_index(&sprites, sprite)?;
                    let view = sprites[idx].view(SpriteId(idx as u64));
                    let costume = Rc::clone(&sprites[idx].costume);
                    let draw: StampFn =
                        Rc::new(move |painter: &mut Painter<'_>, transform: Affine| {
                            painter.draw_costume(&costume, transform);
                        });
                    renderer.queue_stamp(draw, view.transform);
                }
                Step::Clear => renderer.queue_clear(),
                Step::Flush => renderer.flush(),
                Step::TouchingColor {
                    sprite,
                    color,
                    mask,
                } => {
                    let idx = find_index(&sprites, sprite)?;
                    let target = Rgb8::from_hex(color)?;
                    let mask = mask.as_deref().map(Rgb8::from_hex).transpose()?;
                    let views: Vec<SpriteView> = sprites
                        .iter()
                        .enumerate()
                        .map(|(i, s)| s.view(SpriteId(i as u64)))
                        .collect();
                    let focal = &views[idx];

                    let (bounds, candidates) = match broad_phase(focal, &views) {
                        Some((b, c)) => (Some(b), c),
                        None => (None, Vec::new()),
                    };
                    let mut query = CollisionQuery::new(focal, target)
                        .with_candidates(&candidates)
                        .with_scene(&scene);
                    if let Some(b) = bounds {
                        query = query.with_bounds(b);
                    }
                    if let Some(m) = mask {
                        query = query.with_sprite_mask(m);
                    }

                    let cpu_hit = cpu
                        .as_mut()
                        .map(|s| ProbeHit::from(s.check(&query, &mut renderer)));
                    let gpu_hit = gpu
                        .as_mut()
                        .map(|s| ProbeHit::from(s.check(&query, &mut renderer)));
                    tracing::debug!(step = index, sprite = %sprite, ?cpu_hit, ?gpu_hit, "probe");
                    probes.push(ProbeOutcome {
                        step: index,
                        sprite: sprite.clone(),
                        color: color.clone(),
                        cpu: cpu_hit,
                        gpu: gpu_hit,
                    });
                }
            }
        }

        Ok(ReplayReport {
            probes,
            pen: renderer.stats(),
        })
    }

    fn load_sprites(&self) -> PenResult<Vec<SpriteRuntime>> {
        let mut costumes = BTreeMap::new();
        for (i, (name, def)) in self.script.costumes.iter().enumerate() {
            let id = CostumeId(i as u64);
            let costume = match def {
                CostumeDef::Solid {
                    width,
                    height,
                    color,
                    alpha,
                } => {
                    let [r, g, b] = Rgb8::from_hex(color)?.to_array();
                    Costume::solid(id, *width, *height, [r, g, b, *alpha])
                }
                CostumeDef::Image {
                    path,
                    rotation_center,
                } => {
                    let full = self.base_dir.join(path);
                    let img = image::open(&full)
                        .with_context(|| format!("decode costume image '{}'", full.display()))?;
                    Costume::from_rgba_image(
                        id,
                        img.to_rgba8(),
                        rotation_center.map(|[x, y]| Point::new(x, y)),
                    )
                }
            };
            costumes.insert(name.as_str(), Rc::new(costume));
        }

        let mut sprites: Vec<SpriteRuntime> = Vec::with_capacity(self.script.sprites.len());
        for def in &self.script.sprites {
            if sprites.iter().any(|s| s.name == def.name) {
                return Err(PenError::validation(format!(
                    "duplicate sprite name '{}'",
                    def.name
                )));
            }
            let costume = costumes.get(def.costume.as_str()).ok_or_else(|| {
                PenError::validation(format!(
                    "sprite '{}' references unknown costume '{}'",
                    def.name, def.costume
                ))
            })?;
            let mut pen = PenState::new();
            pen.set_down(false, def.x, def.y);
            sprites.push(SpriteRuntime {
                name: def.name.clone(),
                costume: Rc::clone(costume),
                position: Point::new(def.x, def.y),
                scale: def.scale,
                direction: def.direction,
                layer: def.layer,
                visible: def.visible,
                pen,
            });
        }
        Ok(sprites)
    }
}

fn find_index(sprites: &[SpriteRuntime], name: &str) -> PenResult<usize> {
    sprites
        .iter()
        .position(|s| s.name == name)
        .ok_or_else(|| PenError::validation(format!("unknown sprite '{name}'")))
}

fn find_mut<'a>(sprites: &'a mut [SpriteRuntime], name: &str) -> PenResult<&'a mut SpriteRuntime> {
    let idx = find_index(sprites, name)?;
    Ok(&mut sprites[idx])
}

#[cfg(test)]
#[path = "../tests/unit/script.rs"]
mod tests;
