use crate::collision::sampler::{AffineSampler, SamplerCache};
use crate::collision::{CollisionQuery, CollisionStrategy};
use crate::foundation::core::{Point, Rgb8};
use crate::foundation::math::{quantize_rgb, unit_to_u8};
use crate::pen::renderer::PenRenderer;

/// Options for [`CpuCollisionStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CpuCollisionOpts {
    /// Distance between sample points, in stage units.
    pub stride: f64,
    /// Minimum alpha (`[0, 1]`) for the sprite to count as covering a point.
    pub min_alpha: f32,
}

impl Default for CpuCollisionOpts {
    fn default() -> Self {
        Self {
            stride: 1.0,
            min_alpha: 0.1,
        }
    }
}

/// Point-sampling strategy over costume bitmaps and the pen snapshot.
#[derive(Debug, Default)]
pub struct CpuCollisionStrategy {
    opts: CpuCollisionOpts,
    samplers: SamplerCache,
}

impl CpuCollisionStrategy {
    /// Create a strategy with the given options.
    pub fn new(opts: CpuCollisionOpts) -> Self {
        Self {
            opts,
            samplers: SamplerCache::default(),
        }
    }

    /// Number of memoized costume samplers.
    pub fn cached_samplers(&self) -> usize {
        self.samplers.len()
    }
}

impl CollisionStrategy for CpuCollisionStrategy {
    #[tracing::instrument(skip_all, fields(sprite = query.sprite.id.0))]
    fn check(&mut self, query: &CollisionQuery<'_>, pen: &mut PenRenderer) -> Option<Point> {
        let Some(bounds) = query.bounds else {
            tracing::debug!("no query bounds");
            return None;
        };
        let Some(scene) = query.scene else {
            tracing::debug!("no scene");
            return None;
        };
        let stride = self.opts.stride;
        if !(stride.is_finite() && stride > 0.0) {
            tracing::debug!(stride, "invalid sample stride");
            return None;
        }

        let region = bounds.intersect(pen.mapping().stage().bounds());
        if !(region.width() > 0.0 && region.height() > 0.0) {
            tracing::debug!(?bounds, "query region is empty on stage");
            return None;
        }

        let live = query.candidates.iter().map(|c| c.sprite.id);
        self.samplers.retain_sprites(live.chain([query.sprite.id]));
        if !self.samplers.prepare(query.sprite) {
            tracing::debug!("sprite has no sampleable costume");
            return None;
        }
        let others = query.others_in_draw_order();
        // Top-most first for front-to-back compositing.
        let top_down: Vec<_> = others
            .into_iter()
            .rev()
            .filter(|s| self.samplers.prepare(s))
            .map(|s| s.id)
            .collect();

        let focal = self.samplers.get(query.sprite.id)?;
        let layers: Vec<&AffineSampler> = top_down
            .iter()
            .filter_map(|id| self.samplers.get(*id))
            .collect();

        let target = quantize_rgb(query.target.to_array());
        let mask = query.sprite_mask.map(|m| quantize_rgb(m.to_array()));
        let min_alpha = self.opts.min_alpha;
        let background = scene.background_rgb();

        let cols = (region.width() / stride).ceil() as u64;
        let rows = (region.height() / stride).ceil() as u64;
        for row in 0..rows {
            let y = region.y1 - (row as f64 + 0.5) * stride;
            if y <= region.y0 {
                break;
            }
            for col in 0..cols {
                let x = region.x0 + (col as f64 + 0.5) * stride;
                if x >= region.x1 {
                    break;
                }

                let texel = focal.sample(x, y);
                if f32::from(texel[3]) / 255.0 < min_alpha {
                    continue;
                }
                if let Some(m) = mask
                    && quantize_rgb([texel[0], texel[1], texel[2]]) != m
                {
                    continue;
                }

                let seen = composite_at(&layers, pen, background, x, y);
                if quantize_rgb(seen) == target {
                    return Some(Point::new(x, y));
                }
            }
        }
        None
    }
}

/// Visible color at a stage point with the queried sprite removed: sprites top-down, then the pen
/// layer, then the backdrop.
fn composite_at(
    layers: &[&AffineSampler],
    pen: &mut PenRenderer,
    background: Rgb8,
    x: f64,
    y: f64,
) -> [u8; 3] {
    let mut rgb = [0.0f32; 3];
    let mut blend_alpha = 1.0f32;

    for layer in layers {
        if blend_alpha <= 0.0 {
            break;
        }
        let t = layer.sample(x, y);
        if t[3] == 0 {
            continue;
        }
        let a = f32::from(t[3]) / 255.0;
        for i in 0..3 {
            rgb[i] += f32::from(t[i]) / 255.0 * a * blend_alpha;
        }
        blend_alpha *= 1.0 - a;
    }

    if blend_alpha > 0.0 {
        let p = pen.sample_color(x, y);
        for i in 0..3 {
            rgb[i] += f32::from(p[i]) / 255.0 * blend_alpha;
        }
        blend_alpha *= 1.0 - f32::from(p[3]) / 255.0;
    }

    if blend_alpha > 0.0 {
        let bg = background.to_array();
        for i in 0..3 {
            rgb[i] += f32::from(bg[i]) / 255.0 * blend_alpha;
        }
    }

    rgb.map(unit_to_u8)
}

#[cfg(test)]
#[path = "../../tests/unit/collision/cpu.rs"]
mod tests;
