use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::foundation::core::Affine;
use crate::render::costume::{Costume, SpriteId, SpriteView};

/// Stage-point sampler for one sprite's costume.
///
/// Holds the inverse of the costume-to-stage affine as raw coefficients so sampling is a handful
/// of multiplies and one indexed read.
#[derive(Clone, Debug)]
pub(crate) struct AffineSampler {
    costume: Rc<Costume>,
    forward: [f64; 6],
    inverse: [f64; 6],
}

impl AffineSampler {
    /// `None` for non-invertible transforms.
    pub(crate) fn new(costume: Rc<Costume>, transform: Affine) -> Option<Self> {
        if transform.determinant().abs() < 1e-12 {
            return None;
        }
        Some(Self {
            costume,
            forward: transform.as_coeffs(),
            inverse: transform.inverse().as_coeffs(),
        })
    }

    fn matches(&self, costume: &Rc<Costume>, transform: Affine) -> bool {
        Rc::ptr_eq(&self.costume, costume) && self.forward == transform.as_coeffs()
    }

    /// Straight-alpha texel under a stage point; transparent outside the costume.
    #[inline]
    pub(crate) fn sample(&self, x: f64, y: f64) -> [u8; 4] {
        let [a, b, c, d, e, f] = self.inverse;
        let u = a * x + c * y + e;
        let v = b * x + d * y + f;
        if !(u >= 0.0 && v >= 0.0) {
            return [0, 0, 0, 0];
        }
        self.costume.texel(u as u32, v as u32)
    }
}

/// Samplers memoized per sprite, rebuilt only when the costume bitmap or transform changes.
///
/// Entries for sprites that leave the query set are dropped by [`SamplerCache::retain_sprites`],
/// so the cache never outlives the bitmaps of departed clones.
#[derive(Debug, Default)]
pub(crate) struct SamplerCache {
    entries: HashMap<SpriteId, AffineSampler>,
}

impl SamplerCache {
    /// Make sure a current sampler exists for `sprite`. Returns `false` when it cannot be built.
    pub(crate) fn prepare(&mut self, sprite: &SpriteView) -> bool {
        let Some(costume) = sprite.costume.as_ref() else {
            self.entries.remove(&sprite.id);
            return false;
        };
        if let Some(existing) = self.entries.get(&sprite.id)
            && existing.matches(costume, sprite.transform)
        {
            return true;
        }
        match AffineSampler::new(Rc::clone(costume), sprite.transform) {
            Some(s) => {
                self.entries.insert(sprite.id, s);
                true
            }
            None => {
                self.entries.remove(&sprite.id);
                false
            }
        }
    }

    /// Drop every sampler whose sprite is not in `live`.
    pub(crate) fn retain_sprites(&mut self, live: impl IntoIterator<Item = SpriteId>) {
        let live: HashSet<SpriteId> = live.into_iter().collect();
        self.entries.retain(|id, _| live.contains(id));
    }

    pub(crate) fn get(&self, id: SpriteId) -> Option<&AffineSampler> {
        self.entries.get(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/collision/sampler.rs"]
mod tests;
