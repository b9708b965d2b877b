use crate::foundation::core::{Affine, Point};
use crate::foundation::math::unit_to_u8;

/// How a fragment color combines with the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    /// `(ONE, ONE_MINUS_SRC_ALPHA)`: the fragment color is already premultiplied.
    Premultiplied,
    /// `(SRC_ALPHA, ONE_MINUS_SRC_ALPHA)`: the fragment color is straight alpha.
    Alpha,
}

/// Stencil plane behavior for a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StencilMode {
    /// Stencil ignored.
    Disabled,
    /// Covered fragments set the stencil to 1; color writes are masked off.
    Write,
    /// Only fragments whose stencil value equals 1 are blended.
    TestEqualOne,
}

/// Premultiplied RGBA8 raster, row-major, with a lazily allocated stencil plane.
#[derive(Clone, Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
    stencil: Vec<u8>,
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
            stencil: Vec::new(),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at `(x, y)`; out-of-range reads return transparent black.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let i = self.index(x, y) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Stencil value at `(x, y)`, 0 when no stencil has been written.
    pub fn stencil(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height || self.stencil.is_empty() {
            return 0;
        }
        self.stencil[self.index(x, y)]
    }

    /// Fill every pixel with a premultiplied color.
    pub fn clear(&mut self, premul: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
    }

    /// Reset the stencil plane to 0, allocating it on first use.
    pub fn clear_stencil(&mut self) {
        let len = (self.width as usize) * (self.height as usize);
        if self.stencil.len() != len {
            self.stencil = vec![0u8; len];
        } else {
            self.stencil.fill(0);
        }
    }

    /// Copy a clamped region into `out` as tightly packed RGBA8 rows.
    ///
    /// Returns the clamped `(x, y, w, h)` actually read; `w == 0 || h == 0` means nothing was
    /// read.
    pub fn read_region(
        &self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        out: &mut Vec<u8>,
    ) -> (u32, u32, u32, u32) {
        out.clear();
        let x0 = x.min(self.width);
        let y0 = y.min(self.height);
        let x1 = x.saturating_add(w).min(self.width);
        let y1 = y.saturating_add(h).min(self.height);
        let (w, h) = (x1 - x0, y1 - y0);
        if w == 0 || h == 0 {
            return (x0, y0, 0, 0);
        }
        out.reserve((w as usize) * (h as usize) * 4);
        for row in y0..y1 {
            let start = self.index(x0, row) * 4;
            let end = start + (w as usize) * 4;
            out.extend_from_slice(&self.data[start..end]);
        }
        (x0, y0, w, h)
    }

    /// Run one fragment through stencil and blend stages.
    ///
    /// `src` is in `[0, 1]`; premultiplied or straight depending on `blend`.
    pub(crate) fn shade(
        &mut self,
        x: u32,
        y: u32,
        src: [f32; 4],
        blend: BlendMode,
        stencil: StencilMode,
    ) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        match stencil {
            StencilMode::Disabled => {}
            StencilMode::Write => {
                if self.stencil.is_empty() {
                    self.clear_stencil();
                }
                self.stencil[idx] = 1;
                return;
            }
            StencilMode::TestEqualOne => {
                if self.stencil.get(idx).copied() != Some(1) {
                    return;
                }
            }
        }

        let [r, g, b, a] = match blend {
            BlendMode::Premultiplied => src,
            BlendMode::Alpha => [src[0] * src[3], src[1] * src[3], src[2] * src[3], src[3]],
        };
        if a <= 0.0 && r <= 0.0 && g <= 0.0 && b <= 0.0 {
            return;
        }

        let inv = 1.0 - a.clamp(0.0, 1.0);
        let px = &mut self.data[idx * 4..idx * 4 + 4];
        for (c, s) in px.iter_mut().zip([r, g, b, a]) {
            let d = f32::from(*c) / 255.0;
            *c = unit_to_u8(s + d * inv);
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

/// Rasterize the image of the unit quad under `quad_to_target`.
///
/// For every target pixel whose center lands inside the transformed quad, `fragment` receives the
/// pixel coordinates and the interpolated unit-quad coordinate `(u, v)`. Degenerate transforms
/// draw nothing.
pub(crate) fn rasterize_quad(
    width: u32,
    height: u32,
    quad_to_target: Affine,
    mut fragment: impl FnMut(u32, u32, Point),
) {
    if quad_to_target.determinant().abs() < 1e-12 {
        return;
    }
    let inv = quad_to_target.inverse();

    let corners = [
        quad_to_target * Point::new(0.0, 0.0),
        quad_to_target * Point::new(1.0, 0.0),
        quad_to_target * Point::new(1.0, 1.0),
        quad_to_target * Point::new(0.0, 1.0),
    ];
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for c in corners {
        min_x = min_x.min(c.x);
        min_y = min_y.min(c.y);
        max_x = max_x.max(c.x);
        max_y = max_y.max(c.y);
    }
    if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
        return;
    }

    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.ceil().max(0.0) as u32).min(width);
    let y1 = (max_y.ceil().max(0.0) as u32).min(height);

    for py in y0..y1 {
        for px in x0..x1 {
            let uv = inv * Point::new(f64::from(px) + 0.5, f64::from(py) + 0.5);
            if (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y) {
                fragment(px, py, uv);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
