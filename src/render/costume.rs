use std::rc::Rc;

use crate::foundation::core::{Affine, Point, Rect, Vec2};
use crate::foundation::error::{PenError, PenResult};

/// Identity of a costume bitmap.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct CostumeId(pub u64);

/// Identity of a sprite or clone.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SpriteId(pub u64);

/// Straight-alpha RGBA8 costume bitmap with a rotation center in costume pixels.
#[derive(Clone, Debug)]
pub struct Costume {
    id: CostumeId,
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    rotation_center: Point,
}

impl Costume {
    /// Wrap tightly packed straight-alpha RGBA8 pixels.
    pub fn from_rgba(
        id: CostumeId,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        rotation_center: Point,
    ) -> PenResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(PenError::validation(format!(
                "costume {id:?}: expected {expected} bytes for {width}x{height}, got {}",
                rgba.len()
            )));
        }
        Ok(Self {
            id,
            width,
            height,
            rgba,
            rotation_center,
        })
    }

    /// Build from a decoded image; the rotation center defaults to the bitmap center.
    pub fn from_rgba_image(
        id: CostumeId,
        image: image::RgbaImage,
        rotation_center: Option<Point>,
    ) -> Self {
        let (width, height) = image.dimensions();
        let center = rotation_center
            .unwrap_or_else(|| Point::new(f64::from(width) / 2.0, f64::from(height) / 2.0));
        Self {
            id,
            width,
            height,
            rgba: image.into_raw(),
            rotation_center: center,
        }
    }

    /// A single-color rectangle centered on its rotation center.
    pub fn solid(id: CostumeId, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let rgba = rgba.repeat((width as usize) * (height as usize));
        Self {
            id,
            width,
            height,
            rgba,
            rotation_center: Point::new(f64::from(width) / 2.0, f64::from(height) / 2.0),
        }
    }

    /// Costume identity.
    pub fn id(&self) -> CostumeId {
        self.id
    }

    /// Width in costume pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in costume pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size as a vector in costume pixels.
    pub fn size(&self) -> Vec2 {
        Vec2::new(f64::from(self.width), f64::from(self.height))
    }

    /// Rotation center in costume pixels.
    pub fn rotation_center(&self) -> Point {
        self.rotation_center
    }

    /// Straight-alpha texel; out-of-range reads are transparent.
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }

    /// Transform placing this costume on the stage.
    ///
    /// `direction` follows sprite conventions: 90 points right, angles grow clockwise. The
    /// rotation center lands on `(x, y)`.
    pub fn placement(&self, x: f64, y: f64, scale: f64, direction: f64) -> Affine {
        let clockwise = (direction - 90.0).to_radians();
        Affine::translate(Vec2::new(x, y))
            * Affine::rotate(-clockwise)
            * Affine::scale_non_uniform(scale, -scale)
            * Affine::translate(-self.rotation_center.to_vec2())
    }
}

/// A sprite as seen by the pen and collision pipelines.
#[derive(Clone, Debug)]
pub struct SpriteView {
    /// Sprite identity.
    pub id: SpriteId,
    /// Current costume; `None` when the sprite has nothing to draw.
    pub costume: Option<Rc<Costume>>,
    /// Costume pixels to stage coordinates.
    pub transform: Affine,
    /// Draw order; higher layers are drawn later (on top).
    pub layer: i32,
    /// Hidden sprites are skipped by draws and composites.
    pub visible: bool,
}

impl SpriteView {
    /// A visible sprite wearing `costume`.
    pub fn new(id: SpriteId, costume: Rc<Costume>, transform: Affine, layer: i32) -> Self {
        Self {
            id,
            costume: Some(costume),
            transform,
            layer,
            visible: true,
        }
    }

    /// Axis-aligned stage bounds of the costume rectangle.
    pub fn stage_bounds(&self) -> Option<Rect> {
        let costume = self.costume.as_ref()?;
        let size = costume.size();
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(size.x, 0.0),
            Point::new(size.x, size.y),
            Point::new(0.0, size.y),
        ]
        .map(|p| self.transform * p);
        let mut r = Rect::from_points(corners[0], corners[1]);
        r = r.union_pt(corners[2]);
        r = r.union_pt(corners[3]);
        Some(r)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/costume.rs"]
mod tests;
