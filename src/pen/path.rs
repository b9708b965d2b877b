use std::fmt;
use std::rc::Rc;

use crate::foundation::core::Affine;
use crate::render::painter::Painter;

/// Externally supplied draw callback replayed by a stamp, with the transform captured at queue
/// time.
pub type StampFn = Rc<dyn Fn(&mut Painter<'_>, Affine)>;

/// One queued pen operation. Coordinates are stage coordinates.
#[derive(Clone)]
pub enum PathNode {
    /// A stroked segment.
    Line {
        /// Start x.
        x0: f64,
        /// Start y.
        y0: f64,
        /// End x.
        x1: f64,
        /// End y.
        y1: f64,
        /// Stroke diameter in stage units.
        size: f64,
        /// Straight-alpha color in `[0, 1]`.
        rgba: [f32; 4],
    },
    /// A round dot.
    Point {
        /// Center x.
        x: f64,
        /// Center y.
        y: f64,
        /// Dot diameter in stage units.
        size: f64,
        /// Straight-alpha color in `[0, 1]`.
        rgba: [f32; 4],
    },
    /// A costume stamp.
    Stamp {
        /// Draw callback.
        draw: StampFn,
        /// Transform captured when the stamp was queued.
        transform: Affine,
    },
    /// Wipe the canvas.
    Clear,
}

impl PathNode {
    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Line { .. } => "line",
            Self::Point { .. } => "point",
            Self::Stamp { .. } => "stamp",
            Self::Clear => "clear",
        }
    }
}

impl fmt::Debug for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line {
                x0,
                y0,
                x1,
                y1,
                size,
                rgba,
            } => f
                .debug_struct("Line")
                .field("x0", x0)
                .field("y0", y0)
                .field("x1", x1)
                .field("y1", y1)
                .field("size", size)
                .field("rgba", rgba)
                .finish(),
            Self::Point { x, y, size, rgba } => f
                .debug_struct("Point")
                .field("x", x)
                .field("y", y)
                .field("size", size)
                .field("rgba", rgba)
                .finish(),
            Self::Stamp { transform, .. } => f
                .debug_struct("Stamp")
                .field("transform", transform)
                .finish_non_exhaustive(),
            Self::Clear => f.write_str("Clear"),
        }
    }
}
