use crate::foundation::{
    color::Rgba8,
    error::{PointCloudError, PointCloudResult},
};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Output pixel box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// A box with both sides in `1..=u16::MAX`.
    pub fn new(width: u32, height: u32) -> PointCloudResult<Self> {
        if width == 0 || height == 0 {
            return Err(PointCloudError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(PointCloudError::validation(
                "canvas width/height must fit in u16",
            ));
        }
        Ok(Self { width, height })
    }

    /// Width as `f64`.
    pub fn width_f64(self) -> f64 {
        f64::from(self.width)
    }

    /// Height as `f64`.
    pub fn height_f64(self) -> f64 {
        f64::from(self.height)
    }

    /// Whether `p` lies inside the box, edges included.
    pub fn contains(self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width_f64() && p.y <= self.height_f64()
    }
}

/// A sampled point carrying the fill colour of the shape it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColoredPoint {
    /// Position in source or canvas coordinates, depending on the stage.
    pub point: Point,
    /// Fill colour of the owning shape.
    pub color: Rgba8,
}

impl ColoredPoint {
    /// Tag `point` with `color`.
    pub fn new(point: Point, color: Rgba8) -> Self {
        Self { point, color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_rejects_empty_and_oversized() {
        assert!(Canvas::new(0, 10).is_err());
        assert!(Canvas::new(10, 0).is_err());
        assert!(Canvas::new(70_000, 10).is_err());
        assert!(Canvas::new(800, 600).is_ok());
    }

    #[test]
    fn canvas_contains_is_inclusive_of_edges() {
        let c = Canvas::new(800, 600).unwrap();
        assert!(c.contains(Point::new(0.0, 0.0)));
        assert!(c.contains(Point::new(800.0, 600.0)));
        assert!(!c.contains(Point::new(800.1, 10.0)));
        assert!(!c.contains(Point::new(-0.1, 10.0)));
    }
}
