use crate::foundation::core::{Canvas, ColoredPoint, Point};

/// Anything with a 2-D position that normalisation can move.
pub trait Positioned: Copy {
    /// Returns the item's position.
    fn position(&self) -> Point;
    /// Returns a copy of the item moved to `p`.
    fn with_position(self, p: Point) -> Self;
}

impl Positioned for Point {
    fn position(&self) -> Point {
        *self
    }

    fn with_position(self, p: Point) -> Self {
        p
    }
}

impl Positioned for ColoredPoint {
    fn position(&self) -> Point {
        self.point
    }

    fn with_position(self, p: Point) -> Self {
        Self { point: p, ..self }
    }
}

/// How the scale factor was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fit {
    /// Both axes have extent; the tighter axis scale was applied to both.
    Uniform,
    /// One axis has zero extent; the other axis alone decided the scale.
    DegenerateAxis,
    /// All points coincide (or there are none); scale is 1.
    DegeneratePoint,
}

/// Output of [`normalize_points`].
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized<P> {
    /// Input points in input order, moved into canvas coordinates.
    pub points: Vec<P>,
    /// Uniform factor applied to both axes.
    pub scale: f64,
    /// Which rule produced `scale`.
    pub fit: Fit,
}

/// Uniformly rescale `points` into `canvas`, anchored at the global top-left of their bounds.
///
/// All shapes are normalised together so their relative layout survives. The output never
/// contains non-finite coordinates for finite input.
pub fn normalize_points<P: Positioned>(points: &[P], canvas: Canvas) -> Normalized<P> {
    if points.is_empty() {
        return Normalized {
            points: Vec::new(),
            scale: 1.0,
            fit: Fit::DegeneratePoint,
        };
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points.iter().map(Positioned::position) {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let span_x = max_x - min_x;
    let span_y = max_y - min_y;
    let scale_x = canvas.width_f64() / span_x;
    let scale_y = canvas.height_f64() / span_y;

    let (scale, fit) = match (span_x > 0.0, span_y > 0.0) {
        (true, true) => (scale_x.min(scale_y), Fit::Uniform),
        (true, false) => (scale_x, Fit::DegenerateAxis),
        (false, true) => (scale_y, Fit::DegenerateAxis),
        (false, false) => (1.0, Fit::DegeneratePoint),
    };
    let (scale, fit) = if scale.is_finite() {
        (scale, fit)
    } else {
        (1.0, Fit::DegeneratePoint)
    };
    if fit != Fit::Uniform {
        tracing::warn!(?fit, span_x, span_y, scale, "degenerate point bounds");
    }

    let points = points
        .iter()
        .map(|p| {
            let q = p.position();
            p.with_position(Point::new((q.x - min_x) * scale, (q.y - min_y) * scale))
        })
        .collect();

    Normalized { points, scale, fit }
}
