//! Vector-to-points conversion.
//!
//! Two front ends share one arc-length sampler:
//! - [`markup`] walks the raw XML and applies the point-cloud fill rules (hidden containers,
//!   `fill:none`, fill inheritance defaulting to white). Transforms are not applied.
//! - [`resolved`] walks a `usvg` tree, where CSS, transforms, and basic shapes are already
//!   resolved.

/// Arc-length-uniform sampling of one outline.
pub mod arclen;
/// Sampling straight from the markup.
pub mod markup;
/// Sampling a usvg-resolved tree.
pub mod resolved;

use crate::foundation::{
    color::Rgba8,
    core::{ColoredPoint, Point},
    error::{PointCloudError, PointCloudResult},
};

/// Most points a single shape may produce.
pub const MAX_SHAPE_POINTS: usize = 1_000_000;
/// Most points one load may produce across all shapes.
pub const MAX_LOAD_POINTS: usize = 2_000_000;

/// Points still available to one load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointBudget {
    remaining: usize,
}

impl Default for PointBudget {
    fn default() -> Self {
        Self::new(MAX_LOAD_POINTS)
    }
}

impl PointBudget {
    /// A budget of `limit` points.
    pub fn new(limit: usize) -> Self {
        Self { remaining: limit }
    }

    /// Points still available.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Charge an outline of `length` split into `intervals` (so `intervals + 1` points).
    pub fn reserve(&mut self, intervals: usize, length: f64) -> PointCloudResult<()> {
        let points = intervals.saturating_add(1);
        if points > MAX_SHAPE_POINTS {
            return Err(PointCloudError::load(format!(
                "outline of length {length:.1} needs {points} points, the per-shape limit is {MAX_SHAPE_POINTS}"
            )));
        }
        if points > self.remaining {
            return Err(PointCloudError::load(format!(
                "sampling needs more points than the remaining budget of {}",
                self.remaining
            )));
        }
        self.remaining -= points;
        Ok(())
    }
}

/// Points sampled from one drawable shape, with its resolved fill.
#[derive(Clone, Debug, PartialEq)]
pub struct SampledShape {
    /// Outline samples in source coordinates.
    pub points: Vec<Point>,
    /// Resolved fill of the shape.
    pub color: Rgba8,
}

/// Which front end turns markup into shapes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Raw markup walk with point-cloud fill rules.
    #[default]
    Markup,
    /// usvg-resolved tree.
    Resolved,
}

/// Flatten per-shape samples into one colour-tagged list, preserving document order.
pub fn flatten(shapes: &[SampledShape]) -> Vec<ColoredPoint> {
    shapes
        .iter()
        .flat_map(|s| s.points.iter().map(|&p| ColoredPoint::new(p, s.color)))
        .collect()
}
