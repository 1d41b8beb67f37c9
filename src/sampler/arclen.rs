use kurbo::{ParamCurve, ParamCurveArclen, PathEl, PathSeg};

use crate::{
    foundation::{
        core::{BezPath, Point},
        error::PointCloudResult,
    },
    sampler::PointBudget,
};

/// Tolerance passed to kurbo's arc-length routines (source units).
pub(crate) const ARCLEN_ACCURACY: f64 = 1e-3;

/// Number of sampling intervals for an outline of length `length`.
///
/// The sampler emits one more point than this (both ends are included).
pub fn sample_count(length: f64, density: f64) -> usize {
    let raw = (length / 100.0 * density).round();
    if raw.is_finite() && raw > 2.0 {
        raw as usize
    } else {
        2
    }
}

/// Total drawn length of `path`. Move-to jumps contribute nothing; close-path contributes the
/// closing line.
pub fn outline_length(path: &BezPath) -> f64 {
    path.segments().map(|s| s.arclen(ARCLEN_ACCURACY)).sum()
}

/// Sample `path` at uniform arc-length steps.
///
/// Returns `sample_count(L, density) + 1` points, the first at arc length 0 and the last at `L`.
/// A path made only of a move-to yields that many copies of its start point. A path with no
/// elements yields nothing. The points are charged to `budget` before anything is allocated.
pub fn sample_outline(
    path: &BezPath,
    density: f64,
    budget: &mut PointBudget,
) -> PointCloudResult<Vec<Point>> {
    let Some(start) = path.elements().iter().find_map(|el| match el {
        PathEl::MoveTo(p) => Some(*p),
        _ => None,
    }) else {
        return Ok(Vec::new());
    };

    let segs: Vec<PathSeg> = path.segments().collect();
    let lengths: Vec<f64> = segs.iter().map(|s| s.arclen(ARCLEN_ACCURACY)).collect();
    let total: f64 = lengths.iter().sum();

    let count = sample_count(total, density);
    budget.reserve(count, total)?;
    let step = total / count as f64;

    let mut out = Vec::with_capacity(count + 1);
    if segs.is_empty() {
        out.resize(count + 1, start);
        return Ok(out);
    }

    let mut idx = 0usize;
    let mut seg_start = 0.0;
    for i in 0..=count {
        let s = (i as f64 * step).min(total);
        while idx + 1 < segs.len() && seg_start + lengths[idx] < s {
            seg_start += lengths[idx];
            idx += 1;
        }

        let seg = segs[idx];
        let len = lengths[idx];
        let t = if len > 0.0 {
            seg.inv_arclen((s - seg_start).clamp(0.0, len), ARCLEN_ACCURACY)
        } else {
            0.0
        };
        out.push(seg.eval(t));
    }
    Ok(out)
}
