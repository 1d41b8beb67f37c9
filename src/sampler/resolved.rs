use std::sync::{Arc, OnceLock};

use crate::{
    foundation::{
        color::Rgba8,
        core::{Affine, BezPath},
        error::{PointCloudError, PointCloudResult},
    },
    sampler::{PointBudget, SampledShape, arclen},
};

/// Parse SVG bytes into a `usvg` tree, resolving `<text>` against the system fonts.
pub fn parse_tree(bytes: &[u8]) -> PointCloudResult<Arc<usvg::Tree>> {
    let opts = usvg::Options {
        fontdb: system_fonts(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| PointCloudError::load(format!("parse svg tree: {e}")))?;
    Ok(Arc::new(tree))
}

/// Fonts installed on this machine, scanned once per process.
pub fn system_fonts() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "system fonts loaded");
            Arc::new(db)
        })
        .clone()
}

/// Sample every filled path of a resolved tree in absolute coordinates.
///
/// usvg has already applied CSS, inheritance, and transforms, converted basic shapes to paths,
/// and moved clip paths, masks, and defs out of the render tree. Paths painted with a
/// gradient or pattern take `fallback`.
pub fn sample_tree(
    tree: &usvg::Tree,
    density: f64,
    fallback: Rgba8,
) -> PointCloudResult<Vec<SampledShape>> {
    let mut walk = Walk {
        density,
        fallback,
        budget: PointBudget::default(),
        shapes: Vec::new(),
    };
    walk.group(tree.root())?;
    Ok(walk.shapes)
}

struct Walk {
    density: f64,
    fallback: Rgba8,
    budget: PointBudget,
    shapes: Vec<SampledShape>,
}

impl Walk {
    fn group(&mut self, group: &usvg::Group) -> PointCloudResult<()> {
        for child in group.children() {
            match child {
                usvg::Node::Group(g) => self.group(g.as_ref())?,
                usvg::Node::Text(t) => self.group(t.flattened())?,
                usvg::Node::Path(p) => {
                    let Some(fill) = p.fill() else {
                        continue;
                    };
                    let color = match fill.paint() {
                        usvg::Paint::Color(c) => Rgba8::rgb(c.red, c.green, c.blue),
                        _ => self.fallback,
                    };
                    let outline = to_bezpath(p.data(), p.abs_transform());
                    let points =
                        arclen::sample_outline(&outline, self.density, &mut self.budget)?;
                    if !points.is_empty() {
                        self.shapes.push(SampledShape { points, color });
                    }
                }
                usvg::Node::Image(_) => {}
            }
        }
        Ok(())
    }
}

fn to_bezpath(data: &usvg::tiny_skia_path::Path, ts: usvg::Transform) -> BezPath {
    use usvg::tiny_skia_path::PathSegment;

    let mut out = BezPath::new();
    for seg in data.segments() {
        match seg {
            PathSegment::MoveTo(p) => out.move_to((f64::from(p.x), f64::from(p.y))),
            PathSegment::LineTo(p) => out.line_to((f64::from(p.x), f64::from(p.y))),
            PathSegment::QuadTo(p1, p2) => out.quad_to(
                (f64::from(p1.x), f64::from(p1.y)),
                (f64::from(p2.x), f64::from(p2.y)),
            ),
            PathSegment::CubicTo(p1, p2, p3) => out.curve_to(
                (f64::from(p1.x), f64::from(p1.y)),
                (f64::from(p2.x), f64::from(p2.y)),
                (f64::from(p3.x), f64::from(p3.y)),
            ),
            PathSegment::Close => out.close_path(),
        }
    }

    let affine = Affine::new([
        f64::from(ts.sx),
        f64::from(ts.ky),
        f64::from(ts.kx),
        f64::from(ts.sy),
        f64::from(ts.tx),
        f64::from(ts.ty),
    ]);
    out.apply_affine(affine);
    out
}
