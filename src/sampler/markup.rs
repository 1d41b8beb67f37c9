use std::str::FromStr;

use kurbo::Shape;
use roxmltree::{Document, Node};

use crate::{
    foundation::{
        color::Rgba8,
        core::{BezPath, Point},
        error::{PointCloudError, PointCloudResult},
    },
    sampler::{PointBudget, SampledShape, arclen},
};

/// Containers whose descendants never contribute particles.
const HIDDEN_CONTAINERS: [&str; 3] = ["clipPath", "defs", "mask"];

/// Flattening tolerance for basic shapes converted to outlines.
const SHAPE_TOLERANCE: f64 = 0.1;

/// Parse `markup` and sample every eligible shape, in document order.
#[tracing::instrument(skip(markup), fields(bytes = markup.len()))]
pub fn sample_markup(markup: &str, density: f64) -> PointCloudResult<Vec<SampledShape>> {
    let doc = Document::parse(markup)
        .map_err(|e| PointCloudError::load(format!("parse svg markup: {e}")))?;
    sample_document(&doc, density)
}

/// Sample an already-parsed document within the default point budget.
pub fn sample_document(
    doc: &Document<'_>,
    density: f64,
) -> PointCloudResult<Vec<SampledShape>> {
    let mut budget = PointBudget::default();
    let mut shapes = Vec::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        let tag = node.tag_name().name();
        let outline = match shape_outline(node) {
            Outline::NotAShape => continue,
            Outline::Missing => {
                tracing::debug!(tag, "shape without geometry skipped");
                continue;
            }
            Outline::Invalid(err) => {
                tracing::debug!(tag, %err, "shape with invalid geometry skipped");
                continue;
            }
            Outline::Path(path) => path,
        };

        if is_excluded(node) {
            tracing::debug!(tag, "hidden or unfilled shape skipped");
            continue;
        }

        let points = arclen::sample_outline(&outline, density, &mut budget)?;
        if points.is_empty() {
            continue;
        }
        shapes.push(SampledShape {
            points,
            color: resolve_fill(node),
        });
    }
    Ok(shapes)
}

/// True when `node` sits under a clip-path/defs/mask container or its own style says `fill:none`.
pub fn is_excluded(node: Node<'_, '_>) -> bool {
    let hidden = node
        .ancestors()
        .skip(1)
        .filter(|a| a.is_element())
        .any(|a| HIDDEN_CONTAINERS.contains(&a.tag_name().name()));
    hidden || style_property(node, "fill").is_some_and(|v| v.eq_ignore_ascii_case("none"))
}

/// Resolve the fill colour of `node`.
///
/// Each element from `node` up to the document root is asked in turn: its inline `style` fill,
/// then its `fill` attribute. Values that are `none` or not plain colours (gradient references,
/// `currentColor`, `inherit`) defer to the parent. Past the root the fill is white.
pub fn resolve_fill(node: Node<'_, '_>) -> Rgba8 {
    for n in node.ancestors().filter(|n| n.is_element()) {
        if let Some(c) = style_property(n, "fill").and_then(parse_fill) {
            return c;
        }
        if let Some(c) = n.attribute("fill").and_then(parse_fill) {
            return c;
        }
    }
    Rgba8::WHITE
}

fn parse_fill(value: &str) -> Option<Rgba8> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") {
        return None;
    }
    Rgba8::parse(value).ok()
}

/// Last declaration of `name` in the inline `style` attribute.
fn style_property<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute("style")?
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_end_matches("!important").trim())
        .next_back()
}

enum Outline {
    NotAShape,
    Missing,
    Invalid(String),
    Path(BezPath),
}

fn shape_outline(node: Node<'_, '_>) -> Outline {
    match node.tag_name().name() {
        "path" => match node.attribute("d").map(str::trim) {
            None | Some("") => Outline::Missing,
            Some(d) => match BezPath::from_svg(d) {
                Ok(path) => Outline::Path(path),
                Err(e) => Outline::Invalid(format!("invalid path data: {e}")),
            },
        },
        "rect" => {
            let (Some(w), Some(h)) = (length(node, "width"), length(node, "height")) else {
                return Outline::Missing;
            };
            let x = length(node, "x").unwrap_or(0.0);
            let y = length(node, "y").unwrap_or(0.0);
            let r = length(node, "rx")
                .or_else(|| length(node, "ry"))
                .unwrap_or(0.0)
                .clamp(0.0, w.min(h) / 2.0);
            let rect = kurbo::Rect::new(x, y, x + w, y + h);
            if r > 0.0 {
                Outline::Path(rect.to_rounded_rect(r).to_path(SHAPE_TOLERANCE))
            } else {
                Outline::Path(rect.to_path(SHAPE_TOLERANCE))
            }
        }
        "circle" => {
            let Some(r) = length(node, "r") else {
                return Outline::Missing;
            };
            let center = Point::new(
                length(node, "cx").unwrap_or(0.0),
                length(node, "cy").unwrap_or(0.0),
            );
            Outline::Path(kurbo::Circle::new(center, r).to_path(SHAPE_TOLERANCE))
        }
        "ellipse" => {
            let (Some(rx), Some(ry)) = (length(node, "rx"), length(node, "ry")) else {
                return Outline::Missing;
            };
            let center = Point::new(
                length(node, "cx").unwrap_or(0.0),
                length(node, "cy").unwrap_or(0.0),
            );
            Outline::Path(kurbo::Ellipse::new(center, (rx, ry), 0.0).to_path(SHAPE_TOLERANCE))
        }
        "line" => {
            let mut path = BezPath::new();
            path.move_to((
                length(node, "x1").unwrap_or(0.0),
                length(node, "y1").unwrap_or(0.0),
            ));
            path.line_to((
                length(node, "x2").unwrap_or(0.0),
                length(node, "y2").unwrap_or(0.0),
            ));
            Outline::Path(path)
        }
        tag @ ("polyline" | "polygon") => {
            let Some(points) = node.attribute("points") else {
                return Outline::Missing;
            };
            let mut path = BezPath::new();
            for (i, (x, y)) in svgtypes::PointsParser::from(points).enumerate() {
                if i == 0 {
                    path.move_to((x, y));
                } else {
                    path.line_to((x, y));
                }
            }
            if path.elements().is_empty() {
                return Outline::Missing;
            }
            if tag == "polygon" {
                path.close_path();
            }
            Outline::Path(path)
        }
        _ => Outline::NotAShape,
    }
}

fn length(node: Node<'_, '_>, attr: &str) -> Option<f64> {
    let raw = node.attribute(attr)?;
    svgtypes::Length::from_str(raw.trim())
        .ok()
        .map(|l| l.number)
        .filter(|n| n.is_finite())
}
