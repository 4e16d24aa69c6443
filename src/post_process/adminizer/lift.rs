//! Lifts tile command streams into `geo` shapes for precise intersection
//! tests. Points become multi-points (a stream may carry several `MoveTo`s),
//! linestrings become multi-linestrings, polygons keep their ring structure.

use geo::{Coord, LineString, MultiLineString, MultiPoint, Point, Polygon};

use crate::geometry::{Geometry, PathCommand};

/// Absolute per-axis tolerance under which a vertex collapses into the
/// previous one.
const DEDUP_TOLERANCE: f64 = 1e-12;

fn near(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() < DEDUP_TOLERANCE && (a.y - b.y).abs() < DEDUP_TOLERANCE
}

/// Every vertex becomes a point, whatever its command type.
pub(super) fn to_multi_point(geom: &Geometry) -> MultiPoint<f64> {
    geom.path().map(|cmd| Point::from(cmd.coord())).collect()
}

/// `MoveTo` opens a new sub-linestring; `LineTo` appends, skipping
/// near-duplicates of the previously kept vertex.
pub(super) fn to_multi_line_string(geom: &Geometry) -> MultiLineString<f64> {
    let mut lines: Vec<Vec<Coord<f64>>> = Vec::new();
    let mut prev: Option<Coord<f64>> = None;

    for cmd in geom.path() {
        match cmd {
            PathCommand::MoveTo(c) => {
                lines.push(vec![c]);
                prev = Some(c);
            }
            PathCommand::LineTo(c) => {
                if prev.is_some_and(|p| near(p, c)) {
                    continue;
                }
                if let Some(line) = lines.last_mut() {
                    line.push(c);
                }
                prev = Some(c);
            }
        }
    }

    MultiLineString::new(lines.into_iter().map(LineString::new).collect())
}

/// The first `MoveTo` opens the outer ring, each later one an inner ring;
/// `LineTo` deduplication as for linestrings. Rings are closed by the
/// polygon constructor.
pub(super) fn to_polygon(geom: &Geometry) -> Polygon<f64> {
    let mut outer: Vec<Coord<f64>> = Vec::new();
    let mut inners: Vec<Vec<Coord<f64>>> = Vec::new();
    let mut rings = 0usize;
    let mut prev: Option<Coord<f64>> = None;

    for cmd in geom.path() {
        match cmd {
            PathCommand::MoveTo(c) => {
                if rings == 0 {
                    outer.push(c);
                } else {
                    inners.push(vec![c]);
                }
                rings += 1;
                prev = Some(c);
            }
            PathCommand::LineTo(c) => {
                if prev.is_some_and(|p| near(p, c)) {
                    continue;
                }
                if rings == 1 {
                    outer.push(c);
                } else if let Some(ring) = inners.last_mut() {
                    ring.push(c);
                }
                prev = Some(c);
            }
        }
    }

    Polygon::new(
        LineString::new(outer),
        inners.into_iter().map(LineString::new).collect(),
    )
}
