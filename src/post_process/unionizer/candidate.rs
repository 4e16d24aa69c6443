use std::cmp::Ordering;
use std::collections::BTreeSet;

use geo::{coord, Coord};

use super::approx::CurveApproximator;
use super::score::Heuristic;
use crate::feature::{float_cmp, Feature, Value};
use crate::geometry::Geometry;
use crate::layer::Layer;

/// Which end of a linestring a candidate refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum End {
    Front,
    Back,
}

/// One joinable linestring endpoint. Refers to its parent feature and
/// geometry by index into the layer; valid for a single pass of a single
/// unionizer iteration.
#[derive(Clone, Copy, Debug)]
pub(super) struct Candidate {
    pub feature: usize,
    pub geometry: usize,
    pub end: End,
    pub at: Coord<f64>,
    pub directional: bool,
    /// Approximate direction the curve leaves the endpoint, `(0, 0)` when
    /// unknown or degenerate. Only angular heuristics compute it.
    pub dir: Coord<f64>,
}

impl Candidate {
    fn new(
        end: End,
        feature: usize,
        geometry: usize,
        line: &[Coord<f64>],
        directional: bool,
        heuristic: Heuristic,
        budget: (f64, f64),
    ) -> Self {
        let at = match end {
            End::Front => line[0],
            End::Back => line[line.len() - 1],
        };

        let dir = match heuristic {
            Heuristic::Greedy => coord! { x: 0.0, y: 0.0 },
            Heuristic::Obtuse | Heuristic::Acute => {
                let mut appx = CurveApproximator::new(at.x, at.y, budget.0, budget.1);
                for i in 1..line.len() {
                    let v = match end {
                        End::Front => line[i],
                        End::Back => line[line.len() - 1 - i],
                    };
                    if !appx.consume(v.x, v.y) {
                        break;
                    }
                }
                let (dx, dy) = appx.direction();
                coord! { x: dx, y: dy }
            }
        };

        Self { feature, geometry, end, at, directional, dir }
    }
}

/// True when the feature can take part in unioning at all: it still has
/// geometry and carries every match-tag.
fn unionable(feature: &Feature, match_tags: &BTreeSet<String>) -> bool {
    feature.num_geometries() > 0 && match_tags.iter().all(|tag| feature.has(tag))
}

/// Gather both endpoints of every non-degenerate linestring in the layer,
/// sorted so that equal candidates (same endpoint, same match-tag values)
/// are adjacent.
pub(super) fn collect(
    layer: &Layer,
    match_tags: &BTreeSet<String>,
    direction_tags: &BTreeSet<String>,
    heuristic: Heuristic,
    budget: (f64, f64),
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for (fi, feature) in layer.features().iter().enumerate() {
        if !unionable(feature, match_tags) {
            continue;
        }

        let directional = direction_tags.iter().any(|tag| feature.has(tag));

        for (gi, geom) in feature.geometries().iter().enumerate() {
            let Geometry::LineString(line) = geom else { continue };
            if line.len() < 2 {
                continue;
            }
            candidates.push(Candidate::new(
                End::Front, fi, gi, line, directional, heuristic, budget,
            ));
            candidates.push(Candidate::new(
                End::Back, fi, gi, line, directional, heuristic, budget,
            ));
        }
    }

    candidates.sort_by(|a, b| order(a, b, layer, match_tags));
    candidates
}

/// Candidate ordering: endpoint (x, y) lexicographic, then the match-tag
/// values in tag-set order. Equal candidates form an adjacency group.
/// Endpoints match on exact real-number equality, so the two signed zeros
/// group together.
pub(super) fn order(
    a: &Candidate,
    b: &Candidate,
    layer: &Layer,
    match_tags: &BTreeSet<String>,
) -> Ordering {
    float_cmp(a.at.x, b.at.x)
        .then_with(|| float_cmp(a.at.y, b.at.y))
        .then_with(|| {
            let null = Value::Null;
            for tag in match_tags {
                let av = layer.features()[a.feature].get(tag).unwrap_or(&null);
                let bv = layer.features()[b.feature].get(tag).unwrap_or(&null);
                match av.cmp(bv) {
                    Ordering::Equal => continue,
                    unequal => return unequal,
                }
            }
            Ordering::Equal
        })
}
