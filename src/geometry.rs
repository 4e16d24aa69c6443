//! Tile geometry containers and their command-stream iteration.
//!
//! A geometry is one of `Point`, `LineString` or `Polygon` (outer ring plus
//! optional inner rings). Every geometry can replay itself as a stream of
//! path commands: each ring opens with `MoveTo` and continues with `LineTo`,
//! exhaustion of the stream marking the end of the path. Consumers that
//! need analytic predicates lift the command stream into `geo` types.

use geo::{coord, Coord, Rect};
use serde::{Deserialize, Serialize};

/// One step of a geometry's vertex stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Coord<f64>),
    LineTo(Coord<f64>),
}

impl PathCommand {
    /// The vertex this command carries, whatever the command type.
    #[inline]
    pub fn coord(&self) -> Coord<f64> {
        match *self {
            PathCommand::MoveTo(c) | PathCommand::LineTo(c) => c,
        }
    }
}

/// A single tile geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Point(Coord<f64>),
    LineString(Vec<Coord<f64>>),
    Polygon {
        exterior: Vec<Coord<f64>>,
        #[serde(default)]
        interiors: Vec<Vec<Coord<f64>>>,
    },
}

impl Geometry {
    /// Number of vertices across all rings.
    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::LineString(line) => line.len(),
            Geometry::Polygon { exterior, interiors } => {
                exterior.len() + interiors.iter().map(Vec::len).sum::<usize>()
            }
        }
    }

    /// Vertex at `index`, counting across rings in emission order.
    pub fn vertex(&self, index: usize) -> Option<Coord<f64>> {
        let mut remaining = index;
        for ring in self.rings() {
            if remaining < ring.len() {
                return Some(ring[remaining]);
            }
            remaining -= ring.len();
        }
        None
    }

    /// Replay the geometry as a command stream.
    pub fn path(&self) -> PathIter<'_> {
        PathIter { rings: self.rings(), ring: 0, vertex: 0 }
    }

    /// Bounding rectangle, `None` when the geometry has no vertices.
    pub fn envelope(&self) -> Option<Rect<f64>> {
        let mut coords = self.rings().into_iter().flatten().copied();
        let first = coords.next()?;
        let (min, max) = coords.fold((first, first), |(lo, hi), c| {
            (
                coord! { x: lo.x.min(c.x), y: lo.y.min(c.y) },
                coord! { x: hi.x.max(c.x), y: hi.y.max(c.y) },
            )
        });
        Some(Rect::new(min, max))
    }

    fn rings(&self) -> Vec<&[Coord<f64>]> {
        match self {
            Geometry::Point(point) => vec![std::slice::from_ref(point)],
            Geometry::LineString(line) => vec![line.as_slice()],
            Geometry::Polygon { exterior, interiors } => {
                std::iter::once(exterior.as_slice())
                    .chain(interiors.iter().map(Vec::as_slice))
                    .collect()
            }
        }
    }
}

/// Iterator over a geometry's path commands. The first vertex of every ring
/// is a `MoveTo`; exhaustion is the end-of-path marker.
pub struct PathIter<'a> {
    rings: Vec<&'a [Coord<f64>]>,
    ring: usize,
    vertex: usize,
}

impl Iterator for PathIter<'_> {
    type Item = PathCommand;

    fn next(&mut self) -> Option<PathCommand> {
        while self.ring < self.rings.len() {
            let ring = self.rings[self.ring];
            if self.vertex < ring.len() {
                let c = ring[self.vertex];
                let cmd = if self.vertex == 0 {
                    PathCommand::MoveTo(c)
                } else {
                    PathCommand::LineTo(c)
                };
                self.vertex += 1;
                return Some(cmd);
            }
            self.ring += 1;
            self.vertex = 0;
        }
        None
    }
}

/// Smallest rectangle covering both inputs.
pub(crate) fn expand_rect(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}
