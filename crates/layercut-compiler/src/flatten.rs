//! Curve flattening
//!
//! Turns path commands into polylines whose segments stay within a given
//! tolerance of the source curves.
//!
//! * Cubic Béziers are bisected with de Casteljau until both control points
//!   lie within the tolerance of the chord. The curve is inside the convex
//!   hull of its control points, so this bounds the deviation of the whole
//!   piece.
//! * Quadratic Béziers are elevated to cubics first.
//! * Elliptical arcs use the SVG endpoint parameterisation. lyon converts
//!   them to centre form (scaling radii up when they cannot span the
//!   endpoints) and the angle range is bisected until points sampled at a
//!   quarter, half and three quarters of each piece lie within the tolerance
//!   of its chord.
//!
//! Subdivision never goes deeper than [`MAX_SUBDIVISION_DEPTH`]; at that
//! depth the current chord is kept and the result is flagged.

use crate::document::Affine;
use crate::path::{Path, PathCommand};
use lyon::geom::{
    Angle, ArcFlags, CubicBezierSegment, LineSegment, Point, QuadraticBezierSegment, SvgArc,
};
use std::f64::consts::FRAC_PI_2;

/// Maximum recursion depth for curve subdivision
pub const MAX_SUBDIVISION_DEPTH: u32 = 16;

/// Flattened form of one subpath
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    pub points: Vec<Point<f64>>,
    /// The subpath ended with a close command
    pub closed: bool,
}

impl Polyline {
    pub fn new(points: Vec<Point<f64>>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of straight segments
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }
}

/// Anomalies found while flattening one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlattenIssue {
    /// A curve hit [`MAX_SUBDIVISION_DEPTH`]
    SubdivisionLimit,
    /// A subpath collapsed to a single point
    Degenerate,
    /// A subpath had non-finite coordinates
    NonFinite,
}

/// Result of flattening one path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Flattened {
    /// One polyline per surviving subpath, in order
    pub polylines: Vec<Polyline>,
    pub issues: Vec<FlattenIssue>,
}

/// Flatten a path in its own coordinate space
pub fn flatten_path(path: &Path, tolerance: f64) -> Flattened {
    flatten_transformed(path, &Affine::identity(), tolerance)
}

/// Flatten a path and map its vertices through `transform`.
///
/// The tolerance is expressed in the target space; it is divided by the
/// transform's largest stretch before flattening in local space.
pub fn flatten_transformed(path: &Path, transform: &Affine, tolerance: f64) -> Flattened {
    let stretch = max_stretch(transform);
    let local_tolerance = if stretch.is_finite() && stretch > 0.0 {
        tolerance / stretch
    } else {
        tolerance
    };

    let mut builder = Builder::new(transform, local_tolerance);
    let mut current = Point::new(0.0, 0.0);

    for command in path.commands() {
        match *command {
            PathCommand::MoveTo(to) => {
                builder.move_to(to);
                current = to;
            }
            PathCommand::LineTo(to) => {
                builder.line_to(to);
                current = to;
            }
            PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                builder.cubic_to(&CubicBezierSegment {
                    from: current,
                    ctrl1,
                    ctrl2,
                    to,
                });
                current = to;
            }
            PathCommand::QuadraticTo { ctrl, to } => {
                let quadratic = QuadraticBezierSegment {
                    from: current,
                    ctrl,
                    to,
                };
                builder.cubic_to(&quadratic.to_cubic());
                current = to;
            }
            PathCommand::ArcTo {
                radii,
                x_rotation,
                large_arc,
                sweep,
                to,
            } => {
                builder.arc_to(&SvgArc {
                    from: current,
                    to,
                    radii,
                    x_rotation: Angle::degrees(x_rotation),
                    flags: ArcFlags { large_arc, sweep },
                });
                current = to;
            }
            PathCommand::Close => {
                builder.close();
                current = builder.start;
            }
        }
    }

    builder.finish()
}

/// Largest singular value of the linear part of `transform`
pub fn max_stretch(transform: &Affine) -> f64 {
    let (a, b, c, d) = (transform.m11, transform.m12, transform.m21, transform.m22);
    let sum = a * a + b * b + c * c + d * d;
    let det = a * d - b * c;
    let disc = (sum * sum - 4.0 * det * det).max(0.0);
    ((sum + disc.sqrt()) / 2.0).sqrt()
}

struct Builder<'t> {
    transform: &'t Affine,
    tolerance: f64,
    start: Point<f64>,
    /// Local-space points of the open subpath
    points: Vec<Point<f64>>,
    drawn: bool,
    non_finite: bool,
    hit_limit: bool,
    out: Flattened,
}

impl<'t> Builder<'t> {
    fn new(transform: &'t Affine, tolerance: f64) -> Self {
        Self {
            transform,
            tolerance,
            start: Point::new(0.0, 0.0),
            points: Vec::new(),
            drawn: false,
            non_finite: false,
            hit_limit: false,
            out: Flattened::default(),
        }
    }

    fn move_to(&mut self, to: Point<f64>) {
        if self.drawn {
            self.end_subpath(false);
        } else {
            // A move followed by another move just repositions
            self.points.clear();
        }
        self.start = to;
        self.non_finite = !(to.x.is_finite() && to.y.is_finite());
        self.push(to);
    }

    fn begin_drawing(&mut self, points: &[Point<f64>]) -> bool {
        if self.points.is_empty() {
            self.push(self.start);
        }
        self.drawn = true;
        if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            self.non_finite = true;
        }
        !self.non_finite
    }

    fn line_to(&mut self, to: Point<f64>) {
        if self.begin_drawing(&[to]) {
            self.push(to);
        }
    }

    fn cubic_to(&mut self, curve: &CubicBezierSegment<f64>) {
        if self.begin_drawing(&[curve.from, curve.ctrl1, curve.ctrl2, curve.to]) {
            self.subdivide_cubic(curve, 0);
        }
    }

    fn subdivide_cubic(&mut self, curve: &CubicBezierSegment<f64>, depth: u32) {
        let chord = LineSegment {
            from: curve.from,
            to: curve.to,
        };
        let deviation =
            segment_distance(&chord, curve.ctrl1).max(segment_distance(&chord, curve.ctrl2));

        if deviation <= self.tolerance {
            self.push(curve.to);
        } else if depth >= MAX_SUBDIVISION_DEPTH {
            self.hit_limit = true;
            self.push(curve.to);
        } else {
            let (first, second) = curve.split(0.5);
            self.subdivide_cubic(&first, depth + 1);
            self.subdivide_cubic(&second, depth + 1);
        }
    }

    fn arc_to(&mut self, arc: &SvgArc<f64>) {
        if !self.begin_drawing(&[arc.from, arc.to]) {
            return;
        }
        if !(arc.radii.x.is_finite() && arc.radii.y.is_finite()) {
            self.non_finite = true;
            return;
        }
        // Coincident endpoints draw nothing; zero radii draw a line
        if arc.from == arc.to {
            return;
        }
        if arc.is_straight_line() {
            self.push(arc.to);
            return;
        }

        self.subdivide_arc(&arc.to_arc(), 0.0, 1.0, 0);
        // Land exactly on the requested endpoint
        if let Some(last) = self.points.last_mut() {
            *last = arc.to;
        }
    }

    fn subdivide_arc(&mut self, arc: &lyon::geom::Arc<f64>, t0: f64, t1: f64, depth: u32) {
        let from = arc.sample(t0);
        let to = arc.sample(t1);
        let chord = LineSegment { from, to };
        let span = t1 - t0;
        let deviation = [0.25, 0.5, 0.75]
            .iter()
            .map(|f| segment_distance(&chord, arc.sample(t0 + span * f)))
            .fold(0.0, f64::max);
        // Pieces wider than a quarter turn are always split
        let narrow = (arc.sweep_angle.radians * span).abs() <= FRAC_PI_2;

        if narrow && deviation <= self.tolerance {
            self.push(to);
        } else if depth >= MAX_SUBDIVISION_DEPTH {
            self.hit_limit = true;
            self.push(to);
        } else {
            let mid = t0 + span / 2.0;
            self.subdivide_arc(arc, t0, mid, depth + 1);
            self.subdivide_arc(arc, mid, t1, depth + 1);
        }
    }

    fn close(&mut self) {
        if self.points.is_empty() {
            self.push(self.start);
        }
        self.drawn = true;
        self.push(self.start);
        self.end_subpath(true);
    }

    /// Append a vertex, skipping exact repeats
    fn push(&mut self, p: Point<f64>) {
        if self.points.last() != Some(&p) {
            self.points.push(p);
        }
    }

    fn end_subpath(&mut self, closed: bool) {
        let points = std::mem::take(&mut self.points);
        self.drawn = false;
        let non_finite = std::mem::replace(&mut self.non_finite, false);

        if non_finite {
            self.out.issues.push(FlattenIssue::NonFinite);
            return;
        }

        let mapped: Vec<Point<f64>> = points
            .iter()
            .map(|p| self.transform.transform_point(*p))
            .collect();
        if mapped.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            self.out.issues.push(FlattenIssue::NonFinite);
            return;
        }
        if mapped.len() < 2 || mapped.iter().all(|p| *p == mapped[0]) {
            self.out.issues.push(FlattenIssue::Degenerate);
            return;
        }

        self.out.polylines.push(Polyline::new(mapped, closed));
    }

    fn finish(mut self) -> Flattened {
        if !self.points.is_empty() {
            self.end_subpath(false);
        }
        if self.hit_limit {
            self.out.issues.push(FlattenIssue::SubdivisionLimit);
        }
        self.out
    }
}

/// Distance from `p` to the closed segment (or point, when degenerate)
fn segment_distance(segment: &LineSegment<f64>, p: Point<f64>) -> f64 {
    let v = segment.to - segment.from;
    let len2 = v.square_length();
    if len2 == 0.0 {
        return (p - segment.from).length();
    }
    let t = ((p - segment.from).dot(v) / len2).clamp(0.0, 1.0);
    (p - (segment.from + v * t)).length()
}
