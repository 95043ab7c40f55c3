// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utilities for flattening

use kurbo::{Point, Rect};

use crate::{Path, PathEl};

/// The default flattening tolerance, in device pixels.
pub const DEFAULT_TOLERANCE: f64 = 0.5;

/// Subdivision stops at this depth even if the curve is not yet flat.
pub const MAX_DEPTH: u32 = 12;

/// One flattened subpath.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    /// Whether the subpath ended with `ClosePath`.
    pub closed: bool,
}

impl Polyline {
    /// Iterate over the segments, including the closing segment if closed.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let closing = match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(&first), Some(&last)) if first != last => Some((last, first)),
            _ => None,
        };
        self.points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing)
    }
}

/// The bounds of all points in a set of polylines.
pub fn polyline_bounds(lines: &[Polyline]) -> Option<Rect> {
    let mut points = lines.iter().flat_map(|l| l.points.iter());
    let first = *points.next()?;
    Some(points.fold(Rect::from_points(first, first), |r, p| r.union_pt(*p)))
}

/// Distance from `p` to the infinite line through `a` and `b`, or to `a`
/// when the chord is degenerate.
fn distance_to_chord(p: Point, a: Point, b: Point) -> f64 {
    let chord = b - a;
    let len = chord.hypot();
    if len < 1e-12 {
        return (p - a).hypot();
    }
    (chord.cross(p - a) / len).abs()
}

/// Flatten a cubic Bézier by recursive De Casteljau subdivision.
///
/// The start point is not emitted; every other vertex is passed to `emit`,
/// ending with `p3`.
pub fn flatten_cubic(
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
    tolerance: f64,
    emit: &mut impl FnMut(Point),
) {
    subdivide(p0, p1, p2, p3, tolerance, 0, emit);
}

fn subdivide(
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
    tolerance: f64,
    depth: u32,
    emit: &mut impl FnMut(Point),
) {
    let flatness = distance_to_chord(p1, p0, p3).max(distance_to_chord(p2, p0, p3));
    if flatness <= tolerance || depth >= MAX_DEPTH {
        emit(p3);
        return;
    }
    let p01 = p0.midpoint(p1);
    let p12 = p1.midpoint(p2);
    let p23 = p2.midpoint(p3);
    let p012 = p01.midpoint(p12);
    let p123 = p12.midpoint(p23);
    let mid = p012.midpoint(p123);
    subdivide(p0, p01, p012, mid, tolerance, depth + 1, emit);
    subdivide(mid, p123, p23, p3, tolerance, depth + 1, emit);
}

/// Flatten a path into polylines, one per subpath.
///
/// Subpaths consisting of a lone `MoveTo` are dropped. Non-finite
/// coordinates are skipped.
pub fn flatten(path: &Path, tolerance: f64) -> Vec<Polyline> {
    let tolerance = if tolerance > 0.0 {
        tolerance
    } else {
        DEFAULT_TOLERANCE
    };
    let mut out = Vec::new();
    let mut current = Polyline::default();
    let mut has_segment = false;
    let mut last = Point::ZERO;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                finish(&mut current, &mut has_segment, &mut out);
                current.points.push(p);
                last = p;
            }
            PathEl::LineTo(p) => {
                if p.is_finite() {
                    current.points.push(p);
                    has_segment = true;
                    last = p;
                }
            }
            PathEl::CurveTo(p1, p2, p3) => {
                if p1.is_finite() && p2.is_finite() && p3.is_finite() {
                    flatten_cubic(last, p1, p2, p3, tolerance, &mut |p| current.points.push(p));
                    has_segment = true;
                    last = p3;
                }
            }
            PathEl::ClosePath => {
                current.closed = true;
                has_segment = true;
                finish(&mut current, &mut has_segment, &mut out);
            }
        }
    }
    finish(&mut current, &mut has_segment, &mut out);
    out
}

fn finish(current: &mut Polyline, has_segment: &mut bool, out: &mut Vec<Polyline>) {
    let line = std::mem::take(current);
    if *has_segment {
        out.push(line);
    }
    *has_segment = false;
}

impl Path {
    /// A copy of this path with every curve replaced by line segments.
    pub fn flattened(&self, tolerance: f64) -> Path {
        let mut out = Path::new();
        for line in flatten(self, tolerance) {
            let mut points = line.points.iter();
            if let Some(&first) = points.next() {
                out.move_to(first);
                for &p in points {
                    out.line_to(p);
                }
                if line.closed {
                    out.close_path();
                }
            }
        }
        out
    }
}
