// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path construction.

use std::f64::consts::TAU;

use kurbo::{Arc, BezPath, CubicBez, ParamCurveExtrema, Point, QuadBez, Rect, Shape, Vec2};

use crate::{new_error, Error, ErrorKind, Matrix};

/// One element of a [`Path`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathEl {
    MoveTo(Point),
    LineTo(Point),
    /// A cubic Bézier: two control points and the end point.
    CurveTo(Point, Point, Point),
    /// Closes the current subpath with a line back to its start.
    ClosePath,
}

/// A sequence of path elements plus the builder state needed for
/// relative operations and implicit subpaths.
///
/// The builder follows a small state machine. Without a current point,
/// `line_to` acts like `move_to` and `curve_to` moves to its first control
/// point. After `close_path` the current point is the start of the closed
/// subpath, and the next drawing operation opens a new subpath there.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    elements: Vec<PathEl>,
    current: Option<Point>,
    subpath_start: Point,
    /// Set after `close_path`; the next segment needs an explicit `MoveTo`.
    needs_move_to: bool,
}

impl Path {
    /// Create an empty path.
    pub fn new() -> Path {
        Path::default()
    }

    pub fn elements(&self) -> &[PathEl] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn current_point(&self) -> Option<Point> {
        self.current
    }

    pub fn has_current_point(&self) -> bool {
        self.current.is_some()
    }

    /// Remove all elements and the current point.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.current = None;
        self.needs_move_to = false;
    }

    /// Forget the current point without closing, so the next segment
    /// starts a new subpath.
    pub fn new_sub_path(&mut self) {
        self.current = None;
        self.needs_move_to = false;
    }

    pub fn move_to(&mut self, p: impl Into<Point>) {
        let p = p.into();
        if let Some(PathEl::MoveTo(last)) = self.elements.last_mut() {
            *last = p;
        } else {
            self.elements.push(PathEl::MoveTo(p));
        }
        self.current = Some(p);
        self.subpath_start = p;
        self.needs_move_to = false;
    }

    /// Make sure the next segment has a subpath to attach to.
    fn ensure_subpath(&mut self, from: Point) {
        if self.needs_move_to {
            self.elements.push(PathEl::MoveTo(from));
            self.subpath_start = from;
            self.needs_move_to = false;
        }
    }

    pub fn line_to(&mut self, p: impl Into<Point>) {
        let p = p.into();
        match self.current {
            None => self.move_to(p),
            Some(cur) => {
                self.ensure_subpath(cur);
                self.elements.push(PathEl::LineTo(p));
                self.current = Some(p);
            }
        }
    }

    pub fn curve_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>, p3: impl Into<Point>) {
        let (p1, p2, p3) = (p1.into(), p2.into(), p3.into());
        let cur = match self.current {
            Some(cur) => cur,
            None => {
                self.move_to(p1);
                p1
            }
        };
        self.ensure_subpath(cur);
        self.elements.push(PathEl::CurveTo(p1, p2, p3));
        self.current = Some(p3);
    }

    pub fn close_path(&mut self) {
        if self.current.is_none() || self.needs_move_to {
            return;
        }
        self.elements.push(PathEl::ClosePath);
        self.current = Some(self.subpath_start);
        self.needs_move_to = true;
    }

    fn require_current(&self) -> Result<Point, Error> {
        self.current.ok_or_else(|| new_error(ErrorKind::NoCurrentPoint))
    }

    pub fn rel_move_to(&mut self, d: impl Into<Vec2>) -> Result<(), Error> {
        let cur = self.require_current()?;
        self.move_to(cur + d.into());
        Ok(())
    }

    pub fn rel_line_to(&mut self, d: impl Into<Vec2>) -> Result<(), Error> {
        let cur = self.require_current()?;
        self.line_to(cur + d.into());
        Ok(())
    }

    pub fn rel_curve_to(
        &mut self,
        d1: impl Into<Vec2>,
        d2: impl Into<Vec2>,
        d3: impl Into<Vec2>,
    ) -> Result<(), Error> {
        let cur = self.require_current()?;
        self.curve_to(cur + d1.into(), cur + d2.into(), cur + d3.into());
        Ok(())
    }

    /// A closed rectangle subpath.
    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to((x, y));
        self.line_to((x + width, y));
        self.line_to((x + width, y + height));
        self.line_to((x, y + height));
        self.close_path();
    }

    /// A circular arc in the direction of increasing angles.
    ///
    /// If there is a current point, a line is drawn from it to the start
    /// of the arc. An `angle2` below `angle1` is moved up by whole turns;
    /// a sweep of more than a full turn is reduced to at most two turns.
    pub fn arc(&mut self, center: impl Into<Point>, radius: f64, angle1: f64, angle2: f64) {
        let sweep = normalize_sweep(angle2 - angle1);
        self.arc_segments(center.into(), radius, angle1, sweep);
    }

    /// A circular arc in the direction of decreasing angles.
    pub fn arc_negative(&mut self, center: impl Into<Point>, radius: f64, angle1: f64, angle2: f64) {
        let sweep = -normalize_sweep(angle1 - angle2);
        self.arc_segments(center.into(), radius, angle1, sweep);
    }

    fn arc_segments(&mut self, center: Point, radius: f64, angle1: f64, sweep: f64) {
        let start = center + Vec2::from_angle(angle1) * radius;
        self.line_to(start);
        if sweep == 0.0 || !sweep.is_finite() || !(radius > 0.0) {
            return;
        }
        let arc = Arc {
            center,
            radii: Vec2::new(radius, radius),
            start_angle: angle1,
            sweep_angle: sweep,
            x_rotation: 0.0,
        };
        for el in arc.append_iter(radius * ARC_TOLERANCE) {
            if let kurbo::PathEl::CurveTo(p1, p2, p3) = el {
                self.curve_to(p1, p2, p3);
            }
        }
    }

    /// Append every element of `other`.
    pub fn append(&mut self, other: &Path) {
        for el in other.elements() {
            self.push_el(*el);
        }
    }

    fn push_el(&mut self, el: PathEl) {
        match el {
            PathEl::MoveTo(p) => self.move_to(p),
            PathEl::LineTo(p) => self.line_to(p),
            PathEl::CurveTo(p1, p2, p3) => self.curve_to(p1, p2, p3),
            PathEl::ClosePath => self.close_path(),
        }
    }

    /// Append a [`kurbo::Shape`], raising quadratic segments to cubics.
    pub fn extend_from_shape(&mut self, shape: &impl Shape, tolerance: f64) {
        let mut last = Point::ZERO;
        for el in shape.path_elements(tolerance) {
            match el {
                kurbo::PathEl::MoveTo(p) => {
                    self.move_to(p);
                    last = p;
                }
                kurbo::PathEl::LineTo(p) => {
                    self.line_to(p);
                    last = p;
                }
                kurbo::PathEl::QuadTo(p1, p2) => {
                    let c = QuadBez::new(last, p1, p2).raise();
                    self.curve_to(c.p1, c.p2, c.p3);
                    last = p2;
                }
                kurbo::PathEl::CurveTo(p1, p2, p3) => {
                    self.curve_to(p1, p2, p3);
                    last = p3;
                }
                kurbo::PathEl::ClosePath => {
                    self.close_path();
                    last = self.current.unwrap_or(last);
                }
            }
        }
    }

    /// A copy of this path with every point mapped through `matrix`.
    pub fn transform(&self, matrix: &Matrix) -> Path {
        let map = |p: Point| matrix.transform_point(p);
        let elements = self
            .elements
            .iter()
            .map(|el| match *el {
                PathEl::MoveTo(p) => PathEl::MoveTo(map(p)),
                PathEl::LineTo(p) => PathEl::LineTo(map(p)),
                PathEl::CurveTo(p1, p2, p3) => PathEl::CurveTo(map(p1), map(p2), map(p3)),
                PathEl::ClosePath => PathEl::ClosePath,
            })
            .collect();
        Path {
            elements,
            current: self.current.map(map),
            subpath_start: map(self.subpath_start),
            needs_move_to: self.needs_move_to,
        }
    }

    /// A copy of this path translated by `offset`.
    pub fn translated(&self, offset: Vec2) -> Path {
        self.transform(&Matrix::new_translate(offset.x, offset.y))
    }

    /// The tight bounds of the drawn segments, or `None` if nothing is drawn.
    ///
    /// A lone `MoveTo` does not contribute.
    pub fn extents(&self) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        let mut add = |r: Rect| {
            bounds = Some(bounds.map_or(r, |b| b.union(r)));
        };
        let mut last = Point::ZERO;
        let mut start = Point::ZERO;
        for el in &self.elements {
            match *el {
                PathEl::MoveTo(p) => {
                    last = p;
                    start = p;
                }
                PathEl::LineTo(p) => {
                    add(Rect::from_points(last, p));
                    last = p;
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    add(ParamCurveExtrema::bounding_box(&CubicBez::new(last, p1, p2, p3)));
                    last = p3;
                }
                PathEl::ClosePath => {
                    add(Rect::from_points(last, start));
                    last = start;
                }
            }
        }
        bounds
    }
}

/// Arc flattening tolerance, relative to the radius.
const ARC_TOLERANCE: f64 = 1e-6;

/// Wrap a negative sweep into `[0, 2π)` and cut a sweep of more than one
/// turn down to less than two turns.
fn normalize_sweep(sweep: f64) -> f64 {
    if sweep < 0.0 {
        sweep.rem_euclid(TAU)
    } else if sweep > TAU {
        TAU + (sweep - TAU).rem_euclid(TAU)
    } else {
        sweep
    }
}

impl From<&Path> for BezPath {
    fn from(path: &Path) -> BezPath {
        let mut out = BezPath::new();
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => out.move_to(p),
                PathEl::LineTo(p) => out.line_to(p),
                PathEl::CurveTo(p1, p2, p3) => out.curve_to(p1, p2, p3),
                PathEl::ClosePath => out.close_path(),
            }
        }
        out
    }
}
