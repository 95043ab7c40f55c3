// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Options for drawing stroked lines, and the conversion of a stroke into
//! an equivalent filled outline.
//!
//! Outlines come from [`kurbo::stroke`], one subpath at a time, with
//! [`kurbo::dash`] cutting dashed subpaths into pieces first. Every piece
//! of the outline winds positively, so filling it with the non-zero rule
//! yields the union of the pieces.

use kurbo::{
    BezPath, Cap, Circle, Join, ParamCurve, ParamCurveDeriv, ParamCurveNearest, PathEl, PathSeg,
    Point, Shape, Stroke, StrokeOpts, Vec2,
};

use crate::{new_error, Error, ErrorKind};

/// Options for angled joins in strokes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineJoin {
    /// Extend both edges until they meet, falling back to `Bevel` past the
    /// miter limit.
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Options for the cap of stroked lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineCap {
    /// Stop exactly at the endpoint.
    #[default]
    Butt,
    /// A half-disc centered on the endpoint.
    Round,
    /// A half-square extending past the endpoint.
    Square,
}

/// Options for drawing stroked lines.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrokeStyle {
    pub width: f64,
    pub line_join: LineJoin,
    pub line_cap: LineCap,
    pub miter_limit: f64,
    /// Alternating on and off lengths. Empty means a solid line.
    pub dash: Vec<f64>,
    pub dash_offset: f64,
}

/// The default miter limit.
pub const DEFAULT_MITER_LIMIT: f64 = 10.0;

/// The default line width.
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

impl Default for StrokeStyle {
    fn default() -> Self {
        StrokeStyle {
            width: DEFAULT_LINE_WIDTH,
            line_join: LineJoin::default(),
            line_cap: LineCap::default(),
            miter_limit: DEFAULT_MITER_LIMIT,
            dash: Vec::new(),
            dash_offset: 0.0,
        }
    }
}

impl StrokeStyle {
    pub fn new() -> StrokeStyle {
        StrokeStyle::default()
    }

    pub fn set_line_join(&mut self, line_join: LineJoin) {
        self.line_join = line_join;
    }

    pub fn set_line_cap(&mut self, line_cap: LineCap) {
        self.line_cap = line_cap;
    }

    /// Set the dash pattern, after checking it with [`validate_dash`].
    pub fn set_dash(&mut self, dashes: &[f64], offset: f64) -> Result<(), Error> {
        validate_dash(dashes)?;
        if !offset.is_finite() {
            return Err(new_error(ErrorKind::InvalidDash));
        }
        self.dash = dashes.to_vec();
        self.dash_offset = offset;
        Ok(())
    }

    pub fn set_miter_limit(&mut self, miter_limit: f64) {
        self.miter_limit = miter_limit;
    }

    /// Builder-style method for setting the line join.
    pub fn line_join(mut self, line_join: LineJoin) -> Self {
        self.line_join = line_join;
        self
    }

    /// Builder-style method for setting the line cap.
    pub fn line_cap(mut self, line_cap: LineCap) -> Self {
        self.line_cap = line_cap;
        self
    }

    /// Builder-style method for setting the width.
    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Builder-style method for setting the miter limit.
    pub fn miter_limit(mut self, miter_limit: f64) -> Self {
        self.miter_limit = miter_limit;
        self
    }

    /// Builder-style method for setting the dash pattern.
    ///
    /// The pattern is validated when it is used.
    pub fn dash(mut self, dashes: &[f64], offset: f64) -> Self {
        self.dash = dashes.to_vec();
        self.dash_offset = offset;
        self
    }

    /// The kurbo stroke for this style. Dashing is handled separately.
    fn to_kurbo(&self) -> Stroke {
        let join = match self.line_join {
            LineJoin::Miter => Join::Miter,
            LineJoin::Round => Join::Round,
            LineJoin::Bevel => Join::Bevel,
        };
        let cap = match self.line_cap {
            LineCap::Butt => Cap::Butt,
            LineCap::Round => Cap::Round,
            LineCap::Square => Cap::Square,
        };
        Stroke::new(self.width)
            .with_join(join)
            .with_miter_limit(self.miter_limit)
            .with_caps(cap)
    }

    /// The dash pattern with an even number of entries, or `None` for a
    /// solid line. An odd-length pattern is repeated so the on and off
    /// phases alternate.
    fn dash_pattern(&self) -> Option<Vec<f64>> {
        if self.dash.is_empty() || validate_dash(&self.dash).is_err() {
            return None;
        }
        Some(if self.dash.len() % 2 == 1 {
            self.dash.iter().chain(&self.dash).copied().collect()
        } else {
            self.dash.clone()
        })
    }
}

/// Check a dash array: every value finite and non-negative, and not all
/// zero. An empty array is a solid line and always valid.
pub fn validate_dash(dashes: &[f64]) -> Result<(), Error> {
    if dashes.is_empty() {
        return Ok(());
    }
    if dashes.iter().any(|d| !d.is_finite() || *d < 0.0) || dashes.iter().all(|d| *d == 0.0) {
        return Err(new_error(ErrorKind::InvalidDash));
    }
    Ok(())
}

/// Where a dash pattern begins after `offset` has been consumed.
#[derive(Clone, Copy, Debug, PartialEq)]
struct DashStart {
    /// The pattern starts inside an "on" entry.
    on: bool,
    /// The offset ends exactly where a non-empty dash ends. `kurbo::dash`
    /// reports the empty remainder of that dash as a zero-length piece at
    /// the start of each subpath, which must not be drawn as a dot.
    at_dash_end: bool,
}

impl DashStart {
    /// Follows the phase search of `kurbo::dash`.
    fn new(pattern: &[f64], offset: f64) -> DashStart {
        let period: f64 = pattern.iter().sum();
        let mut idx = 0;
        let mut remaining = pattern[0] - offset.rem_euclid(period);
        while remaining < 0.0 {
            idx = (idx + 1) % pattern.len();
            remaining += pattern[idx];
        }
        let on = idx % 2 == 0;
        let at_dash_end = on && remaining == 0.0 && pattern[idx] > 0.0;
        DashStart {
            on: on && !at_dash_end,
            at_dash_end,
        }
    }
}

/// Split path elements into subpaths, each starting at a `MoveTo`.
fn subpaths(els: &[PathEl]) -> Vec<&[PathEl]> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, el) in els.iter().enumerate().skip(1) {
        if matches!(el, PathEl::MoveTo(_)) {
            out.push(&els[start..i]);
            start = i;
        }
    }
    if start < els.len() {
        out.push(&els[start..]);
    }
    out
}

/// Every point an element references.
fn el_points(el: PathEl) -> impl Iterator<Item = Point> {
    let (n, pts) = match el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) => (1, [p, p, p]),
        PathEl::QuadTo(p1, p2) => (2, [p1, p2, p2]),
        PathEl::CurveTo(p1, p2, p3) => (3, [p1, p2, p3]),
        PathEl::ClosePath => (0, [Point::ZERO; 3]),
    };
    pts.into_iter().take(n)
}

/// The point a subpath collapses to, if it draws something but has no
/// length. A lone `MoveTo` draws nothing.
fn degenerate_point(sub: &[PathEl]) -> Option<Point> {
    let Some((PathEl::MoveTo(start), rest)) = sub.split_first() else {
        return None;
    };
    if rest.is_empty() {
        return None;
    }
    rest.iter()
        .flat_map(|el| el_points(*el))
        .all(|p| p == *start)
        .then_some(*start)
}

/// The unit direction of travel along `sub` at the point closest to `p`.
fn direction_at(sub: &[PathEl], p: Point) -> Option<Vec2> {
    let mut best: Option<(f64, Vec2)> = None;
    for seg in kurbo::segments(sub.iter().copied()) {
        let nearest = seg.nearest(p, 1e-9);
        let d = match seg {
            PathSeg::Line(l) => l.p1 - l.p0,
            PathSeg::Quad(q) => q.deriv().eval(nearest.t).to_vec2(),
            PathSeg::Cubic(c) => c.deriv().eval(nearest.t).to_vec2(),
        };
        if d.hypot2() > 0.0 && best.map_or(true, |(dist, _)| nearest.distance_sq < dist) {
            best = Some((nearest.distance_sq, d));
        }
    }
    best.map(|(_, d)| d.normalize())
}

/// The cap shape for a piece of stroke with no length: a disc for round
/// caps, and for square caps a square facing `dir`, or the axes when the
/// direction is unknown.
fn dot(out: &mut BezPath, style: &StrokeStyle, p: Point, dir: Option<Vec2>, tolerance: f64) {
    let half = style.width / 2.0;
    match style.line_cap {
        LineCap::Butt => (),
        LineCap::Round => out.extend(Circle::new(p, half).path_elements(tolerance)),
        LineCap::Square => {
            let d = dir.unwrap_or(Vec2::new(1.0, 0.0)) * half;
            let n = Vec2::new(-d.y, d.x);
            out.move_to(p + d + n);
            out.line_to(p - d + n);
            out.line_to(p - d - n);
            out.line_to(p + d - n);
            out.close_path();
        }
    }
}

/// Convert a user-space path into the outline of its stroke, in the same
/// space.
///
/// The dash pattern restarts at the offset for every subpath. On a closed
/// subpath, a dash that runs through the start point is joined into one
/// piece. Subpaths with non-finite coordinates are skipped. `tolerance`
/// bounds the error of curves in the outline.
pub fn stroke_outline(path: &BezPath, style: &StrokeStyle, tolerance: f64) -> BezPath {
    let mut out = BezPath::new();
    if !(style.width > 0.0 && style.width.is_finite()) {
        return out;
    }
    let stroke = style.to_kurbo();
    let opts = StrokeOpts::default();
    let pattern = style.dash_pattern();
    let start = pattern
        .as_deref()
        .map(|pattern| DashStart::new(pattern, style.dash_offset));

    for sub in subpaths(path.elements()) {
        if !sub.iter().flat_map(|el| el_points(*el)).all(|p| p.is_finite()) {
            continue;
        }
        if let Some(p) = degenerate_point(sub) {
            if start.map_or(true, |start| start.on) {
                dot(&mut out, style, p, None, tolerance);
            }
            continue;
        }
        let (Some(pattern), Some(start)) = (pattern.as_deref(), start) else {
            out.extend(&kurbo::stroke(sub.iter().copied(), &stroke, &opts, tolerance));
            continue;
        };
        let origin = match sub[0] {
            PathEl::MoveTo(p) => p,
            _ => Point::ZERO,
        };
        let dashed: BezPath = kurbo::dash(sub.iter().copied(), style.dash_offset, pattern).collect();
        for piece in subpaths(dashed.elements()) {
            match degenerate_point(piece) {
                Some(p) if start.at_dash_end && p == origin => (),
                Some(p) => dot(&mut out, style, p, direction_at(sub, p), tolerance),
                None => out.extend(&kurbo::stroke(piece.iter().copied(), &stroke, &opts, tolerance)),
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::{flatten, polyline_bounds, Polyline};
    use crate::rasterizer::{contains_point, FillRule};
    use crate::Path;

    fn polyline(points: &[(f64, f64)], closed: bool) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(points[0]);
        for &p in &points[1..] {
            path.line_to(p);
        }
        if closed {
            path.close_path();
        }
        path
    }

    fn outline(path: &BezPath, style: &StrokeStyle) -> Vec<Polyline> {
        let mut flat = Path::new();
        flat.extend_from_shape(&stroke_outline(path, style, 0.01), 0.01);
        flatten(&flat, 0.01)
    }

    fn inside(polys: &[Polyline], x: f64, y: f64) -> bool {
        contains_point(polys, FillRule::NonZero, Point::new(x, y))
    }

    #[test]
    fn dash_validation() {
        assert!(validate_dash(&[]).is_ok());
        assert!(validate_dash(&[1.0, 0.0]).is_ok());
        assert_eq!(
            validate_dash(&[0.0, 0.0]).unwrap_err().kind(),
            ErrorKind::InvalidDash
        );
        assert_eq!(
            validate_dash(&[1.0, -1.0]).unwrap_err().kind(),
            ErrorKind::InvalidDash
        );
        let mut style = StrokeStyle::new();
        assert!(style.set_dash(&[2.0], f64::NAN).is_err());
        assert!(style.dash.is_empty());
    }

    #[test]
    fn dashes_split_a_line() {
        let style = StrokeStyle::new().dash(&[2.0, 3.0], 0.0);
        let polys = outline(&polyline(&[(0.0, 0.0), (10.0, 0.0)], false), &style);
        assert!(inside(&polys, 1.0, 0.0));
        assert!(!inside(&polys, 3.0, 0.0));
        assert!(inside(&polys, 6.0, 0.0));
        assert!(!inside(&polys, 8.0, 0.0));
    }

    #[test]
    fn odd_dash_array_is_repeated() {
        // [2] behaves like [2, 2], so an offset of 2 starts in a gap.
        let style = StrokeStyle::new().dash(&[2.0], 2.0);
        let polys = outline(&polyline(&[(0.0, 0.0), (10.0, 0.0)], false), &style);
        assert!(!inside(&polys, 1.0, 0.0));
        assert!(inside(&polys, 3.0, 0.0));
        assert!(!inside(&polys, 5.0, 0.0));
        assert!(inside(&polys, 7.0, 0.0));
    }

    #[test]
    fn dash_offset_shifts_pattern() {
        let line = polyline(&[(0.0, 0.0), (10.0, 0.0)], false);
        let style = StrokeStyle::new().dash(&[2.0, 3.0], 3.0);
        // Offset 3 lands one unit into the gap, which has two units left.
        let polys = outline(&line, &style);
        assert!(!inside(&polys, 1.0, 0.0));
        assert!(inside(&polys, 3.0, 0.0));
        let negative = StrokeStyle::new().dash(&[2.0, 3.0], -2.0);
        assert_eq!(
            stroke_outline(&line, &negative, 0.01),
            stroke_outline(&line, &style, 0.01)
        );
    }

    #[test]
    fn offset_at_dash_end_draws_no_dot() {
        let style = StrokeStyle::new()
            .line_cap(LineCap::Round)
            .dash(&[2.0, 2.0], 2.0);
        let polys = outline(&polyline(&[(0.0, 0.0), (10.0, 0.0)], false), &style);
        assert!(!inside(&polys, -0.5, 0.0));
        assert!(inside(&polys, 1.5, 0.0));
    }

    #[test]
    fn closed_dash_through_start_is_joined() {
        let square = polyline(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)], true);
        // Perimeter 16, starting halfway into a dash. Split at the start,
        // the two halves would leave the outer corner uncovered.
        let style = StrokeStyle::new().dash(&[4.0, 4.0], 2.0);
        let polys = outline(&square, &style);
        assert!(inside(&polys, -0.5, -0.5));
        assert!(inside(&polys, 1.0, 0.0));
        assert!(inside(&polys, 0.0, 1.0));
        assert!(!inside(&polys, 4.0, 0.0));
    }

    #[test]
    fn butt_line_covers_only_its_length() {
        let style = StrokeStyle::new().width(4.0);
        let polys = outline(&polyline(&[(0.0, 0.0), (10.0, 0.0)], false), &style);
        assert!(inside(&polys, 5.0, 1.9));
        assert!(!inside(&polys, 5.0, 2.1));
        assert!(!inside(&polys, -0.5, 0.0));
        assert_eq!(
            polyline_bounds(&polys),
            Some(kurbo::Rect::new(0.0, -2.0, 10.0, 2.0))
        );
    }

    #[test]
    fn caps_extend_the_line() {
        let line = polyline(&[(0.0, 0.0), (10.0, 0.0)], false);
        let square = StrokeStyle::new().width(4.0).line_cap(LineCap::Square);
        let polys = outline(&line, &square);
        assert!(inside(&polys, -1.9, 1.9));
        let round = StrokeStyle::new().width(4.0).line_cap(LineCap::Round);
        let polys = outline(&line, &round);
        assert!(inside(&polys, -1.9, 0.0));
        assert!(!inside(&polys, -1.9, 1.9));
    }

    #[test]
    fn miter_falls_back_to_bevel() {
        // A right angle: the miter ratio is sqrt(2).
        let corner = polyline(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], false);
        let miter = StrokeStyle::new().width(2.0);
        let polys = outline(&corner, &miter);
        assert!(inside(&polys, 10.9, -0.9));
        let limited = StrokeStyle::new().width(2.0).miter_limit(1.4);
        let polys = outline(&corner, &limited);
        assert!(!inside(&polys, 10.9, -0.9));
        assert!(inside(&polys, 10.4, -0.4));
    }

    #[test]
    fn zero_length_subpaths() {
        let point = polyline(&[(5.0, 5.0), (5.0, 5.0)], false);
        let butt = StrokeStyle::new().width(2.0);
        assert!(stroke_outline(&point, &butt, 0.01).is_empty());
        let round = StrokeStyle::new().width(2.0).line_cap(LineCap::Round);
        assert!(inside(&outline(&point, &round), 5.5, 5.0));
        let square = StrokeStyle::new().width(2.0).line_cap(LineCap::Square);
        assert!(inside(&outline(&point, &square), 5.9, 5.9));
    }

    #[test]
    fn zero_length_dashes_face_along_the_path() {
        let diagonal = polyline(&[(0.0, 0.0), (10.0, 10.0)], false);
        let style = StrokeStyle::new()
            .width(2.0)
            .line_cap(LineCap::Square)
            .dash(&[0.0, 5.0], 0.0);
        let polys = outline(&diagonal, &style);
        // The second dot sits 5 units along the diagonal.
        let c = 5.0 / 2f64.sqrt();
        assert!(inside(&polys, c, c));
        // A square turned by 45 degrees reaches further along the axes
        // and less far along the diagonals than an axis-aligned one.
        assert!(inside(&polys, c + 1.3, c));
        assert!(!inside(&polys, c + 0.95, c + 0.95));
    }

    #[test]
    fn zero_width_draws_nothing() {
        let style = StrokeStyle::new().width(0.0);
        let line = polyline(&[(0.0, 0.0), (10.0, 0.0)], false);
        assert!(stroke_outline(&line, &style, 0.01).is_empty());
    }

    #[test]
    fn crossing_strokes_stay_filled() {
        let style = StrokeStyle::new().line_join(LineJoin::Round);
        let path = polyline(&[(0.0, 0.0), (10.0, 0.0), (5.0, 5.0), (5.0, -5.0)], false);
        let polys = outline(&path, &style);
        assert!(inside(&polys, 5.0, 0.0));
        assert!(inside(&polys, 5.0, -4.0));
        assert!(inside(&polys, 2.0, 0.5));
    }

    #[test]
    fn non_finite_subpaths_are_skipped() {
        let mut path = polyline(&[(0.0, 0.0), (10.0, 0.0)], false);
        path.move_to((0.0, 5.0));
        path.line_to((f64::NAN, 5.0));
        let polys = outline(&path, &StrokeStyle::new());
        assert!(inside(&polys, 5.0, 0.0));
        assert!(polys.iter().flat_map(|p| &p.points).all(|p| p.is_finite()));
    }
}
