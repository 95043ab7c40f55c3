// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint sources: solid colors, gradients and surfaces.

use std::sync::Arc;

use kurbo::Point;

use crate::{new_error, Color, Error, ErrorKind, Matrix, Surface};

/// How a pattern is sampled outside its natural extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Extend {
    /// Transparent outside the extent.
    None,
    /// Tile the pattern.
    Repeat,
    /// Tile the pattern, mirroring every other copy.
    Reflect,
    /// Continue the edge value.
    Pad,
}

/// How a surface pattern is resampled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Filter {
    /// Same as `Nearest`.
    Fast,
    /// Same as `Bilinear`.
    #[default]
    Good,
    /// Same as `Bilinear`.
    Best,
    Nearest,
    Bilinear,
}

impl Filter {
    pub fn is_nearest(self) -> bool {
        matches!(self, Filter::Fast | Filter::Nearest)
    }
}

/// Specification of a gradient stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// The offset of the stop, in `[0, 1]`.
    pub pos: f64,
    /// The color at that stop.
    pub color: Color,
}

/// A flexible, ergonomic way to describe gradient stops.
pub trait GradientStops {
    fn to_vec(self) -> Vec<GradientStop>;
}

impl GradientStops for Vec<GradientStop> {
    fn to_vec(self) -> Vec<GradientStop> {
        self
    }
}

impl<'a> GradientStops for &'a [GradientStop] {
    fn to_vec(self) -> Vec<GradientStop> {
        self.to_owned()
    }
}

// Generate equally-spaced stops.
impl<'a> GradientStops for &'a [Color] {
    fn to_vec(self) -> Vec<GradientStop> {
        if self.is_empty() {
            Vec::new()
        } else {
            let denom = (self.len() - 1).max(1) as f64;
            self.iter()
                .enumerate()
                .map(|(i, c)| GradientStop {
                    pos: (i as f64) / denom,
                    color: *c,
                })
                .collect()
        }
    }
}

impl GradientStops for (Color, Color) {
    fn to_vec(self) -> Vec<GradientStop> {
        let stops: &[Color] = &[self.0, self.1];
        GradientStops::to_vec(stops)
    }
}

impl GradientStops for (Color, Color, Color) {
    fn to_vec(self) -> Vec<GradientStop> {
        let stops: &[Color] = &[self.0, self.1, self.2];
        GradientStops::to_vec(stops)
    }
}

/// Insert a stop after any stops with the same offset.
fn insert_stop(stops: &mut Vec<GradientStop>, stop: GradientStop) -> Result<(), Error> {
    if !(0.0..=1.0).contains(&stop.pos) {
        return Err(new_error(ErrorKind::InvalidStopOffset));
    }
    let i = stops.partition_point(|s| s.pos <= stop.pos);
    stops.insert(i, stop);
    Ok(())
}

fn collect_stops(stops: impl GradientStops) -> Result<Vec<GradientStop>, Error> {
    let mut out = Vec::new();
    for stop in stops.to_vec() {
        insert_stop(&mut out, stop)?;
    }
    Ok(out)
}

/// A linear gradient between two points.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    /// The start point (corresponding to pos 0.0).
    pub start: Point,
    /// The end point (corresponding to pos 1.0).
    pub end: Point,
    stops: Vec<GradientStop>,
}

impl LinearGradient {
    /// A gradient with no stops yet.
    pub fn new(start: impl Into<Point>, end: impl Into<Point>) -> LinearGradient {
        LinearGradient {
            start: start.into(),
            end: end.into(),
            stops: Vec::new(),
        }
    }

    /// Builder-style method to replace the stops.
    pub fn with_stops(mut self, stops: impl GradientStops) -> Result<Self, Error> {
        self.stops = collect_stops(stops)?;
        Ok(self)
    }

    /// Add a stop; `offset` must be in `[0, 1]`.
    pub fn add_color_stop(&mut self, offset: f64, color: Color) -> Result<(), Error> {
        insert_stop(&mut self.stops, GradientStop { pos: offset, color })
    }

    /// The stops, sorted by offset.
    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }
}

/// A gradient between two circles.
///
/// The color at offset `t` is drawn on the circle interpolated between
/// `(c0, r0)` at 0 and `(c1, r1)` at 1. Where several circles cover a point,
/// the one with the largest `t` wins.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradient {
    pub c0: Point,
    pub r0: f64,
    pub c1: Point,
    pub r1: f64,
    stops: Vec<GradientStop>,
}

impl RadialGradient {
    pub fn new(c0: impl Into<Point>, r0: f64, c1: impl Into<Point>, r1: f64) -> RadialGradient {
        RadialGradient {
            c0: c0.into(),
            r0,
            c1: c1.into(),
            r1,
            stops: Vec::new(),
        }
    }

    /// A simple radial gradient: from the center out to `radius`.
    pub fn new_centered(center: impl Into<Point>, radius: f64) -> RadialGradient {
        let center = center.into();
        RadialGradient::new(center, 0.0, center, radius)
    }

    /// Builder-style method to replace the stops.
    pub fn with_stops(mut self, stops: impl GradientStops) -> Result<Self, Error> {
        self.stops = collect_stops(stops)?;
        Ok(self)
    }

    /// Add a stop; `offset` must be in `[0, 1]`.
    pub fn add_color_stop(&mut self, offset: f64, color: Color) -> Result<(), Error> {
        insert_stop(&mut self.stops, GradientStop { pos: offset, color })
    }

    /// The stops, sorted by offset.
    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }
}

/// The kinds of paint a [`Pattern`] can carry.
#[derive(Clone, Debug, PartialEq)]
pub enum PatternKind {
    Solid(Color),
    Linear(LinearGradient),
    Radial(RadialGradient),
    Surface(Arc<Surface>),
}

#[derive(Clone, Debug)]
struct PatternInner {
    kind: PatternKind,
    matrix: Matrix,
    extend: Extend,
    filter: Filter,
}

/// A shared paint source.
///
/// Cloning a pattern is cheap and shares it. The setters are copy-on-write:
/// a graphics state that already holds this pattern keeps the old
/// attributes. Two patterns compare equal only if they are the same
/// allocation.
#[derive(Clone, Debug)]
pub struct Pattern(Arc<PatternInner>);

impl Pattern {
    fn from_kind(kind: PatternKind, extend: Extend) -> Pattern {
        Pattern(Arc::new(PatternInner {
            kind,
            matrix: Matrix::IDENTITY,
            extend,
            filter: Filter::default(),
        }))
    }

    pub fn solid(color: Color) -> Pattern {
        Pattern::from_kind(PatternKind::Solid(color), Extend::Pad)
    }

    pub fn linear(gradient: LinearGradient) -> Pattern {
        Pattern::from_kind(PatternKind::Linear(gradient), Extend::Pad)
    }

    pub fn radial(gradient: RadialGradient) -> Pattern {
        Pattern::from_kind(PatternKind::Radial(gradient), Extend::Pad)
    }

    pub fn surface(surface: Arc<Surface>) -> Pattern {
        Pattern::from_kind(PatternKind::Surface(surface), Extend::None)
    }

    pub fn kind(&self) -> &PatternKind {
        &self.0.kind
    }

    /// The map from user space to pattern space.
    pub fn matrix(&self) -> Matrix {
        self.0.matrix
    }

    pub fn extend(&self) -> Extend {
        self.0.extend
    }

    pub fn filter(&self) -> Filter {
        self.0.filter
    }

    /// Set the map from user space to pattern space.
    ///
    /// A matrix that cannot be inverted is rejected.
    pub fn set_matrix(&mut self, matrix: Matrix) -> Result<(), Error> {
        if !matrix.is_invertible() {
            return Err(new_error(ErrorKind::InvalidMatrix));
        }
        Arc::make_mut(&mut self.0).matrix = matrix;
        Ok(())
    }

    pub fn set_extend(&mut self, extend: Extend) {
        Arc::make_mut(&mut self.0).extend = extend;
    }

    pub fn set_filter(&mut self, filter: Filter) {
        Arc::make_mut(&mut self.0).filter = filter;
    }

    /// Builder-style method for setting the extend mode.
    pub fn with_extend(mut self, extend: Extend) -> Self {
        self.set_extend(extend);
        self
    }

    /// Builder-style method for setting the filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.set_filter(filter);
        self
    }

    /// True if both handles share one pattern.
    pub fn ptr_eq(a: &Pattern, b: &Pattern) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Pattern) -> bool {
        Pattern::ptr_eq(self, other)
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern::solid(Color::BLACK)
    }
}

impl From<Color> for Pattern {
    fn from(color: Color) -> Pattern {
        Pattern::solid(color)
    }
}
