// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolving a [`Pattern`] to a color at a device-space point.

use kurbo::Point;

use crate::color::Premul;
use crate::{Color, Extend, GradientStop, Matrix, Pattern, PatternKind, Surface};

/// Samples a pattern in device space.
///
/// The device-to-pattern map is the inverse of the user-to-device matrix
/// that was in force when the pattern was made the source, followed by the
/// pattern's own matrix.
#[derive(Debug)]
pub struct Sampler<'a> {
    pattern: &'a Pattern,
    device_to_pattern: Option<Matrix>,
}

impl<'a> Sampler<'a> {
    pub fn new(pattern: &'a Pattern, source_matrix: &Matrix) -> Sampler<'a> {
        let device_to_pattern = match source_matrix.invert() {
            Ok(inverse) => {
                let map = Matrix::multiply(&inverse, &pattern.matrix());
                map.is_invertible().then_some(map)
            }
            Err(_) => None,
        };
        if device_to_pattern.is_none() {
            log::warn!("pattern matrix is not invertible, sampling as transparent");
        }
        Sampler {
            pattern,
            device_to_pattern,
        }
    }

    /// The non-premultiplied color at a device-space point.
    pub fn sample(&self, p: Point) -> Color {
        self.sample_premul(p).unpremultiply()
    }

    pub(crate) fn sample_premul(&self, p: Point) -> Premul {
        let Some(map) = &self.device_to_pattern else {
            return Premul::TRANSPARENT;
        };
        let extend = self.pattern.extend();
        match self.pattern.kind() {
            PatternKind::Solid(color) => color.premultiply(),
            PatternKind::Linear(g) => {
                let q = map.transform_point(p);
                let d = g.end - g.start;
                let len2 = d.hypot2();
                let t = if len2 > 0.0 {
                    (q - g.start).dot(d) / len2
                } else if extend == Extend::Pad {
                    // Degenerate: everything is past the end.
                    1.0
                } else {
                    return Premul::TRANSPARENT;
                };
                lookup(g.stops(), extend, t)
            }
            PatternKind::Radial(g) => {
                let q = map.transform_point(p);
                match radial_t(g.c0, g.r0, g.c1, g.r1, q, extend == Extend::None) {
                    Some(t) => lookup(g.stops(), extend, t),
                    None => Premul::TRANSPARENT,
                }
            }
            PatternKind::Surface(surface) => {
                let q = map.transform_point(p);
                if self.pattern.filter().is_nearest() {
                    texel(surface, extend, q.x.floor(), q.y.floor())
                } else {
                    bilinear(surface, extend, q.x - 0.5, q.y - 0.5)
                }
            }
        }
    }
}

/// Apply an extend mode to a gradient offset; `None` means transparent.
fn extend_t(extend: Extend, t: f64) -> Option<f64> {
    if !t.is_finite() {
        return None;
    }
    match extend {
        Extend::None => (0.0..=1.0).contains(&t).then_some(t),
        Extend::Pad => Some(t.clamp(0.0, 1.0)),
        Extend::Repeat => Some(t - t.floor()),
        Extend::Reflect => {
            let u = t.rem_euclid(2.0);
            Some(if u > 1.0 { 2.0 - u } else { u })
        }
    }
}

/// The color of a stop list at offset `t`.
///
/// Neighbouring stops are interpolated before premultiplication, so a stop
/// fading to transparent keeps its hue.
fn lookup(stops: &[GradientStop], extend: Extend, t: f64) -> Premul {
    let Some(t) = extend_t(extend, t) else {
        return Premul::TRANSPARENT;
    };
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Premul::TRANSPARENT;
    };
    if t <= first.pos {
        return first.color.premultiply();
    }
    if t >= last.pos {
        return last.color.premultiply();
    }
    let i = stops.partition_point(|s| s.pos <= t);
    let (a, b) = (&stops[i - 1], &stops[i]);
    let span = b.pos - a.pos;
    if span <= 0.0 {
        return b.color.premultiply();
    }
    let f = (t - a.pos) / span;
    a.color.lerp(&b.color, f).premultiply()
}

/// Solve for the largest `t` with `|q - c(t)| = r(t)` and `r(t) >= 0`.
///
/// With `unit_only`, only roots in `[0, 1]` are considered.
fn radial_t(c0: Point, r0: f64, c1: Point, r1: f64, q: Point, unit_only: bool) -> Option<f64> {
    let cd = c1 - c0;
    let dr = r1 - r0;
    let pd = q - c0;
    let a = cd.hypot2() - dr * dr;
    let b = pd.dot(cd) + r0 * dr;
    let c = pd.hypot2() - r0 * r0;

    let accept = |t: f64| t.is_finite() && r0 + t * dr >= 0.0 && (!unit_only || (0.0..=1.0).contains(&t));

    if a.abs() < 1e-12 {
        // a t^2 - 2 b t + c = 0 degenerates to a linear equation.
        if b == 0.0 {
            return None;
        }
        let t = c / (2.0 * b);
        return accept(t).then_some(t);
    }
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t1 = (b + sq) / a;
    let t2 = (b - sq) / a;
    let (hi, lo) = if t1 >= t2 { (t1, t2) } else { (t2, t1) };
    if accept(hi) {
        Some(hi)
    } else if accept(lo) {
        Some(lo)
    } else {
        None
    }
}

/// Map an integer texel coordinate into `0..size` per the extend mode.
fn extend_index(extend: Extend, i: i64, size: i64) -> Option<i64> {
    match extend {
        Extend::None => (0..size).contains(&i).then_some(i),
        Extend::Pad => Some(i.clamp(0, size - 1)),
        Extend::Repeat => Some(i.rem_euclid(size)),
        Extend::Reflect => {
            let m = i.rem_euclid(2 * size);
            Some(if m >= size { 2 * size - 1 - m } else { m })
        }
    }
}

fn texel(surface: &Surface, extend: Extend, x: f64, y: f64) -> Premul {
    if !x.is_finite() || !y.is_finite() {
        return Premul::TRANSPARENT;
    }
    let (w, h) = (surface.width() as i64, surface.height() as i64);
    let clamp = |v: f64| v.clamp(i64::MIN as f64 / 4.0, i64::MAX as f64 / 4.0) as i64;
    match (
        extend_index(extend, clamp(x), w),
        extend_index(extend, clamp(y), h),
    ) {
        (Some(x), Some(y)) => surface.pixel_premul(x as i32, y as i32),
        _ => Premul::TRANSPARENT,
    }
}

fn bilinear(surface: &Surface, extend: Extend, u: f64, v: f64) -> Premul {
    let (x0, y0) = (u.floor(), v.floor());
    let (fx, fy) = (u - x0, v - y0);
    let top = texel(surface, extend, x0, y0).lerp(&texel(surface, extend, x0 + 1.0, y0), fx);
    let bottom = texel(surface, extend, x0, y0 + 1.0).lerp(&texel(surface, extend, x0 + 1.0, y0 + 1.0), fx);
    top.lerp(&bottom, fy)
}
