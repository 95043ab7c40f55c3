// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Porter-Duff compositing and blend modes.
//!
//! Coverage attenuates the source alpha before the operator is applied.
//! Porter-Duff operators work on premultiplied values; blend modes follow
//! the W3C compositing formula, which blends the non-premultiplied colors
//! and then composites the result with source-over.

use crate::color::Premul;
use crate::Color;

/// A compositing operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    Clear,
    Source,
    #[default]
    Over,
    In,
    Out,
    Atop,
    Dest,
    DestOver,
    DestIn,
    DestOut,
    DestAtop,
    Xor,
    Add,
    Saturate,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl Operator {
    /// True for the blend modes, as opposed to the Porter-Duff operators.
    pub fn is_blend_mode(self) -> bool {
        matches!(
            self,
            Operator::Multiply
                | Operator::Screen
                | Operator::Overlay
                | Operator::Darken
                | Operator::Lighten
                | Operator::ColorDodge
                | Operator::ColorBurn
                | Operator::HardLight
                | Operator::SoftLight
                | Operator::Difference
                | Operator::Exclusion
                | Operator::Hue
                | Operator::Saturation
                | Operator::Color
                | Operator::Luminosity
        )
    }
}

/// Composite `src` onto `dst` with the given coverage.
pub fn composite(src: Color, dst: Color, coverage: f64, op: Operator) -> Color {
    let coverage = coverage.clamp(0.0, 1.0);
    match op {
        Operator::Over if src.clamped().a * coverage <= 0.0 => return dst,
        Operator::Source if coverage >= 1.0 => return src.clamped(),
        Operator::Dest => return dst,
        _ => (),
    }
    composite_premul(src.premultiply(), dst.premultiply(), coverage, op).unpremultiply()
}

fn clamp(c: Premul) -> Premul {
    let a = c.a.clamp(0.0, 1.0);
    Premul {
        r: c.r.clamp(0.0, a),
        g: c.g.clamp(0.0, a),
        b: c.b.clamp(0.0, a),
        a,
    }
}

/// The Porter-Duff source and destination factors, or `None` for a blend
/// mode.
fn factors(op: Operator, sa: f64, da: f64) -> Option<(f64, f64)> {
    let f = match op {
        Operator::Clear => (0.0, 0.0),
        Operator::Source => (1.0, 0.0),
        Operator::Over => (1.0, 1.0 - sa),
        Operator::In => (da, 0.0),
        Operator::Out => (1.0 - da, 0.0),
        Operator::Atop => (da, 1.0 - sa),
        Operator::Dest => (0.0, 1.0),
        Operator::DestOver => (1.0 - da, 1.0),
        Operator::DestIn => (0.0, sa),
        Operator::DestOut => (0.0, 1.0 - sa),
        Operator::DestAtop => (1.0 - da, sa),
        Operator::Xor => (1.0 - da, 1.0 - sa),
        Operator::Add => (1.0, 1.0),
        Operator::Saturate => {
            let fa = if sa > 0.0 { ((1.0 - da) / sa).min(1.0) } else { 1.0 };
            (fa, 1.0)
        }
        _ => return None,
    };
    Some(f)
}

pub(crate) fn composite_premul(src: Premul, dst: Premul, coverage: f64, op: Operator) -> Premul {
    let s = src.scale(coverage);
    match factors(op, s.a, dst.a) {
        Some((fa, fb)) => clamp(s.scale(fa).add(&dst.scale(fb))),
        None => clamp(blend(s, dst, op)),
    }
}

fn unpremul_channels(c: &Premul) -> [f64; 3] {
    if c.a > 0.0 {
        [c.r / c.a, c.g / c.a, c.b / c.a]
    } else {
        [0.0; 3]
    }
}

fn blend(s: Premul, d: Premul, op: Operator) -> Premul {
    let cs = unpremul_channels(&s);
    let cb = unpremul_channels(&d);
    let mixed = match op {
        Operator::Hue => set_lum(set_sat(cs, sat(cb)), lum(cb)),
        Operator::Saturation => set_lum(set_sat(cb, sat(cs)), lum(cb)),
        Operator::Color => set_lum(cs, lum(cb)),
        Operator::Luminosity => set_lum(cb, lum(cs)),
        _ => [
            separable(op, cb[0], cs[0]),
            separable(op, cb[1], cs[1]),
            separable(op, cb[2], cs[2]),
        ],
    };
    let (sa, da) = (s.a, d.a);
    let channel =
        |i: usize, sp: f64, dp: f64| sp * (1.0 - da) + dp * (1.0 - sa) + sa * da * mixed[i];
    Premul {
        r: channel(0, s.r, d.r),
        g: channel(1, s.g, d.g),
        b: channel(2, s.b, d.b),
        a: sa + da * (1.0 - sa),
    }
}

/// The separable blend function `B(cb, cs)`.
fn separable(op: Operator, cb: f64, cs: f64) -> f64 {
    match op {
        Operator::Multiply => cb * cs,
        Operator::Screen => cb + cs - cb * cs,
        Operator::Overlay => hard_light(cs, cb),
        Operator::Darken => cb.min(cs),
        Operator::Lighten => cb.max(cs),
        Operator::ColorDodge => {
            if cb == 0.0 {
                0.0
            } else if cs >= 1.0 {
                1.0
            } else {
                (cb / (1.0 - cs)).min(1.0)
            }
        }
        Operator::ColorBurn => {
            if cb >= 1.0 {
                1.0
            } else if cs <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - cb) / cs).min(1.0)
            }
        }
        Operator::HardLight => hard_light(cb, cs),
        Operator::SoftLight => {
            if cs <= 0.5 {
                cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
            } else {
                let d = if cb <= 0.25 {
                    ((16.0 * cb - 12.0) * cb + 4.0) * cb
                } else {
                    cb.sqrt()
                };
                cb + (2.0 * cs - 1.0) * (d - cb)
            }
        }
        Operator::Difference => (cb - cs).abs(),
        Operator::Exclusion => cb + cs - 2.0 * cb * cs,
        _ => cs,
    }
}

fn hard_light(cb: f64, cs: f64) -> f64 {
    if cs <= 0.5 {
        cb * 2.0 * cs
    } else {
        let s = 2.0 * cs - 1.0;
        cb + s - cb * s
    }
}

fn lum(c: [f64; 3]) -> f64 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f64; 3]) -> [f64; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > 0.0 {
        out = out.map(|v| l + (v - l) * l / (l - n));
    }
    if x > 1.0 && x - l > 0.0 {
        out = out.map(|v| l + (v - l) * (1.0 - l) / (x - l));
    }
    out
}

fn set_lum(c: [f64; 3], l: f64) -> [f64; 3] {
    let d = l - lum(c);
    clip_color(c.map(|v| v + d))
}

fn sat(c: [f64; 3]) -> f64 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f64; 3], s: f64) -> [f64; 3] {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    if max > min {
        c.map(|v| (v - min) * s / (max - min))
    } else {
        [0.0; 3]
    }
}
