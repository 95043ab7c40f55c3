// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scanline rasterization of flattened paths into coverage masks.
//!
//! Each pixel is sampled on an N×N grid, where N comes from the
//! [`Antialias`] level. Sample `(i, j)` of pixel `(x, y)` sits at
//! `(x + (i + 0.5) / N, y + (j + 0.5) / N)`. For every sub-scanline the
//! crossings of the active edges are sorted and turned into inside spans
//! according to the [`FillRule`]; a pixel's coverage is the fraction of its
//! samples that fall in a span.

use kurbo::{Point, Rect};

use crate::flatten::Polyline;

/// A fill rule for resolving winding numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillRule {
    /// Fill everything with a non-zero winding number.
    #[default]
    NonZero,
    /// Fill everything with an odd winding number.
    EvenOdd,
}

/// Antialiasing quality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Antialias {
    /// The default level, equivalent to [`Antialias::Good`].
    #[default]
    Default,
    /// A single sample per pixel, at its center.
    None,
    /// Grayscale antialiasing; equivalent to [`Antialias::Good`].
    Gray,
    /// Accepted for compatibility; rendered as [`Antialias::Good`].
    Subpixel,
    Fast,
    Good,
    Best,
}

impl Antialias {
    /// The number of samples per pixel along each axis.
    pub fn sample_density(self) -> u32 {
        match self {
            Antialias::None => 1,
            Antialias::Fast => 2,
            Antialias::Default | Antialias::Gray | Antialias::Subpixel | Antialias::Good => 4,
            Antialias::Best => 8,
        }
    }
}

impl FillRule {
    fn is_inside(self, winding: i32) -> bool {
        match self {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        }
    }
}

/// An integer pixel rectangle, `x0..x1` by `y0..y1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelRect {
    pub const EMPTY: PixelRect = PixelRect::new(0, 0, 0, 0);

    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> PixelRect {
        PixelRect { x0, y0, x1, y1 }
    }

    /// The smallest pixel rectangle containing `rect`.
    pub fn from_rect_outer(rect: Rect) -> PixelRect {
        let clamp = |v: f64| v.clamp(i32::MIN as f64 / 2.0, i32::MAX as f64 / 2.0) as i32;
        PixelRect::new(
            clamp(rect.x0.floor()),
            clamp(rect.y0.floor()),
            clamp(rect.x1.ceil()),
            clamp(rect.y1.ceil()),
        )
    }

    pub fn width(&self) -> u32 {
        (self.x1 - self.x0).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y1 - self.y0).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        let r = PixelRect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        if r.is_empty() {
            PixelRect::EMPTY
        } else {
            r
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x0 as f64, self.y0 as f64, self.x1 as f64, self.y1 as f64)
    }
}

/// Per-pixel coverage over a pixel rectangle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mask {
    bounds: PixelRect,
    coverage: Vec<f32>,
}

impl Mask {
    /// A mask that covers nothing.
    pub fn empty() -> Mask {
        Mask::default()
    }

    /// A mask with coverage 1.0 everywhere in `bounds`.
    pub fn full(bounds: PixelRect) -> Mask {
        let len = bounds.width() as usize * bounds.height() as usize;
        Mask {
            bounds,
            coverage: vec![1.0; len],
        }
    }

    pub fn bounds(&self) -> PixelRect {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty() || self.coverage.iter().all(|c| *c <= 0.0)
    }

    /// Coverage at a pixel; zero outside the mask bounds.
    pub fn coverage_at(&self, x: i32, y: i32) -> f32 {
        if !self.bounds.contains(x, y) {
            return 0.0;
        }
        let ix = (x - self.bounds.x0) as usize;
        let iy = (y - self.bounds.y0) as usize;
        self.coverage[iy * self.bounds.width() as usize + ix]
    }

    /// The pointwise product of two masks.
    pub fn intersect(&self, other: &Mask) -> Mask {
        let bounds = self.bounds.intersect(&other.bounds);
        let mut coverage = Vec::with_capacity(bounds.width() as usize * bounds.height() as usize);
        for y in bounds.y0..bounds.y1 {
            for x in bounds.x0..bounds.x1 {
                coverage.push(self.coverage_at(x, y) * other.coverage_at(x, y));
            }
        }
        Mask { bounds, coverage }
    }

    /// Multiply the coverage of every covered pixel by `f(x, y)`.
    pub fn modulate(&mut self, mut f: impl FnMut(i32, i32) -> f32) {
        let width = self.bounds.width() as usize;
        if width == 0 {
            return;
        }
        let (x0, y0) = (self.bounds.x0, self.bounds.y0);
        for (i, c) in self.coverage.iter_mut().enumerate() {
            if *c > 0.0 {
                *c *= f(x0 + (i % width) as i32, y0 + (i / width) as i32);
            }
        }
    }

    /// Iterate over pixels with non-zero coverage, as `(x, y, coverage)`.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, f32)> + '_ {
        let width = self.bounds.width().max(1) as usize;
        let (x0, y0) = (self.bounds.x0, self.bounds.y0);
        self.coverage
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0.0)
            .map(move |(i, c)| (x0 + (i % width) as i32, y0 + (i / width) as i32, *c))
    }
}

/// A non-horizontal edge, stored top to bottom.
#[derive(Clone, Copy, Debug)]
struct Edge {
    top: Point,
    bottom_y: f64,
    dxdy: f64,
    /// +1 if the original segment pointed down, -1 if up.
    dir: i32,
}

impl Edge {
    fn new(p0: Point, p1: Point) -> Option<Edge> {
        if p0.y == p1.y || !p0.is_finite() || !p1.is_finite() {
            return None;
        }
        let (top, bottom, dir) = if p0.y < p1.y {
            (p0, p1, 1)
        } else {
            (p1, p0, -1)
        };
        Some(Edge {
            top,
            bottom_y: bottom.y,
            dxdy: (bottom.x - top.x) / (bottom.y - top.y),
            dir,
        })
    }

    fn x_at(&self, y: f64) -> f64 {
        self.top.x + (y - self.top.y) * self.dxdy
    }

    /// Edges are half-open in y, so shared vertices are counted once.
    fn spans(&self, y: f64) -> bool {
        self.top.y <= y && y < self.bottom_y
    }
}

/// Iterate over the edges of the implicitly closed polylines.
fn fill_segments(lines: &[Polyline]) -> impl Iterator<Item = (Point, Point)> + '_ {
    lines.iter().flat_map(|line| {
        let closing = match (line.points.first(), line.points.last()) {
            (Some(&first), Some(&last)) if first != last => Some((last, first)),
            _ => None,
        };
        line.points.windows(2).map(|w| (w[0], w[1])).chain(closing)
    })
}

/// Exact point-in-fill test using the winding number at `p`.
pub fn contains_point(lines: &[Polyline], fill_rule: FillRule, p: Point) -> bool {
    let mut winding = 0;
    for (a, b) in fill_segments(lines) {
        if let Some(edge) = Edge::new(a, b) {
            if edge.spans(p.y) && edge.x_at(p.y) > p.x {
                winding += edge.dir;
            }
        }
    }
    fill_rule.is_inside(winding)
}

/// A reusable scanline rasterizer.
///
/// The scratch buffers are kept between calls to avoid reallocating for
/// every fill.
#[derive(Debug, Default)]
pub struct Rasterizer {
    edges: Vec<Edge>,
    active: Vec<usize>,
    crossings: Vec<(f64, i32)>,
    counts: Vec<u32>,
}

impl Rasterizer {
    pub fn new() -> Rasterizer {
        Rasterizer::default()
    }

    /// Rasterize the polylines (each implicitly closed) into a mask
    /// restricted to `clip`.
    pub fn rasterize(
        &mut self,
        lines: &[Polyline],
        fill_rule: FillRule,
        antialias: Antialias,
        clip: PixelRect,
    ) -> Mask {
        self.edges.clear();
        self.edges
            .extend(fill_segments(lines).filter_map(|(a, b)| Edge::new(a, b)));
        if self.edges.len() < 2 {
            return Mask::empty();
        }
        let mut extent = Rect::from_points(self.edges[0].top, self.edges[0].top);
        for e in &self.edges {
            extent = extent
                .union_pt(e.top)
                .union_pt(Point::new(e.x_at(e.bottom_y), e.bottom_y));
        }
        let bounds = PixelRect::from_rect_outer(extent).intersect(&clip);
        if bounds.is_empty() {
            return Mask::empty();
        }
        self.edges.sort_by(|a, b| a.top.y.total_cmp(&b.top.y));

        let n = antialias.sample_density() as i64;
        let width = bounds.width() as usize;
        let full = (n * n) as f32;
        let mut coverage = vec![0.0f32; width * bounds.height() as usize];
        self.counts.clear();
        self.counts.resize(width, 0);
        self.active.clear();
        let mut next_edge = 0;

        log::trace!(
            "rasterize: {} edges, {}x{} px, density {}",
            self.edges.len(),
            width,
            bounds.height(),
            n
        );

        for py in bounds.y0..bounds.y1 {
            self.counts.iter_mut().for_each(|c| *c = 0);
            for j in 0..n {
                let sy = py as f64 + (j as f64 + 0.5) / n as f64;
                while next_edge < self.edges.len() && self.edges[next_edge].top.y <= sy {
                    self.active.push(next_edge);
                    next_edge += 1;
                }
                let edges = &self.edges;
                self.active.retain(|&i| edges[i].bottom_y > sy);

                self.crossings.clear();
                for &i in &self.active {
                    let e = &self.edges[i];
                    if e.spans(sy) {
                        self.crossings.push((e.x_at(sy), e.dir));
                    }
                }
                if self.crossings.is_empty() {
                    continue;
                }
                self.crossings.sort_by(|a, b| a.0.total_cmp(&b.0));
                self.accumulate_spans(fill_rule, n, bounds);
            }
            let row = (py - bounds.y0) as usize * width;
            for (dst, &count) in coverage[row..row + width].iter_mut().zip(&self.counts) {
                *dst = count as f32 / full;
            }
        }

        Mask { bounds, coverage }
    }

    /// Turn the sorted crossings of one sub-scanline into sample counts.
    fn accumulate_spans(&mut self, fill_rule: FillRule, n: i64, bounds: PixelRect) {
        let nf = n as f64;
        let k_min = bounds.x0 as i64 * n;
        let k_max = bounds.x1 as i64 * n;
        let mut winding = 0;
        let mut span_start = 0.0;
        for &(x, dir) in &self.crossings {
            let was_inside = fill_rule.is_inside(winding);
            winding += dir;
            let is_inside = fill_rule.is_inside(winding);
            if !was_inside && is_inside {
                span_start = x;
            } else if was_inside && !is_inside {
                // Samples with centers in [span_start, x).
                let k0 = ((span_start * nf - 0.5).ceil() as i64).max(k_min);
                let k1 = ((x * nf - 0.5).ceil() as i64).min(k_max);
                if k0 < k1 {
                    add_samples(&mut self.counts, k0, k1, n, bounds.x0 as i64);
                }
            }
        }
    }
}

/// Add the samples `k0..k1` (in sub-pixel columns) to the per-pixel counts.
fn add_samples(counts: &mut [u32], k0: i64, k1: i64, n: i64, x0: i64) {
    let first_px = k0.div_euclid(n);
    let last_px = (k1 - 1).div_euclid(n);
    for px in first_px..=last_px {
        let lo = k0.max(px * n);
        let hi = k1.min((px + 1) * n);
        counts[(px - x0) as usize] += (hi - lo) as u32;
    }
}
