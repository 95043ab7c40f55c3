// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The clip region: successive intersections of filled paths.

use std::sync::Arc;

use kurbo::{Point, Rect};

use crate::flatten::{flatten, polyline_bounds};
use crate::rasterizer::{contains_point, Mask, PixelRect, Rasterizer};
use crate::{Antialias, FillRule, Path};

/// One clip path, in device space.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipEntry {
    pub path: Path,
    pub fill_rule: FillRule,
    pub antialias: Antialias,
    pub tolerance: f64,
}

/// A stack of clip paths whose intersection is the visible region.
///
/// An empty stack means unclipped. Entries are shared between saved
/// graphics states.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipStack {
    entries: Vec<Arc<ClipEntry>>,
}

impl ClipStack {
    pub fn new() -> ClipStack {
        ClipStack::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ClipEntry> {
        self.entries.iter().map(|e| &**e)
    }

    pub fn push(&mut self, entry: ClipEntry) {
        self.entries.push(Arc::new(entry));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The coverage of the clip region within `bounds`, or `None` when
    /// unclipped.
    pub fn mask(&self, rasterizer: &mut Rasterizer, bounds: PixelRect) -> Option<Mask> {
        let mut entries = self.entries();
        let first = entries.next()?;
        let rasterize = |rasterizer: &mut Rasterizer, e: &ClipEntry| {
            let lines = flatten(&e.path, e.tolerance);
            rasterizer.rasterize(&lines, e.fill_rule, e.antialias, bounds)
        };
        let mut mask = rasterize(rasterizer, first);
        for entry in entries {
            if mask.is_empty() {
                break;
            }
            mask = mask.intersect(&rasterize(rasterizer, entry));
        }
        Some(mask)
    }

    /// Whether a device-space point is inside every clip path.
    pub fn contains(&self, p: Point) -> bool {
        self.entries().all(|e| {
            let lines = flatten(&e.path, e.tolerance);
            contains_point(&lines, e.fill_rule, p)
        })
    }

    /// The device-space bounds of the clip region, limited to `bounds`.
    pub fn extents(&self, bounds: Rect) -> Rect {
        self.entries().fold(bounds, |acc, e| {
            let lines = flatten(&e.path, e.tolerance);
            match polyline_bounds(&lines) {
                Some(r) => {
                    let r = acc.intersect(r);
                    if r.width() <= 0.0 || r.height() <= 0.0 {
                        Rect::ZERO
                    } else {
                        r
                    }
                }
                None => Rect::ZERO,
            }
        })
    }
}
