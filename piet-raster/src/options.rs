// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The defaults a fresh context starts from.

use crate::flatten::DEFAULT_TOLERANCE;
use crate::font::DEFAULT_FONT_SIZE;
use crate::stroke::{DEFAULT_LINE_WIDTH, DEFAULT_MITER_LIMIT};
use crate::{new_error, Antialias, Error, ErrorKind, FillRule, LineCap, LineJoin, Operator};

/// Initial graphics-state values for a [`Context`](crate::Context).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    /// Maximum curve flattening error, in device pixels.
    pub tolerance: f64,
    pub antialias: Antialias,
    pub fill_rule: FillRule,
    pub operator: Operator,
    pub line_width: f64,
    pub miter_limit: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub font_size: f64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            tolerance: DEFAULT_TOLERANCE,
            antialias: Antialias::Default,
            fill_rule: FillRule::NonZero,
            operator: Operator::Over,
            line_width: DEFAULT_LINE_WIDTH,
            miter_limit: DEFAULT_MITER_LIMIT,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl Options {
    pub fn new() -> Options {
        Options::default()
    }

    /// Builder-style method for setting the tolerance.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Builder-style method for setting the antialiasing level.
    pub fn antialias(mut self, antialias: Antialias) -> Self {
        self.antialias = antialias;
        self
    }

    /// Builder-style method for setting the fill rule.
    pub fn fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    /// Builder-style method for setting the operator.
    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// Builder-style method for setting the line width.
    pub fn line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width;
        self
    }

    /// Builder-style method for setting the miter limit.
    pub fn miter_limit(mut self, miter_limit: f64) -> Self {
        self.miter_limit = miter_limit;
        self
    }

    /// Builder-style method for setting the line cap.
    pub fn line_cap(mut self, line_cap: LineCap) -> Self {
        self.line_cap = line_cap;
        self
    }

    /// Builder-style method for setting the line join.
    pub fn line_join(mut self, line_join: LineJoin) -> Self {
        self.line_join = line_join;
        self
    }

    /// Builder-style method for setting the font size.
    pub fn font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Check the values the context setters would reject.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(new_error(ErrorKind::InvalidTolerance));
        }
        if !(self.line_width >= 0.0) || !self.line_width.is_finite() {
            return Err(new_error(ErrorKind::NegativeLineWidth));
        }
        Ok(())
    }
}
