// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An immediate-mode CPU rasterizer for 2D vector graphics.
//!
//! Build a path on a [`Context`], pick a source and operator, then fill,
//! stroke, clip or paint into a pixel [`Surface`].
//!
//! ```
//! use piet_raster::{Context, Format, Surface};
//!
//! let surface = Surface::new(Format::Argb32, 64, 64).unwrap();
//! let mut ctx = Context::new(surface);
//! ctx.set_source_rgb(1.0, 1.0, 1.0).unwrap();
//! ctx.paint().unwrap();
//! ctx.set_source_rgb(1.0, 0.0, 0.0).unwrap();
//! ctx.rectangle(16.0, 16.0, 32.0, 32.0).unwrap();
//! ctx.fill().unwrap();
//! assert_eq!(ctx.target().pixel(32, 32).as_rgba_u32(), 0xff0000ff);
//! ```

pub use kurbo;

/// Curve flattening into polylines.
pub mod flatten;
/// Scan conversion into coverage masks.
pub mod rasterizer;
/// Stroke outline generation and dashing.
pub mod stroke;

mod clip;
mod color;
mod compositor;
mod context;
mod error;
mod font;
mod matrix;
mod options;
mod path;
mod pattern;
mod sampler;
mod state;
mod surface;

pub use crate::clip::*;
pub use crate::color::*;
pub use crate::compositor::*;
pub use crate::context::*;
pub use crate::error::*;
pub use crate::font::*;
pub use crate::matrix::*;
pub use crate::options::*;
pub use crate::path::*;
pub use crate::pattern::*;
pub use crate::rasterizer::{Antialias, FillRule, Mask, PixelRect, Rasterizer};
pub use crate::sampler::*;
pub use crate::state::*;
pub use crate::stroke::{LineCap, LineJoin, StrokeStyle};
pub use crate::surface::*;
