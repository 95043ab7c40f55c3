// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing context.

use std::sync::Arc;

use kurbo::{BezPath, Point, Rect, Shape, Vec2};

use crate::clip::ClipEntry;
use crate::compositor::composite_premul;
use crate::flatten::{flatten, polyline_bounds, Polyline};
use crate::rasterizer::{contains_point, Mask, PixelRect, Rasterizer};
use crate::sampler::Sampler;
use crate::state::{GraphicsState, StateStack};
use crate::stroke::stroke_outline;
use crate::{
    new_error, Antialias, Color, Error, ErrorKind, FillRule, FontFace, Glyph, LineCap, LineJoin,
    Matrix, Operator, Options, Path, Pattern, StrokeStyle, Surface,
};

/// An immediate-mode drawing context that renders into a [`Surface`].
///
/// Paths are built in user space and mapped to device space by the current
/// transform when they are filled, stroked or used as a clip.
///
/// Errors are sticky: the first failing call puts the context into an
/// error state, after which every drawing or state call does nothing and
/// returns that error. Callers can propagate each result with `?`, or
/// ignore them and check [`Context::status`] once at the end. Queries
/// never fail; in the error state they return empty results.
#[derive(Debug)]
pub struct Context {
    target: Surface,
    path: Path,
    states: StateStack,
    status: Option<Error>,
    rasterizer: Rasterizer,
}

impl Context {
    /// Create a context with the default options.
    pub fn new(target: Surface) -> Context {
        Context::with_options(target, &Options::default())
    }

    /// Create a context whose root graphics state comes from `options`.
    ///
    /// Invalid options put the context straight into the error state.
    pub fn with_options(target: Surface, options: &Options) -> Context {
        let mut ctx = Context {
            target,
            path: Path::new(),
            states: StateStack::new(GraphicsState::new(options)),
            status: None,
            rasterizer: Rasterizer::new(),
        };
        if let Err(err) = options.validate() {
            ctx.fail(err);
        }
        ctx
    }

    pub fn target(&self) -> &Surface {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut Surface {
        &mut self.target
    }

    pub fn into_target(self) -> Surface {
        self.target
    }

    /// The error that put the context into the error state, if any.
    pub fn status(&self) -> Result<(), Error> {
        match &self.status {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        if self.status.is_none() {
            log::warn!("context entering error state: {err}");
            self.status = Some(err.clone());
        }
        err
    }

    fn fail_with(&mut self, kind: ErrorKind) -> Result<(), Error> {
        Err(self.fail(new_error(kind)))
    }

    fn record<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        result.map_err(|err| self.fail(err))
    }

    /// The graphics state currently in effect.
    pub fn state(&self) -> &GraphicsState {
        self.states.top()
    }

    fn state_mut(&mut self) -> &mut GraphicsState {
        self.states.top_mut()
    }

    // Path construction.

    pub fn new_path(&mut self) -> Result<(), Error> {
        self.status()?;
        self.path.clear();
        Ok(())
    }

    pub fn new_sub_path(&mut self) -> Result<(), Error> {
        self.status()?;
        self.path.new_sub_path();
        Ok(())
    }

    pub fn move_to(&mut self, p: impl Into<Point>) -> Result<(), Error> {
        self.status()?;
        self.path.move_to(p);
        Ok(())
    }

    pub fn line_to(&mut self, p: impl Into<Point>) -> Result<(), Error> {
        self.status()?;
        self.path.line_to(p);
        Ok(())
    }

    pub fn curve_to(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> Result<(), Error> {
        self.status()?;
        self.path.curve_to(p1, p2, p3);
        Ok(())
    }

    pub fn close_path(&mut self) -> Result<(), Error> {
        self.status()?;
        self.path.close_path();
        Ok(())
    }

    pub fn rel_move_to(&mut self, d: impl Into<Vec2>) -> Result<(), Error> {
        self.status()?;
        let result = self.path.rel_move_to(d);
        self.record(result)
    }

    pub fn rel_line_to(&mut self, d: impl Into<Vec2>) -> Result<(), Error> {
        self.status()?;
        let result = self.path.rel_line_to(d);
        self.record(result)
    }

    pub fn rel_curve_to(
        &mut self,
        d1: impl Into<Vec2>,
        d2: impl Into<Vec2>,
        d3: impl Into<Vec2>,
    ) -> Result<(), Error> {
        self.status()?;
        let result = self.path.rel_curve_to(d1, d2, d3);
        self.record(result)
    }

    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<(), Error> {
        self.status()?;
        self.path.rectangle(x, y, width, height);
        Ok(())
    }

    /// Add a circular arc, increasing in angle, from `angle1` to `angle2`.
    pub fn arc(
        &mut self,
        center: impl Into<Point>,
        radius: f64,
        angle1: f64,
        angle2: f64,
    ) -> Result<(), Error> {
        self.status()?;
        self.path.arc(center, radius, angle1, angle2);
        Ok(())
    }

    /// Add a circular arc, decreasing in angle, from `angle1` to `angle2`.
    pub fn arc_negative(
        &mut self,
        center: impl Into<Point>,
        radius: f64,
        angle1: f64,
        angle2: f64,
    ) -> Result<(), Error> {
        self.status()?;
        self.path.arc_negative(center, radius, angle1, angle2);
        Ok(())
    }

    /// Append any [`kurbo::Shape`] to the current path.
    pub fn append_shape(&mut self, shape: &impl Shape) -> Result<(), Error> {
        self.status()?;
        let tolerance = self.user_tolerance();
        self.path.extend_from_shape(shape, tolerance);
        Ok(())
    }

    pub fn append_path(&mut self, path: &Path) -> Result<(), Error> {
        self.status()?;
        self.path.append(path);
        Ok(())
    }

    /// A copy of the current path, in user space.
    pub fn copy_path(&self) -> Path {
        self.path.clone()
    }

    /// A copy of the current path with curves replaced by line segments.
    pub fn copy_path_flat(&self) -> Path {
        self.path.flattened(self.user_tolerance())
    }

    pub fn current_point(&self) -> Option<Point> {
        self.path.current_point()
    }

    pub fn has_current_point(&self) -> bool {
        self.path.has_current_point()
    }

    // State.

    /// Push a copy of the graphics state.
    pub fn save(&mut self) -> Result<(), Error> {
        self.status()?;
        self.states.push();
        log::debug!("save: depth {}", self.states.depth());
        Ok(())
    }

    /// Pop the graphics state pushed by the matching [`Context::save`].
    pub fn restore(&mut self) -> Result<(), Error> {
        self.status()?;
        let result = self.states.pop();
        self.record(result)?;
        log::debug!("restore: depth {}", self.states.depth());
        Ok(())
    }

    /// Use `pattern` as the paint source.
    ///
    /// The pattern is locked to the user space in effect now; later
    /// transforms do not move it.
    pub fn set_source(&mut self, pattern: &Pattern) -> Result<(), Error> {
        self.status()?;
        let state = self.state_mut();
        state.source = pattern.clone();
        state.source_matrix = state.matrix;
        Ok(())
    }

    pub fn set_source_color(&mut self, color: Color) -> Result<(), Error> {
        self.set_source(&Pattern::solid(color))
    }

    pub fn set_source_rgb(&mut self, r: f64, g: f64, b: f64) -> Result<(), Error> {
        self.set_source_color(Color::rgb(r, g, b))
    }

    pub fn set_source_rgba(&mut self, r: f64, g: f64, b: f64, a: f64) -> Result<(), Error> {
        self.set_source_color(Color::rgba(r, g, b, a))
    }

    /// Use a surface as the source, with its origin at `(x, y)` in user
    /// space.
    pub fn set_source_surface(&mut self, surface: Arc<Surface>, x: f64, y: f64) -> Result<(), Error> {
        self.status()?;
        let pattern = self.offset_surface_pattern(surface, x, y)?;
        self.set_source(&pattern)
    }

    fn offset_surface_pattern(&mut self, surface: Arc<Surface>, x: f64, y: f64) -> Result<Pattern, Error> {
        let mut pattern = Pattern::surface(surface);
        let result = pattern.set_matrix(Matrix::new_translate(-x, -y));
        self.record(result)?;
        Ok(pattern)
    }

    pub fn source(&self) -> Pattern {
        self.state().source.clone()
    }

    pub fn set_operator(&mut self, operator: Operator) -> Result<(), Error> {
        self.status()?;
        self.state_mut().operator = operator;
        Ok(())
    }

    pub fn operator(&self) -> Operator {
        self.state().operator
    }

    pub fn set_fill_rule(&mut self, fill_rule: FillRule) -> Result<(), Error> {
        self.status()?;
        self.state_mut().fill_rule = fill_rule;
        Ok(())
    }

    pub fn fill_rule(&self) -> FillRule {
        self.state().fill_rule
    }

    pub fn set_antialias(&mut self, antialias: Antialias) -> Result<(), Error> {
        self.status()?;
        self.state_mut().antialias = antialias;
        Ok(())
    }

    pub fn antialias(&self) -> Antialias {
        self.state().antialias
    }

    /// Set the curve flattening tolerance, in device pixels.
    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<(), Error> {
        self.status()?;
        if !(tolerance > 0.0) || !tolerance.is_finite() {
            return self.fail_with(ErrorKind::InvalidTolerance);
        }
        self.state_mut().tolerance = tolerance;
        Ok(())
    }

    pub fn tolerance(&self) -> f64 {
        self.state().tolerance
    }

    pub fn set_line_width(&mut self, width: f64) -> Result<(), Error> {
        self.status()?;
        if !(width >= 0.0) || !width.is_finite() {
            return self.fail_with(ErrorKind::NegativeLineWidth);
        }
        self.state_mut().stroke.width = width;
        Ok(())
    }

    pub fn line_width(&self) -> f64 {
        self.state().stroke.width
    }

    pub fn set_line_cap(&mut self, cap: LineCap) -> Result<(), Error> {
        self.status()?;
        self.state_mut().stroke.set_line_cap(cap);
        Ok(())
    }

    pub fn line_cap(&self) -> LineCap {
        self.state().stroke.line_cap
    }

    pub fn set_line_join(&mut self, join: LineJoin) -> Result<(), Error> {
        self.status()?;
        self.state_mut().stroke.set_line_join(join);
        Ok(())
    }

    pub fn line_join(&self) -> LineJoin {
        self.state().stroke.line_join
    }

    pub fn set_miter_limit(&mut self, limit: f64) -> Result<(), Error> {
        self.status()?;
        self.state_mut().stroke.set_miter_limit(limit);
        Ok(())
    }

    pub fn miter_limit(&self) -> f64 {
        self.state().stroke.miter_limit
    }

    /// Set the dash pattern; an empty slice turns dashing off.
    pub fn set_dash(&mut self, dashes: &[f64], offset: f64) -> Result<(), Error> {
        self.status()?;
        let result = self.state_mut().stroke.set_dash(dashes, offset);
        self.record(result)
    }

    pub fn dash(&self) -> (&[f64], f64) {
        let stroke = &self.state().stroke;
        (&stroke.dash, stroke.dash_offset)
    }

    pub fn stroke_style(&self) -> &StrokeStyle {
        &self.state().stroke
    }

    // Transforms.

    fn apply_matrix(&mut self, matrix: Matrix) -> Result<(), Error> {
        if !matrix.is_invertible() {
            return self.fail_with(ErrorKind::InvalidMatrix);
        }
        self.state_mut().matrix = matrix;
        Ok(())
    }

    pub fn translate(&mut self, tx: f64, ty: f64) -> Result<(), Error> {
        self.status()?;
        let mut m = self.state().matrix;
        m.translate(tx, ty);
        self.apply_matrix(m)
    }

    pub fn scale(&mut self, sx: f64, sy: f64) -> Result<(), Error> {
        self.status()?;
        let mut m = self.state().matrix;
        m.scale(sx, sy);
        self.apply_matrix(m)
    }

    pub fn rotate(&mut self, radians: f64) -> Result<(), Error> {
        self.status()?;
        let mut m = self.state().matrix;
        m.rotate(radians);
        self.apply_matrix(m)
    }

    /// Apply `matrix` to user space, before the current transform.
    pub fn transform(&mut self, matrix: &Matrix) -> Result<(), Error> {
        self.status()?;
        let m = Matrix::multiply(matrix, &self.state().matrix);
        self.apply_matrix(m)
    }

    pub fn set_matrix(&mut self, matrix: Matrix) -> Result<(), Error> {
        self.status()?;
        self.apply_matrix(matrix)
    }

    pub fn identity_matrix(&mut self) -> Result<(), Error> {
        self.set_matrix(Matrix::IDENTITY)
    }

    /// The current user-to-device transform.
    pub fn matrix(&self) -> Matrix {
        self.state().matrix
    }

    fn inverse_matrix(&self) -> Matrix {
        // The current transform is only ever set to invertible matrices.
        self.state().matrix.invert().unwrap_or(Matrix::IDENTITY)
    }

    pub fn user_to_device(&self, p: impl Into<Point>) -> Point {
        self.state().matrix.transform_point(p.into())
    }

    pub fn user_to_device_distance(&self, d: impl Into<Vec2>) -> Vec2 {
        self.state().matrix.transform_distance(d.into())
    }

    pub fn device_to_user(&self, p: impl Into<Point>) -> Point {
        self.inverse_matrix().transform_point(p.into())
    }

    pub fn device_to_user_distance(&self, d: impl Into<Vec2>) -> Vec2 {
        self.inverse_matrix().transform_distance(d.into())
    }

    // Fonts.

    pub fn set_font_face(&mut self, face: FontFace) -> Result<(), Error> {
        self.status()?;
        self.state_mut().font.face = Arc::new(face);
        Ok(())
    }

    pub fn font_face(&self) -> Arc<FontFace> {
        self.state().font.face.clone()
    }

    /// Set the font size; this resets the font matrix to a uniform scale.
    ///
    /// A size that gives a singular matrix (zero, not finite) fails with
    /// [`ErrorKind::InvalidMatrix`].
    pub fn set_font_size(&mut self, size: f64) -> Result<(), Error> {
        self.status()?;
        if !Matrix::new_scale(size, size).is_invertible() {
            return self.fail_with(ErrorKind::InvalidMatrix);
        }
        self.state_mut().font.set_size(size);
        Ok(())
    }

    pub fn font_size(&self) -> f64 {
        self.state().font.size
    }

    pub fn set_font_matrix(&mut self, matrix: Matrix) -> Result<(), Error> {
        self.status()?;
        if !matrix.is_invertible() {
            return self.fail_with(ErrorKind::InvalidMatrix);
        }
        self.state_mut().font.matrix = matrix;
        Ok(())
    }

    pub fn font_matrix(&self) -> Matrix {
        self.state().font.matrix
    }

    /// Append the outlines of positioned glyphs to the current path.
    pub fn glyph_path(&mut self, glyphs: &[Glyph]) -> Result<(), Error> {
        self.status()?;
        for glyph in glyphs {
            self.path.append(&glyph.outline.translated(glyph.offset));
        }
        Ok(())
    }

    /// Fill positioned glyphs with the source, leaving the current path
    /// alone.
    pub fn show_glyphs(&mut self, glyphs: &[Glyph]) -> Result<(), Error> {
        self.status()?;
        let mut outlines = Path::new();
        for glyph in glyphs {
            outlines.append(&glyph.outline.translated(glyph.offset));
        }
        let lines = self.device_lines(&outlines);
        let mask = self.rasterize(&lines, FillRule::NonZero);
        self.composite_mask(&mask, 1.0);
        Ok(())
    }

    // Drawing.

    fn device_rect(&self) -> PixelRect {
        PixelRect::new(0, 0, self.target.width(), self.target.height())
    }

    /// The tolerance in user space that gives the requested device error.
    fn user_tolerance(&self) -> f64 {
        let state = self.state();
        let scale = state.matrix.max_scale_factor();
        if scale > 0.0 && scale.is_finite() {
            state.tolerance / scale
        } else {
            state.tolerance
        }
    }

    /// Flatten a user-space path in device space.
    fn device_lines(&self, path: &Path) -> Vec<Polyline> {
        let state = self.state();
        flatten(&path.transform(&state.matrix), state.tolerance)
    }

    /// The flattened stroke outline of the current path, in user space.
    fn stroke_polygons(&self) -> Vec<Polyline> {
        let tolerance = self.user_tolerance();
        let bez = BezPath::from(&self.path);
        let outline = stroke_outline(&bez, &self.state().stroke, tolerance);
        let mut path = Path::new();
        path.extend_from_shape(&outline, tolerance);
        flatten(&path, tolerance)
    }

    fn clip_mask(&mut self, mask: Mask) -> Mask {
        let bounds = mask.bounds();
        match self.states.top().clip.mask(&mut self.rasterizer, bounds) {
            Some(clip) => mask.intersect(&clip),
            None => mask,
        }
    }

    fn rasterize(&mut self, lines: &[Polyline], fill_rule: FillRule) -> Mask {
        let bounds = self.device_rect();
        let antialias = self.state().antialias;
        let mask = self
            .rasterizer
            .rasterize(lines, fill_rule, antialias, bounds);
        self.clip_mask(mask)
    }

    /// Composite the source into the target through `mask`.
    fn composite_mask(&mut self, mask: &Mask, alpha: f64) {
        let state = self.states.top();
        let sampler = Sampler::new(&state.source, &state.source_matrix);
        let op = state.operator;
        for (x, y, coverage) in mask.iter() {
            let coverage = coverage as f64 * alpha;
            if coverage <= 0.0 {
                continue;
            }
            let src = sampler.sample_premul(Point::new(x as f64 + 0.5, y as f64 + 0.5));
            let dst = self.target.pixel_premul(x, y);
            self.target
                .set_pixel_premul(x, y, composite_premul(src, dst, coverage, op));
        }
    }

    /// Fill the current path and keep it.
    pub fn fill_preserve(&mut self) -> Result<(), Error> {
        self.status()?;
        let lines = self.device_lines(&self.path);
        let fill_rule = self.state().fill_rule;
        let mask = self.rasterize(&lines, fill_rule);
        self.composite_mask(&mask, 1.0);
        Ok(())
    }

    /// Fill the current path, then clear it.
    pub fn fill(&mut self) -> Result<(), Error> {
        self.fill_preserve()?;
        self.path.clear();
        Ok(())
    }

    /// Stroke the current path and keep it.
    pub fn stroke_preserve(&mut self) -> Result<(), Error> {
        self.status()?;
        let matrix = self.state().matrix;
        let mut polygons = self.stroke_polygons();
        for poly in &mut polygons {
            for p in &mut poly.points {
                *p = matrix.transform_point(*p);
            }
        }
        let mask = self.rasterize(&polygons, FillRule::NonZero);
        self.composite_mask(&mask, 1.0);
        Ok(())
    }

    /// Stroke the current path, then clear it.
    pub fn stroke(&mut self) -> Result<(), Error> {
        self.stroke_preserve()?;
        self.path.clear();
        Ok(())
    }

    /// Paint the source everywhere inside the clip.
    pub fn paint(&mut self) -> Result<(), Error> {
        self.paint_with_alpha(1.0)
    }

    /// Paint the source everywhere inside the clip, with constant alpha.
    pub fn paint_with_alpha(&mut self, alpha: f64) -> Result<(), Error> {
        self.status()?;
        if !(0.0..=1.0).contains(&alpha) {
            return self.fail_with(ErrorKind::InvalidAlpha);
        }
        let full = Mask::full(self.device_rect());
        let mask = self.clip_mask(full);
        self.composite_mask(&mask, alpha);
        Ok(())
    }

    /// Paint the source inside the clip, using the alpha of `pattern` as
    /// coverage.
    pub fn mask(&mut self, pattern: &Pattern) -> Result<(), Error> {
        self.status()?;
        let full = Mask::full(self.device_rect());
        let mut mask = self.clip_mask(full);
        let sampler = Sampler::new(pattern, &self.state().matrix);
        mask.modulate(|x, y| {
            let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            sampler.sample_premul(p).a as f32
        });
        self.composite_mask(&mask, 1.0);
        Ok(())
    }

    /// Like [`Context::mask`], with a surface placed at `(x, y)` in user
    /// space.
    pub fn mask_surface(&mut self, surface: Arc<Surface>, x: f64, y: f64) -> Result<(), Error> {
        self.status()?;
        let pattern = self.offset_surface_pattern(surface, x, y)?;
        self.mask(&pattern)
    }

    /// Intersect the clip with the current path and keep the path.
    pub fn clip_preserve(&mut self) -> Result<(), Error> {
        self.status()?;
        let state = self.state();
        let entry = ClipEntry {
            path: self.path.transform(&state.matrix),
            fill_rule: state.fill_rule,
            antialias: state.antialias,
            tolerance: state.tolerance,
        };
        self.state_mut().clip.push(entry);
        Ok(())
    }

    /// Intersect the clip with the current path, then clear the path.
    pub fn clip(&mut self) -> Result<(), Error> {
        self.clip_preserve()?;
        self.path.clear();
        Ok(())
    }

    /// Remove all clipping.
    pub fn reset_clip(&mut self) -> Result<(), Error> {
        self.status()?;
        self.state_mut().clip.clear();
        Ok(())
    }

    // Queries.

    /// The bounds of the current path in user space.
    pub fn path_extents(&self) -> Rect {
        if self.status.is_some() {
            return Rect::ZERO;
        }
        self.path.extents().unwrap_or(Rect::ZERO)
    }

    /// The user-space bounds of the area `fill` would cover, ignoring the
    /// clip.
    pub fn fill_extents(&self) -> Rect {
        if self.status.is_some() {
            return Rect::ZERO;
        }
        let lines = flatten(&self.path, self.user_tolerance());
        polyline_bounds(&lines).unwrap_or(Rect::ZERO)
    }

    /// The user-space bounds of the area `stroke` would cover, ignoring
    /// the clip.
    pub fn stroke_extents(&self) -> Rect {
        if self.status.is_some() {
            return Rect::ZERO;
        }
        polyline_bounds(&self.stroke_polygons()).unwrap_or(Rect::ZERO)
    }

    /// Whether a user-space point is inside the area `fill` would cover.
    pub fn in_fill(&self, p: impl Into<Point>) -> bool {
        if self.status.is_some() {
            return false;
        }
        let lines = flatten(&self.path, self.user_tolerance());
        contains_point(&lines, self.state().fill_rule, p.into())
    }

    /// Whether a user-space point is inside the area `stroke` would cover.
    pub fn in_stroke(&self, p: impl Into<Point>) -> bool {
        if self.status.is_some() {
            return false;
        }
        contains_point(&self.stroke_polygons(), FillRule::NonZero, p.into())
    }

    /// Whether a user-space point is inside the clip.
    pub fn in_clip(&self, p: impl Into<Point>) -> bool {
        if self.status.is_some() {
            return false;
        }
        let device = self.user_to_device(p);
        self.device_rect().to_rect().contains(device) && self.state().clip.contains(device)
    }

    /// The user-space bounds of the clip region.
    pub fn clip_extents(&self) -> Rect {
        if self.status.is_some() {
            return Rect::ZERO;
        }
        let device = self.state().clip.extents(self.device_rect().to_rect());
        if device.area() <= 0.0 {
            return Rect::ZERO;
        }
        self.inverse_matrix().transform_bounding_box(device)
    }
}
