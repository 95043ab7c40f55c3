// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D affine transforms.

use kurbo::{Affine, Point, Rect, Vec2};

use crate::{new_error, Error, ErrorKind};

/// Determinants smaller than this are treated as singular.
const DEGENERATE_EPSILON: f64 = 1e-10;

/// A 2D affine transform.
///
/// A point `(x, y)` is mapped to
///
/// ```text
/// x' = xx * x + xy * y + x0
/// y' = yx * x + yy * y + y0
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

/// A matrix split into translation, rotation, scale and shear.
///
/// The decomposition is not unique; this is the one where the linear
/// part equals `rotate(rotation) * [[scale_x, scale_x * shear], [0, scale_y]]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decomposed {
    pub translation: Vec2,
    /// Rotation angle in radians.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub shear: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Create a matrix from its six coefficients.
    pub const fn new(xx: f64, yx: f64, xy: f64, yy: f64, x0: f64, y0: f64) -> Matrix {
        Matrix {
            xx,
            yx,
            xy,
            yy,
            x0,
            y0,
        }
    }

    pub const fn identity() -> Matrix {
        Matrix::IDENTITY
    }

    pub const fn new_translate(tx: f64, ty: f64) -> Matrix {
        Matrix::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub const fn new_scale(sx: f64, sy: f64) -> Matrix {
        Matrix::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A rotation by `radians`. With the y axis pointing down, positive
    /// angles rotate from the positive x axis towards the positive y axis.
    pub fn new_rotate(radians: f64) -> Matrix {
        Affine::rotate(radians).into()
    }

    /// A skew by the given angles (in radians) along the x and y axes.
    pub fn new_skew(x_radians: f64, y_radians: f64) -> Matrix {
        Affine::skew(x_radians.tan(), y_radians.tan()).into()
    }

    fn to_affine(self) -> Affine {
        self.into()
    }

    /// The transform that applies `a` first, then `b`.
    pub fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
        (b.to_affine() * a.to_affine()).into()
    }

    /// Apply a translation before this transform.
    pub fn translate(&mut self, tx: f64, ty: f64) {
        *self = self.to_affine().pre_translate(Vec2::new(tx, ty)).into();
    }

    /// Apply a scale before this transform.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        *self = self.to_affine().pre_scale_non_uniform(sx, sy).into();
    }

    /// Apply a rotation before this transform.
    pub fn rotate(&mut self, radians: f64) {
        *self = self.to_affine().pre_rotate(radians).into();
    }

    /// Apply a skew before this transform.
    pub fn skew(&mut self, x_radians: f64, y_radians: f64) {
        *self = Matrix::multiply(&Matrix::new_skew(x_radians, y_radians), self);
    }

    pub fn transform_point(&self, p: Point) -> Point {
        self.to_affine() * p
    }

    /// Transform a distance vector; the translation is ignored.
    pub fn transform_distance(&self, v: Vec2) -> Vec2 {
        (self.to_affine().with_translation(Vec2::ZERO) * v.to_point()).to_vec2()
    }

    pub fn determinant(&self) -> f64 {
        self.to_affine().determinant()
    }

    pub fn is_invertible(&self) -> bool {
        let affine = self.to_affine();
        affine.is_finite() && affine.determinant().abs() >= DEGENERATE_EPSILON
    }

    pub fn is_identity(&self) -> bool {
        *self == Matrix::IDENTITY
    }

    /// True if the matrix is a pure translation.
    pub fn is_translation(&self) -> bool {
        self.xx == 1.0 && self.yx == 0.0 && self.xy == 0.0 && self.yy == 1.0
    }

    /// The inverse transform.
    ///
    /// Fails with [`ErrorKind::InvalidMatrix`] if the determinant is
    /// (nearly) zero or a coefficient is not finite.
    pub fn invert(&self) -> Result<Matrix, Error> {
        if !self.is_invertible() {
            return Err(new_error(ErrorKind::InvalidMatrix));
        }
        Ok(self.to_affine().inverse().into())
    }

    /// Split the matrix into translation, rotation, scale and shear.
    pub fn decompose(&self) -> Result<Decomposed, Error> {
        if !self.to_affine().is_finite() {
            return Err(new_error(ErrorKind::InvalidMatrix));
        }
        let scale_x = self.xx.hypot(self.yx);
        if scale_x < DEGENERATE_EPSILON {
            return Err(new_error(ErrorKind::InvalidMatrix));
        }
        let rotation = self.yx.atan2(self.xx);
        let (s, c) = rotation.sin_cos();
        // Undo the rotation on the second column.
        let k = c * self.xy + s * self.yy;
        let scale_y = c * self.yy - s * self.xy;
        if scale_y.abs() < DEGENERATE_EPSILON {
            return Err(new_error(ErrorKind::InvalidMatrix));
        }
        Ok(Decomposed {
            translation: self.to_affine().translation(),
            rotation,
            scale_x,
            scale_y,
            shear: k / scale_x,
        })
    }

    /// The largest factor by which this transform can stretch a length.
    ///
    /// This is the larger singular value of the linear part.
    pub fn max_scale_factor(&self) -> f64 {
        let sum = self.xx * self.xx + self.xy * self.xy + self.yx * self.yx + self.yy * self.yy;
        let det = self.determinant();
        let disc = (sum * sum - 4.0 * det * det).max(0.0);
        ((sum + disc.sqrt()) * 0.5).sqrt()
    }

    /// The axis-aligned bounds of `rect` after transformation.
    pub fn transform_bounding_box(&self, rect: Rect) -> Rect {
        self.to_affine().transform_rect_bbox(rect)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl Decomposed {
    /// Rebuild the matrix this decomposition came from.
    pub fn recompose(&self) -> Matrix {
        let k = self.scale_x * self.shear;
        let shear = Affine::new([self.scale_x, 0.0, k, self.scale_y, 0.0, 0.0]);
        (Affine::translate(self.translation) * Affine::rotate(self.rotation) * shear).into()
    }
}

impl From<Affine> for Matrix {
    fn from(affine: Affine) -> Matrix {
        let a = affine.as_coeffs();
        Matrix::new(a[0], a[1], a[2], a[3], a[4], a[5])
    }
}

impl From<Matrix> for Affine {
    fn from(m: Matrix) -> Affine {
        Affine::new([m.xx, m.yx, m.xy, m.yy, m.x0, m.y0])
    }
}
