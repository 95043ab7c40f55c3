// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The common error type for piet-raster operations.

use std::fmt;

/// An error that can occur while rendering 2D graphics.
///
/// Once a [`Context`] reports an error it keeps reporting the same one;
/// see [`Context::status`].
///
/// [`Context`]: crate::Context
/// [`Context::status`]: crate::Context::status
#[derive(Clone, PartialEq, Eq)]
pub struct Error(Box<ErrorKind>);

/// The kinds of errors the rasterizer can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Surface dimensions are zero, negative or too large.
    #[error("invalid surface size")]
    InvalidSize,
    /// A stride is smaller than a row of pixels, or the buffer is too short.
    #[error("invalid stride or buffer length for surface")]
    InvalidStride,
    /// A matrix is not invertible.
    #[error("invalid matrix (not invertible)")]
    InvalidMatrix,
    /// `restore` was called without a matching `save`.
    #[error("restore without matching save")]
    InvalidRestore,
    /// A relative path operation was issued without a current point.
    #[error("no current point")]
    NoCurrentPoint,
    /// A color stop offset outside `[0, 1]`.
    #[error("color stop offset out of range")]
    InvalidStopOffset,
    /// A negative or non-finite line width.
    #[error("negative line width")]
    NegativeLineWidth,
    /// Dash values are negative, non-finite or all zero.
    #[error("invalid dash array")]
    InvalidDash,
    /// A non-positive or non-finite flattening tolerance.
    #[error("invalid tolerance")]
    InvalidTolerance,
    /// An alpha value outside `[0, 1]`.
    #[error("invalid alpha value")]
    InvalidAlpha,
    /// A pixel buffer could not be allocated.
    #[error("out of memory")]
    NoMemory,
    /// The requested combination of parameters is not implemented.
    #[error("option not supported")]
    NotSupported,
}

/// Create a new error of the given kind.
pub fn new_error(kind: ErrorKind) -> Error {
    Error(Box::new(kind))
}

impl Error {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        *self.0
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Error").field(&self.0).finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        new_error(kind)
    }
}
