// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A simple representation of color

/// A non-premultiplied RGBA color with components in the range 0.0 to 1.0.
///
/// All blending happens on this representation; conversion to the
/// premultiplied storage of a [`Surface`](crate::Surface) happens only when
/// pixels are read or written.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// A color with its color channels scaled by alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Premul {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

fn clamp_unit(x: f64) -> f64 {
    // NaN maps to zero.
    if x > 0.0 {
        x.min(1.0)
    } else {
        0.0
    }
}

fn byte_to_frac(byte: u32) -> f64 {
    ((byte & 255) as f64) * (1.0 / 255.0)
}

impl Color {
    /// Opaque white.
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    /// Opaque black.
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    /// Fully transparent black.
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// Create a color from four floating point values.
    ///
    /// Values are not clamped here; they are clamped when the color is used.
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Color {
        Color { r, g, b, a }
    }

    /// Create an opaque color from three floating point values.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color::rgba(r, g, b, 1.0)
    }

    /// Create a color from a 32-bit rgba value (alpha as least significant byte).
    pub fn from_rgba32_u32(rgba: u32) -> Color {
        Color::rgba(
            byte_to_frac(rgba >> 24),
            byte_to_frac(rgba >> 16),
            byte_to_frac(rgba >> 8),
            byte_to_frac(rgba),
        )
    }

    /// Create a color from 8-bit components.
    pub fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color::from_rgba32_u32(u32::from_be_bytes([r, g, b, a]))
    }

    /// Convert a color value to a 32-bit rgba value.
    pub fn as_rgba_u32(&self) -> u32 {
        let c = self.clamped();
        let q = |x: f64| (x * 255.0).round() as u32;
        (q(c.r) << 24) | (q(c.g) << 16) | (q(c.b) << 8) | q(c.a)
    }

    /// Change just the alpha value of a color.
    pub fn with_alpha(self, a: f64) -> Color {
        Color { a, ..self }
    }

    /// The same color with every component clamped to `[0, 1]`.
    pub fn clamped(&self) -> Color {
        Color::rgba(
            clamp_unit(self.r),
            clamp_unit(self.g),
            clamp_unit(self.b),
            clamp_unit(self.a),
        )
    }

    /// True if the alpha is zero (or below).
    pub fn is_clear(&self) -> bool {
        !(self.a > 0.0)
    }

    /// True if the alpha is one (or above).
    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }

    /// Straight (non-premultiplied) interpolation towards `other`.
    pub(crate) fn lerp(&self, other: &Color, t: f64) -> Color {
        Color::rgba(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    pub(crate) fn premultiply(&self) -> Premul {
        let c = self.clamped();
        Premul {
            r: c.r * c.a,
            g: c.g * c.a,
            b: c.b * c.a,
            a: c.a,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Premul {
    pub(crate) const TRANSPARENT: Premul = Premul {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub(crate) fn unpremultiply(&self) -> Color {
        let a = clamp_unit(self.a);
        if a <= 0.0 {
            return Color::TRANSPARENT;
        }
        Color::rgba(
            clamp_unit(self.r / a),
            clamp_unit(self.g / a),
            clamp_unit(self.b / a),
            a,
        )
    }

    pub(crate) fn lerp(&self, other: &Premul, t: f64) -> Premul {
        Premul {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub(crate) fn scale(&self, k: f64) -> Premul {
        Premul {
            r: self.r * k,
            g: self.g * k,
            b: self.b * k,
            a: self.a * k,
        }
    }

    pub(crate) fn add(&self, other: &Premul) -> Premul {
        Premul {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
            a: self.a + other.a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba32_round_trip() {
        let c = Color::from_rgba32_u32(0x12_80_fe_7f);
        assert_eq!(c.as_rgba_u32(), 0x12_80_fe_7f);
        assert_eq!(Color::rgba8(0x12, 0x80, 0xfe, 0x7f), c);
    }

    #[test]
    fn premultiply_clear_color() {
        let c = Color::rgba(1.0, 0.5, 0.25, 0.0);
        assert_eq!(c.premultiply().unpremultiply(), Color::TRANSPARENT);
    }

    #[test]
    fn clamping() {
        let c = Color::rgba(2.0, -1.0, f64::NAN, 0.5).clamped();
        assert_eq!(c, Color::rgba(1.0, 0.0, 0.0, 0.5));
    }
}
