// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel buffers.

use crate::color::Premul;
use crate::{new_error, Color, Error, ErrorKind};

/// The largest width or height a surface may have.
pub const MAX_SURFACE_SIZE: i32 = 32767;

/// The memory layout of a pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    /// Premultiplied ARGB, one native-endian `u32` per pixel with alpha in
    /// the high byte.
    #[default]
    Argb32,
    /// RGB in a native-endian `u32`; the high byte is unused and the
    /// surface is opaque.
    Rgb24,
    /// Alpha only, one byte per pixel.
    A8,
    /// Alpha only, one bit per pixel, most significant bit first.
    A1,
}

impl Format {
    pub fn bits_per_pixel(self) -> usize {
        match self {
            Format::Argb32 | Format::Rgb24 => 32,
            Format::A8 => 8,
            Format::A1 => 1,
        }
    }

    /// The default stride for a row of `width` pixels, aligned to 4 bytes.
    pub fn stride_for_width(self, width: i32) -> Result<usize, Error> {
        if !(1..=MAX_SURFACE_SIZE).contains(&width) {
            return Err(new_error(ErrorKind::InvalidSize));
        }
        let bytes = (width as usize * self.bits_per_pixel()).div_ceil(8);
        Ok((bytes + 3) & !3)
    }
}

/// A pixel buffer that a [`Context`](crate::Context) draws into.
///
/// Pixels are stored premultiplied. [`Surface::pixel`] and
/// [`Surface::set_pixel`] convert to and from non-premultiplied colors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    format: Format,
    width: i32,
    height: i32,
    stride: usize,
    data: Vec<u8>,
}

fn quantize(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn unit(b: u8) -> f64 {
    b as f64 / 255.0
}

impl Surface {
    /// Create a surface cleared to transparent black.
    pub fn new(format: Format, width: i32, height: i32) -> Result<Surface, Error> {
        if !(1..=MAX_SURFACE_SIZE).contains(&height) {
            return Err(new_error(ErrorKind::InvalidSize));
        }
        let stride = format.stride_for_width(width)?;
        let len = stride * height as usize;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| new_error(ErrorKind::NoMemory))?;
        data.resize(len, 0);
        Ok(Surface {
            format,
            width,
            height,
            stride,
            data,
        })
    }

    /// Wrap an existing buffer.
    ///
    /// `stride` must hold a row of pixels and `data` must hold `height` rows.
    pub fn from_data(
        format: Format,
        width: i32,
        height: i32,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Surface, Error> {
        if !(1..=MAX_SURFACE_SIZE).contains(&height) {
            return Err(new_error(ErrorKind::InvalidSize));
        }
        let min_stride = (width.max(0) as usize * format.bits_per_pixel()).div_ceil(8);
        format.stride_for_width(width)?;
        let needed = stride.checked_mul(height as usize);
        if stride < min_stride || needed.map_or(true, |n| data.len() < n) {
            return Err(new_error(ErrorKind::InvalidStride));
        }
        Ok(Surface {
            format,
            width,
            height,
            stride,
            data,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The number of bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn word_offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.stride + x as usize * 4
    }

    /// The color at a pixel, or transparent outside the surface.
    pub fn pixel(&self, x: i32, y: i32) -> Color {
        self.pixel_premul(x, y).unpremultiply()
    }

    /// Store a color at a pixel; writes outside the surface are ignored.
    ///
    /// Alpha-only formats keep just the alpha; `Rgb24` drops it.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.set_pixel_premul(x, y, color.premultiply());
    }

    pub(crate) fn pixel_premul(&self, x: i32, y: i32) -> Premul {
        if !self.in_bounds(x, y) {
            return Premul::TRANSPARENT;
        }
        match self.format {
            Format::Argb32 | Format::Rgb24 => {
                let i = self.word_offset(x, y);
                let mut word = [0; 4];
                word.copy_from_slice(&self.data[i..i + 4]);
                let [a, r, g, b] = u32::from_ne_bytes(word).to_be_bytes();
                let a = if self.format == Format::Rgb24 { 255 } else { a };
                Premul {
                    r: unit(r),
                    g: unit(g),
                    b: unit(b),
                    a: unit(a),
                }
            }
            Format::A8 => {
                let a = unit(self.data[y as usize * self.stride + x as usize]);
                Premul {
                    a,
                    ..Premul::TRANSPARENT
                }
            }
            Format::A1 => {
                let byte = self.data[y as usize * self.stride + x as usize / 8];
                let a = if byte & (0x80 >> (x % 8)) != 0 { 1.0 } else { 0.0 };
                Premul {
                    a,
                    ..Premul::TRANSPARENT
                }
            }
        }
    }

    pub(crate) fn set_pixel_premul(&mut self, x: i32, y: i32, c: Premul) {
        if !self.in_bounds(x, y) {
            return;
        }
        match self.format {
            Format::Argb32 | Format::Rgb24 => {
                let a = if self.format == Format::Rgb24 {
                    0
                } else {
                    quantize(c.a)
                };
                // Color channels never exceed alpha in premultiplied storage.
                let limit = if self.format == Format::Rgb24 { 1.0 } else { c.a };
                let q = |v: f64| quantize(v.min(limit));
                let word = u32::from_be_bytes([a, q(c.r), q(c.g), q(c.b)]);
                let i = self.word_offset(x, y);
                self.data[i..i + 4].copy_from_slice(&word.to_ne_bytes());
            }
            Format::A8 => {
                self.data[y as usize * self.stride + x as usize] = quantize(c.a);
            }
            Format::A1 => {
                let i = y as usize * self.stride + x as usize / 8;
                let bit = 0x80 >> (x % 8);
                if c.a >= 0.5 {
                    self.data[i] |= bit;
                } else {
                    self.data[i] &= !bit;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_are_aligned() {
        assert_eq!(Format::Argb32.stride_for_width(3).unwrap(), 12);
        assert_eq!(Format::A8.stride_for_width(5).unwrap(), 8);
        assert_eq!(Format::A1.stride_for_width(33).unwrap(), 8);
        assert_eq!(
            Format::A8.stride_for_width(0).unwrap_err().kind(),
            ErrorKind::InvalidSize
        );
    }

    #[test]
    fn invalid_sizes() {
        for (w, h) in [(0, 10), (10, 0), (-1, 5), (MAX_SURFACE_SIZE + 1, 1)] {
            assert_eq!(
                Surface::new(Format::Argb32, w, h).unwrap_err().kind(),
                ErrorKind::InvalidSize
            );
        }
    }

    #[test]
    fn from_data_checks_stride() {
        let err = Surface::from_data(Format::Argb32, 4, 4, 8, vec![0; 64]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStride);
        let err = Surface::from_data(Format::Argb32, 4, 4, 16, vec![0; 63]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStride);
        let s = Surface::from_data(Format::Argb32, 4, 4, 20, vec![0; 80]).unwrap();
        assert_eq!(s.stride(), 20);
    }

    #[test]
    fn argb32_is_premultiplied_native_endian() {
        let mut s = Surface::new(Format::Argb32, 2, 1).unwrap();
        s.set_pixel(1, 0, Color::rgba(1.0, 0.0, 0.0, 0.5));
        let word = u32::from_ne_bytes([s.data()[4], s.data()[5], s.data()[6], s.data()[7]]);
        assert_eq!(word, 0x80_80_00_00);
        let c = s.pixel(1, 0);
        assert_eq!(c.r, 1.0);
        assert!((c.a - 128.0 / 255.0).abs() < 1e-12);
        assert_eq!(s.pixel(0, 0), Color::TRANSPARENT);
        assert_eq!(s.pixel(5, 5), Color::TRANSPARENT);
    }

    #[test]
    fn rgb24_is_opaque() {
        let mut s = Surface::new(Format::Rgb24, 1, 1).unwrap();
        s.set_pixel(0, 0, Color::rgb(0.0, 1.0, 0.0));
        assert_eq!(s.pixel(0, 0), Color::rgb(0.0, 1.0, 0.0));
    }

    #[test]
    fn alpha_formats() {
        let mut a8 = Surface::new(Format::A8, 3, 1).unwrap();
        a8.set_pixel(2, 0, Color::rgba(1.0, 1.0, 1.0, 1.0));
        assert_eq!(a8.pixel(2, 0).a, 1.0);
        assert_eq!(a8.data()[2], 255);

        let mut a1 = Surface::new(Format::A1, 10, 1).unwrap();
        a1.set_pixel(9, 0, Color::BLACK);
        assert_eq!(a1.data()[1], 0x40);
        assert_eq!(a1.pixel(9, 0).a, 1.0);
        a1.set_pixel(9, 0, Color::TRANSPARENT);
        assert_eq!(a1.data()[1], 0);
    }
}
