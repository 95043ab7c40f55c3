// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font families, weights, and the glyph outlines supplied by a shaper.
//!
//! Text shaping happens outside this crate. A shaper turns text into
//! [`Glyph`]s, outlines that are already scaled and positioned, and the
//! context draws them as ordinary paths. The font fields of the graphics
//! state are kept so a shaper can read back what the caller selected.

use std::sync::Arc;

use kurbo::Vec2;

use crate::{Matrix, Path};

/// A reference to a font family.
///
/// This may be either a CSS-style "generic family name", such as "serif"
/// or "monospace", or it can be an explicit family name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontFamily(FontFamilyInner);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FontFamilyInner {
    Serif,
    SansSerif,
    Monospace,
    SystemUi,
    Named(Arc<str>),
}

impl FontFamily {
    /// A san-serif font, such as Arial or Helvetica.
    pub const SANS_SERIF: FontFamily = FontFamily(FontFamilyInner::SansSerif);
    /// A serif font, such as Times New Roman or Charter.
    pub const SERIF: FontFamily = FontFamily(FontFamilyInner::Serif);
    /// The platform's preferred UI font.
    pub const SYSTEM_UI: FontFamily = FontFamily(FontFamilyInner::SystemUi);
    /// A monospace font.
    pub const MONOSPACE: FontFamily = FontFamily(FontFamilyInner::Monospace);

    /// A family with the given name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        FontFamily(FontFamilyInner::Named(name.into()))
    }

    pub fn name(&self) -> &str {
        match &self.0 {
            FontFamilyInner::Serif => "serif",
            FontFamilyInner::SansSerif => "sans-serif",
            FontFamilyInner::SystemUi => "system-ui",
            FontFamilyInner::Monospace => "monospace",
            FontFamilyInner::Named(s) => s,
        }
    }

    /// Returns `true` if this is a generic font family.
    pub fn is_generic(&self) -> bool {
        !matches!(self.0, FontFamilyInner::Named(_))
    }
}

impl Default for FontFamily {
    fn default() -> Self {
        FontFamily::SANS_SERIF
    }
}

/// A font weight, represented as a value in the range 1..=1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontWeight(u16);

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const LIGHT: FontWeight = FontWeight(300);
    pub const REGULAR: FontWeight = FontWeight(400);
    pub const NORMAL: FontWeight = FontWeight::REGULAR;
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const BLACK: FontWeight = FontWeight(900);

    /// Create a new `FontWeight` with a custom value.
    ///
    /// Values will be clamped to the range 1..=1000.
    pub fn new(raw: u16) -> FontWeight {
        FontWeight(raw.clamp(1, 1000))
    }

    /// Return the raw value as a u16.
    pub const fn to_raw(self) -> u16 {
        self.0
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::REGULAR
    }
}

/// The font selected in a graphics state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FontFace {
    pub family: FontFamily,
    pub weight: FontWeight,
    pub italic: bool,
}

impl FontFace {
    pub fn new(family: FontFamily, weight: FontWeight, italic: bool) -> FontFace {
        FontFace {
            family,
            weight,
            italic,
        }
    }
}

/// The default font size.
pub const DEFAULT_FONT_SIZE: f64 = 10.0;

/// The font fields of a graphics state.
///
/// `matrix` maps glyph space to user space; setting the size resets it to
/// a uniform scale.
#[derive(Debug, Clone, PartialEq)]
pub struct FontState {
    pub face: Arc<FontFace>,
    pub size: f64,
    pub matrix: Matrix,
}

impl FontState {
    pub fn new(size: f64) -> FontState {
        FontState {
            face: Arc::default(),
            size,
            matrix: Matrix::new_scale(size, size),
        }
    }

    pub fn set_size(&mut self, size: f64) {
        self.size = size;
        self.matrix = Matrix::new_scale(size, size);
    }
}

impl Default for FontState {
    fn default() -> Self {
        FontState::new(DEFAULT_FONT_SIZE)
    }
}

/// A positioned glyph outline from an external shaper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    /// The outline, in user space relative to the glyph origin.
    pub outline: Path,
    /// Where the glyph origin is placed.
    pub offset: Vec2,
}

impl Glyph {
    pub fn new(outline: Path, offset: impl Into<Vec2>) -> Glyph {
        Glyph {
            outline,
            offset: offset.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_names() {
        assert_eq!(FontFamily::SERIF.name(), "serif");
        assert!(FontFamily::MONOSPACE.is_generic());
        let named = FontFamily::new("Inconsolata");
        assert_eq!(named.name(), "Inconsolata");
        assert!(!named.is_generic());
    }

    #[test]
    fn weight_is_clamped() {
        assert_eq!(FontWeight::new(0).to_raw(), 1);
        assert_eq!(FontWeight::new(5000).to_raw(), 1000);
    }

    #[test]
    fn size_resets_matrix() {
        let mut font = FontState::default();
        font.matrix = Matrix::new_rotate(1.0);
        font.set_size(12.0);
        assert_eq!(font.matrix, Matrix::new_scale(12.0, 12.0));
    }
}
