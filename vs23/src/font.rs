//! # Bitmap fonts
//!
//! A font covers a contiguous range of character codes, all glyphs sharing
//! one height. Each glyph row starts on a byte boundary and holds one bit per
//! pixel, most significant bit first:
//!
//! ```text
//! width 10:  [b7 b6 b5 b4 b3 b2 b1 b0] [b7 b6 . . . . . .]   row 0
//!            [b7 b6 b5 b4 b3 b2 b1 b0] [b7 b6 . . . . . .]   row 1
//! ```
//!
//! Fixed-width fonts keep all glyphs in one slice, `((width + 7) / 8) *
//! height` bytes apart. Proportional fonts carry a width and a bitmap slice
//! per glyph.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Glyphs {
    Fixed { width: u8, bitmaps: &'static [u8] },
    Proportional { widths: &'static [u8], bitmaps: &'static [&'static [u8]] },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Font {
    pub first_char: u8,
    pub last_char: u8,
    pub height: u8,
    pub glyphs: Glyphs,
}

/// A hollow box, drawn for character codes the current font lacks.
pub static PLACEHOLDER: Font = Font {
    first_char: 32,
    last_char: 32,
    height: 10,
    glyphs: Glyphs::Fixed {
        width: 8,
        bitmaps: &[0xfe, 0x82, 0x82, 0x82, 0x82, 0x82, 0x82, 0xfe, 0x00, 0x00],
    },
};

/// One glyph's bitmap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub width: u8,
    pub height: u8,
    bits: &'static [u8],
}

impl Glyph {
    #[inline(always)]
    pub fn bytes_per_row(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Whether the pixel at `col`, `row` is set. Missing bitmap bytes read
    /// as clear.
    #[inline(always)]
    pub fn pixel(&self, col: u8, row: u8) -> bool {
        let at = row as usize * self.bytes_per_row() + col as usize / 8;
        self.bits.get(at).is_some_and(|b| b & (0x80 >> (col % 8)) != 0)
    }
}

impl Font {
    #[inline(always)]
    pub const fn contains(&self, c: u8) -> bool {
        c >= self.first_char && c <= self.last_char
    }

    pub fn glyph_count(&self) -> u16 {
        if self.last_char < self.first_char {
            return 0;
        }
        (self.last_char - self.first_char) as u16 + 1
    }

    /// Width in pixels, 0 when `c` is not in the font.
    pub fn char_width(&self, c: u8) -> u8 {
        if !self.contains(c) {
            return 0;
        }
        match self.glyphs {
            Glyphs::Fixed { width, .. } => width,
            Glyphs::Proportional { widths, .. } => {
                widths.get((c - self.first_char) as usize).copied().unwrap_or(0)
            }
        }
    }

    pub fn glyph(&self, c: u8) -> Option<Glyph> {
        if !self.contains(c) {
            return None;
        }
        let index = (c - self.first_char) as usize;
        let (width, bits) = match self.glyphs {
            Glyphs::Fixed { width, bitmaps } => {
                let size = (width as usize).div_ceil(8) * self.height as usize;
                let start = size * index;
                (width, bitmaps.get(start..start + size).unwrap_or(&[]))
            }
            Glyphs::Proportional { widths, bitmaps } => (
                widths.get(index).copied().unwrap_or(0),
                bitmaps.get(index).copied().unwrap_or(&[]),
            ),
        };
        Some(Glyph { width, height: self.height, bits })
    }
}
