//! # Text
//!
//! Glyphs are drawn one of two ways:
//!
//! * directly, pixel by pixel from the font bitmap, or
//! * from a glyph cache: [`Console::set_font`] renders every glyph once into
//!   SRAM after the picture, in the current colours, and later characters are
//!   block moves from there.
//!
//! The cache starts with a 256-entry directory of 3 bytes per glyph:
//!
//! ```text
//! [width] [offset >> 8] [offset & 0xff]
//! ```
//!
//! where `offset` is relative to the start of the rendered glyphs. Glyphs
//! are laid out left to right in rows of font height, with the picture's row
//! stride, wrapping when the next one would reach the picture width.
//!
//! ```ignore
//! console.set_colors(15, 0);
//! console.set_font(Some(&FONT))?;
//! console.set_pos(0, 0);
//! console.puts("score: ")?;
//! console.printn(-42)?;
//! ```

use core::fmt;

use heapless::Vec;
use log::debug;

use crate::{
    blitter::MAX_BLOCK_MOVE_WIDTH,
    console::Console,
    error::Error,
    font::{Font, PLACEHOLDER},
    geometry::SRAM_BYTES,
    transport::Transport,
};

/// One glyph directory entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GlyphSlot {
    pub width: u8,
    pub offset: u16,
}

impl GlyphSlot {
    #[inline(always)]
    pub fn to_bytes(self) -> [u8; 3] {
        let [hi, lo] = self.offset.to_be_bytes();
        [self.width, hi, lo]
    }

    #[inline(always)]
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        GlyphSlot { width: bytes[0], offset: u16::from_be_bytes([bytes[1], bytes[2]]) }
    }
}

/// Where the rendered glyphs of the current font live.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GlyphCache {
    pub directory: u32,
    pub bitmaps: u32,
}

impl<T: Transport> Console<T> {
    /// Make `font` current and render its glyphs into the cache.
    ///
    /// `None` selects the placeholder font. Glyphs are rendered in the
    /// colours current at this call, so call it again after changing
    /// colours. Calling it twice with the same font and colours leaves SRAM
    /// unchanged.
    pub fn set_font(&mut self, font: Option<&'static Font>) -> Result<(), Error<T::Error>> {
        let font = font.unwrap_or(&PLACEHOLDER);
        self.font = font;
        self.glyph_cache = None;
        self.settle()?;

        let g = self.geometry;
        let cache = GlyphCache {
            directory: g.glyph_directory_address(),
            bitmaps: g.glyph_bitmap_address(),
        };
        let stride = g.line_stride;
        let height = font.height as u32;
        let (fg, bg) = (self.fg, self.bg);

        let (mut x, mut row) = (0u32, 0u32);
        let mut pixels = [0u8; 256];
        for i in 0..font.glyph_count() {
            let c = font.first_char + i as u8;
            let Some(glyph) = font.glyph(c) else { continue };
            let width = glyph.width as u32;

            if x + width >= g.width as u32 {
                row += 1;
                x = 0;
            }
            let offset = row * height * stride + x;
            let end = cache.bitmaps + offset + height.saturating_sub(1) * stride + width;
            if offset > u16::MAX as u32 || end > SRAM_BYTES {
                return Err(Error::GlyphCacheFull { needed: end, available: SRAM_BYTES });
            }

            let slot = GlyphSlot { width: glyph.width, offset: offset as u16 };
            self.bus.write_bytes(cache.directory + i as u32 * 3, &slot.to_bytes())?;

            for r in 0..glyph.height {
                let line = &mut pixels[..glyph.width as usize];
                for (col, p) in line.iter_mut().enumerate() {
                    *p = if glyph.pixel(col as u8, r) { fg } else { bg };
                }
                self.bus.write_bytes(cache.bitmaps + offset + r as u32 * stride, line)?;
            }
            x += width;
        }

        debug!(
            "glyph cache: {} glyphs, {} rows of {} lines at {:05X}",
            font.glyph_count(), row + 1, height, cache.bitmaps,
        );
        self.glyph_cache = Some(cache);
        Ok(())
    }

    /// Pixel width of `c` in `font`, 0 when the font lacks it.
    pub fn char_width(&self, c: u8, font: &Font) -> u8 {
        font.char_width(c)
    }

    /// Draw `c` from the glyph cache with its top left corner at `x`, `y`.
    /// Returns the x coordinate after the glyph.
    pub fn vblitchar(&mut self, c: u8, x: i16, y: i16) -> Result<i16, Error<T::Error>> {
        let font = self.font;
        if !font.contains(c) {
            return Ok(x);
        }
        let Some(cache) = self.glyph_cache else {
            return self.blitchar(c, x, y, font);
        };

        let mut entry = [0u8; 3];
        let index = (c - font.first_char) as u32;
        self.settle()?;
        self.bus.read_bytes(cache.directory + index * 3, &mut entry)?;
        let slot = GlyphSlot::from_bytes(entry);

        let (w, h) = (slot.width as i32, font.height as i32);
        let (x0, y0) = (x as i32, y as i32);
        let left = x0.max(0);
        let top = y0.max(0);
        let right = (x0 + w).min(self.geometry.width as i32);
        let bottom = (y0 + h).min(self.geometry.height as i32);
        if left >= right || top >= bottom {
            self.stats.clipped += 1;
            return Ok(x.saturating_add(slot.width as i16));
        }

        let stride = self.geometry.line_stride;
        let src = cache.bitmaps + slot.offset as u32 + (top - y0) as u32 * stride + (left - x0) as u32;
        let dst = self.geometry.picture_line_address(top as u16) + left as u32;
        self.copy_rect(src, dst, (right - left) as u8, (bottom - top) as u8)?;

        Ok(x.saturating_add(slot.width as i16))
    }

    /// Draw `c` pixel by pixel from `font`'s bitmap. Clear pixels are left
    /// untouched when foreground and background colours are equal.
    pub fn blitchar(&mut self, c: u8, x: i16, y: i16, font: &Font) -> Result<i16, Error<T::Error>> {
        let Some(glyph) = font.glyph(c) else {
            return Ok(x);
        };
        let (fg, bg) = (self.fg, self.bg);
        let opaque = fg != bg;

        for row in 0..glyph.height {
            let py = y.saturating_add(row as i16);
            if py >= self.geometry.height as i16 {
                break;
            }
            for col in 0..glyph.width {
                let px = x.saturating_add(col as i16);
                if glyph.pixel(col, row) {
                    self.set_pixel(px, py, fg)?;
                } else if opaque {
                    self.set_pixel(px, py, bg)?;
                }
            }
        }
        Ok(x.saturating_add(glyph.width as i16))
    }

    /// Draw one character at the cursor and advance it.
    ///
    /// `\n` moves the cursor down one font height, `\r` back to column 0.
    /// Characters the font lacks draw the placeholder box.
    pub fn putc(&mut self, c: u8) -> Result<i16, Error<T::Error>> {
        let (x, y) = (self.cursor_x, self.cursor_y);
        match c {
            b'\n' => {
                self.cursor_y = y.saturating_add(self.font.height as i16);
                return Ok(x);
            }
            b'\r' => {
                self.cursor_x = 0;
                return Ok(0);
            }
            _ => {}
        }

        self.cursor_x = if !self.font.contains(c) {
            self.blitchar(PLACEHOLDER.first_char, x, y, &PLACEHOLDER)?
        } else if self.glyph_cache.is_some() {
            self.vblitchar(c, x, y)?
        } else {
            self.blitchar(c, x, y, self.font)?
        };
        Ok(self.cursor_x)
    }

    pub fn puts(&mut self, s: &str) -> Result<i16, Error<T::Error>> {
        for c in s.bytes() {
            self.putc(c)?;
        }
        Ok(self.cursor_x)
    }

    /// Print `n` in decimal at the cursor.
    pub fn printn(&mut self, n: i32) -> Result<i16, Error<T::Error>> {
        if n < 0 {
            self.putc(b'-')?;
        }
        let mut rest = n.unsigned_abs();
        let mut digits: Vec<u8, 10> = Vec::new();
        loop {
            // at most 10 digits in a u32
            let pushed = digits.push(b'0' + (rest % 10) as u8);
            debug_assert!(pushed.is_ok());
            rest /= 10;
            if rest == 0 {
                break;
            }
        }
        for d in digits.iter().rev() {
            self.putc(*d)?;
        }
        Ok(self.cursor_x)
    }

    /// Move the picture up by `lines` rows and clear the rows exposed at the
    /// bottom to the background colour.
    pub fn scroll_up(&mut self, lines: i16) -> Result<(), Error<T::Error>> {
        let (w, h) = (self.geometry.width as i16, self.geometry.height as i16);
        if lines <= 0 {
            return Ok(());
        }
        if lines >= h {
            return self.filled_rect(0, 0, w - 1, h - 1, self.bg);
        }

        let stride = self.geometry.line_stride;
        let mut src = self.geometry.picture_line_address(lines as u16);
        let mut dst = self.geometry.picture_line_address(0);
        for _ in 0..h - lines {
            self.copy_row(src, dst)?;
            src += stride;
            dst += stride;
        }
        self.filled_rect(0, h - lines, w - 1, h - 1, self.bg)
    }

    /// Move the picture down by `lines` rows and clear the rows exposed at
    /// the top to the background colour.
    pub fn scroll_down(&mut self, lines: i16) -> Result<(), Error<T::Error>> {
        let (w, h) = (self.geometry.width as i16, self.geometry.height as i16);
        if lines <= 0 {
            return Ok(());
        }
        if lines >= h {
            return self.filled_rect(0, 0, w - 1, h - 1, self.bg);
        }

        let stride = self.geometry.line_stride;
        let mut src = self.geometry.picture_line_address((h - lines - 1) as u16);
        let mut dst = self.geometry.picture_line_address(h as u16 - 1);
        for _ in 0..h - lines {
            self.copy_row(src, dst)?;
            src = src.wrapping_sub(stride);
            dst = dst.wrapping_sub(stride);
        }
        self.filled_rect(0, 0, w - 1, lines - 1, self.bg)
    }

    /// One picture row, split into moves the block mover can take.
    fn copy_row(&mut self, src: u32, dst: u32) -> Result<(), Error<T::Error>> {
        let width = self.geometry.width;
        let parts = width.div_ceil(MAX_BLOCK_MOVE_WIDTH);
        let part = width.div_ceil(parts);
        let mut x = 0;
        while x < width {
            let n = part.min(width - x);
            self.copy_rect(src + x as u32, dst + x as u32, n as u8, 1)?;
            x += n;
        }
        Ok(())
    }
}

impl<T: Transport> fmt::Write for Console<T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.puts(s).map(|_| ()).map_err(|_| fmt::Error)
    }
}
