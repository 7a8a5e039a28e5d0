//! # Drawing
//!
//! One byte per pixel, rows `linesize()` bytes apart. Coordinates are signed
//! so shapes may hang off any edge; everything is clipped to the picture and
//! calls that end up entirely off screen do nothing except bump
//! [`DrawStats::clipped`](crate::console::DrawStats).
//!
//! ```ignore
//! console.filled_rect(0, 0, 319, 239, 0)?;   // clear
//! console.rect(10, 10, 100, 60, 0x5c)?;
//! console.line(0, 0, 319, 239, 0x2f)?;
//! ```

use crate::{
    blitter::{MAX_BLOCK_MOVE_WIDTH, MIN_BLOCK_MOVE_WIDTH},
    console::Console,
    error::Error,
    transport::Transport,
};

/// Rectangles narrower than this are written row by row.
const DIRECT_FILL_WIDTH: u32 = 8;

impl<T: Transport> Console<T> {
    #[inline(always)]
    fn on_screen(&self, x: i16, y: i16) -> Option<(u16, u16)> {
        if x < 0 || y < 0 || x as u16 >= self.geometry.width || y as u16 >= self.geometry.height {
            return None;
        }
        Some((x as u16, y as u16))
    }

    #[inline(always)]
    fn pixel_address(&self, x: u16, y: u16) -> u32 {
        self.geometry.picture_line_address(y) + x as u32
    }

    pub fn set_pixel(&mut self, x: i16, y: i16, color: u8) -> Result<(), Error<T::Error>> {
        let Some((x, y)) = self.on_screen(x, y) else {
            self.stats.clipped += 1;
            return Ok(());
        };
        self.settle()?;
        self.bus.write_byte(self.pixel_address(x, y), color)?;
        Ok(())
    }

    /// Colour at `x`, `y`, or `None` off screen.
    pub fn read_pixel(&mut self, x: i16, y: i16) -> Result<Option<u8>, Error<T::Error>> {
        let Some((x, y)) = self.on_screen(x, y) else {
            return Ok(None);
        };
        self.settle()?;
        Ok(Some(self.bus.read_byte(self.pixel_address(x, y))?))
    }

    /// Fill the rectangle between two corners, inclusive.
    ///
    /// Corners must be given top left first; a reversed pair draws nothing
    /// and is not counted as clipped. The top row is written through the
    /// transport and, for wider rectangles, copied down row by row with the
    /// block mover.
    pub fn filled_rect(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color: u8) -> Result<(), Error<T::Error>> {
        if x1 > x2 || y1 > y2 {
            return Ok(());
        }
        let (w, h) = (self.geometry.width as i16, self.geometry.height as i16);
        let (x1, y1) = (x1.max(0), y1.max(0));
        let (x2, y2) = (x2.min(w - 1), y2.min(h - 1));
        if x1 > x2 || y1 > y2 {
            self.stats.clipped += 1;
            return Ok(());
        }

        let width = (x2 - x1 + 1) as u32;
        let stride = self.geometry.line_stride;
        let mut addr = self.pixel_address(x1 as u16, y1 as u16);
        self.settle()?;
        self.bus.fill_bytes(addr, width, color)?;

        if width < DIRECT_FILL_WIDTH {
            for _ in y1..y2 {
                addr += stride;
                self.bus.fill_bytes(addr, width, color)?;
            }
            return Ok(());
        }

        for _ in y1..y2 {
            let mut x = 0;
            while x < width {
                let chunk = (width - x).min(MAX_BLOCK_MOVE_WIDTH as u32);
                if chunk < MIN_BLOCK_MOVE_WIDTH as u32 {
                    // too narrow for the mover, and the row above is already known
                    self.settle()?;
                    self.bus.fill_bytes(addr + stride + x, chunk, color)?;
                } else {
                    self.copy_rect(addr + x, addr + stride + x, chunk as u8, 1)?;
                }
                x += chunk;
            }
            addr += stride;
        }
        Ok(())
    }

    pub fn hline(&mut self, x1: i16, y: i16, x2: i16, color: u8) -> Result<(), Error<T::Error>> {
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        self.filled_rect(x1, y, x2, y, color)
    }

    pub fn vline(&mut self, x: i16, y1: i16, y2: i16, color: u8) -> Result<(), Error<T::Error>> {
        let (y1, y2) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        let (y1, y2) = (y1.max(0), y2.min(self.geometry.height as i16 - 1));
        if x < 0 || x as u16 >= self.geometry.width || y1 > y2 {
            self.stats.clipped += 1;
            return Ok(());
        }
        self.settle()?;
        for y in y1..=y2 {
            self.bus.write_byte(self.pixel_address(x as u16, y as u16), color)?;
        }
        Ok(())
    }

    /// Straight line between two points, both included.
    pub fn line(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color: u8) -> Result<(), Error<T::Error>> {
        if x1 == x2 {
            return self.vline(x1, y1, y2, color);
        }
        if y1 == y2 {
            return self.hline(x1, y1, x2, color);
        }

        let (mut x, mut y) = (x1 as i32, y1 as i32);
        let (x2, y2) = (x2 as i32, y2 as i32);
        let dx = (x2 - x).abs();
        let dy = -(y2 - y).abs();
        let sx = if x < x2 { 1 } else { -1 };
        let sy = if y < y2 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.set_pixel(x as i16, y as i16, color)?;
            if x == x2 && y == y2 {
                return Ok(());
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Outline of the rectangle between two corners, in any order.
    pub fn rect(&mut self, x1: i16, y1: i16, x2: i16, y2: i16, color: u8) -> Result<(), Error<T::Error>> {
        let (x1, x2) = (x1.min(x2), x1.max(x2));
        let (y1, y2) = (y1.min(y2), y1.max(y2));
        self.hline(x1, y1, x2, color)?;
        self.hline(x1, y2, x2, color)?;
        self.vline(x1, y1, y2, color)?;
        self.vline(x2, y1, y2, color)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{self, Emu};
    use crate::Console;

    /// Every pixel of the picture, row major.
    fn screen(console: &Console<Emu>) -> std::vec::Vec<u8> {
        let g = *console.geometry();
        let sram = console.transport().chip.sram();
        (0..g.height)
            .flat_map(move |y| {
                let start = g.picture_line_address(y) as usize;
                sram[start..start + g.width as usize].iter().copied()
            })
            .collect()
    }

    fn count(console: &Console<Emu>, color: u8) -> usize {
        screen(console).iter().filter(|p| **p == color).count()
    }

    #[test]
    fn pixels_round_trip() {
        let mut console = testing::console();
        console.set_pixel(319, 239, 7).unwrap();
        assert_eq!(console.read_pixel(319, 239).unwrap(), Some(7));
        assert_eq!(console.read_pixel(320, 0).unwrap(), None);
    }

    #[test]
    fn off_screen_pixels_are_counted_not_written() {
        let mut console = testing::console();
        let writes = console.transport().chip.memory_writes();
        console.set_pixel(-1, 0, 9).unwrap();
        console.set_pixel(0, 240, 9).unwrap();
        assert_eq!(console.transport().chip.memory_writes(), writes);
        assert_eq!(console.stats().clipped, 2);
    }

    #[test]
    fn filled_rect_covers_exactly_the_area() {
        let mut console = testing::console();
        console.filled_rect(10, 20, 59, 29, 0x33).unwrap();
        assert_eq!(count(&console, 0x33), 50 * 10);
        for (x, y) in [(10, 20), (59, 20), (10, 29), (59, 29)] {
            assert_eq!(console.read_pixel(x, y).unwrap(), Some(0x33));
        }
        for (x, y) in [(9, 20), (60, 20), (10, 19), (10, 30)] {
            assert_eq!(console.read_pixel(x, y).unwrap(), Some(0));
        }
        assert!(console.stats().block_moves > 0);
    }

    #[test]
    fn narrow_and_wide_paths_agree() {
        let mut narrow = testing::console();
        narrow.filled_rect(100, 50, 106, 60, 0x44).unwrap();
        narrow.filled_rect(107, 50, 107, 60, 0x44).unwrap();

        let mut wide = testing::console();
        wide.filled_rect(100, 50, 107, 60, 0x44).unwrap();

        assert_eq!(screen(&narrow), screen(&wide));
        assert_eq!(narrow.stats().block_moves, 0);
        assert!(wide.stats().block_moves > 0);
    }

    #[test]
    fn filled_rect_matches_pixel_fill() {
        for width in [7, 8] {
            let mut filled = testing::console();
            filled.filled_rect(40, 60, 40 + width - 1, 69, 0x5a).unwrap();

            let mut plotted = testing::console();
            for y in 60..70 {
                for x in 40..40 + width {
                    plotted.set_pixel(x, y, 0x5a).unwrap();
                }
            }
            assert_eq!(screen(&filled), screen(&plotted), "width {}", width);
        }
    }

    #[test]
    fn drawing_leaves_index_table_alone() {
        let mut console = testing::console();
        let g = *console.geometry();
        let index = g.index_start_bytes() as usize..g.picture_start as usize;
        let before = console.transport().chip.sram()[index.clone()].to_vec();

        console.filled_rect(-5, -5, 400, 400, 0xee).unwrap();
        console.line(0, 239, 319, 0, 0x12).unwrap();
        console.set_pixel(319, 239, 0x34).unwrap();

        assert_eq!(console.transport().chip.sram()[index], before[..]);
        assert_eq!(console.transport().chip.block_mover.quirk_hits, 0);
    }

    #[test]
    fn wide_rows_are_chunked() {
        let mut console = testing::console();
        console.filled_rect(0, 0, 319, 1, 0x11).unwrap();
        assert_eq!(count(&console, 0x11), 640);
        // 250 + 70 bytes copied for the second row
        assert_eq!(console.stats().block_moves, 2);
    }

    #[test]
    fn odd_remainder_still_fills() {
        let mut console = testing::console();
        // 252 wide: a 250 byte move and a 2 byte remainder
        console.filled_rect(0, 0, 251, 3, 0x22).unwrap();
        assert_eq!(count(&console, 0x22), 252 * 4);
        assert_eq!(console.transport().chip.block_mover.quirk_hits, 0);
    }

    #[test]
    fn clipping() {
        let mut console = testing::console();
        console.filled_rect(-10, -10, 9, 9, 0x55).unwrap();
        assert_eq!(count(&console, 0x55), 100);

        console.filled_rect(310, 230, 400, 400, 0x66).unwrap();
        assert_eq!(count(&console, 0x66), 100);

        console.filled_rect(400, 0, 500, 10, 0x77).unwrap();
        assert_eq!(count(&console, 0x77), 0);
        assert_eq!(console.stats().clipped, 1);
    }

    #[test]
    fn reversed_corners_draw_nothing_and_are_not_clipped() {
        let mut console = testing::console();
        console.filled_rect(50, 50, 40, 60, 0x77).unwrap();
        console.filled_rect(40, 60, 50, 50, 0x77).unwrap();
        assert_eq!(count(&console, 0x77), 0);
        assert_eq!(console.stats().clipped, 0);
    }

    #[test]
    fn direct_access_waits_for_running_moves() {
        let mut console = testing::console();
        console.transport_mut().chip.block_mover.latency = 3;

        console.filled_rect(0, 10, 99, 11, 0x44).unwrap();
        assert_eq!(console.read_pixel(50, 11).unwrap(), Some(0x44));

        console.filled_rect(0, 20, 251, 23, 0x22).unwrap();
        console.set_pixel(5, 23, 0x01).unwrap();
        console.vline(6, 20, 23, 0x01).unwrap();
        assert_eq!(console.read_pixel(5, 23).unwrap(), Some(0x01));
        assert_eq!(count(&console, 0x22), 252 * 4 - 5);

        let chip = &console.transport().chip;
        assert_eq!(chip.access_during_move, 0);
        assert_eq!(chip.block_mover.overruns, 0);
        assert!(chip.block_mover.moves > 0);
    }

    #[test]
    fn lines() {
        let mut console = testing::console();
        console.line(0, 0, 9, 9, 1).unwrap();
        assert_eq!(count(&console, 1), 10);
        assert!((0..10).all(|i| console.read_pixel(i, i).unwrap() == Some(1)));

        console.line(20, 5, 20, 1, 2).unwrap();
        assert_eq!(count(&console, 2), 5);

        console.line(30, 7, 25, 7, 3).unwrap();
        assert_eq!(count(&console, 3), 6);

        console.line(0, 100, 4, 102, 4).unwrap();
        assert_eq!(console.read_pixel(0, 100).unwrap(), Some(4));
        assert_eq!(console.read_pixel(4, 102).unwrap(), Some(4));
    }

    #[test]
    fn rect_outline() {
        let mut console = testing::console();
        console.rect(50, 40, 10, 20, 8).unwrap();
        // 41 × 21 outline
        assert_eq!(count(&console, 8), 2 * 41 + 2 * 19);
        assert_eq!(console.read_pixel(30, 30).unwrap(), Some(0));
    }
}
