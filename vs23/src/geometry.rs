//! # Video geometry
//!
//! All timing and memory layout values are derived once, at compile time for
//! the built-in presets, from a crystal frequency, a per-standard timing
//! table and the requested picture size.
//!
//! Analog durations are converted to color clocks (one crystal period) and
//! PLL clocks (eight per color clock) with floating point arithmetic and
//! truncated, so a given configuration always yields the same integers.
//!
//! ## SRAM layout
//!
//! ```text
//! 0                      protolines, `protoline_words` words each
//! index_start_bytes()    one 3-byte index entry per scan line
//! picture_start          `height` rows, `line_stride` bytes apart
//! glyph_directory        256 × 3 byte glyph directory
//! glyph_bitmaps          rendered glyphs, same stride as the picture
//! ```

use crate::error::ConfigError;
use crate::regs::VideoControl2;

/// 64K 16-bit words.
pub const SRAM_BYTES: u32 = 0x20000;
/// One 3-byte entry per character code.
pub const GLYPH_DIRECTORY_BYTES: u32 = 256 * 3;
/// Bits per picture pixel.
pub const PIXEL_BITS: u16 = 8;

const MAX_PROTOLINES: u16 = 16;
const MAX_LINES: u16 = 1 << 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Standard {
    Pal,
    /// Experimental; not verified on hardware.
    Ntsc,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Pulse {
    Short,
    Long,
}

/// Sync pulses of one vertical sync protoline, at the line start and at half
/// line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VsyncShape {
    pub first: Pulse,
    pub second: Pulse,
}

/// A scan line counted from the top or the bottom of the frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameLine {
    Top(u16),
    /// `FromEnd(1)` is the last line of the frame.
    FromEnd(u16),
}

/// Output levels, as words written into protolines.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Levels {
    pub sync: u16,
    pub blank: u16,
    pub black: u16,
    pub burst: u16,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Plane {
    V = 0,
    U = 1,
    Y = 2,
}

/// One pattern generator op: which plane to pick, how many bits, how far to
/// shift the pixel afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MicroOp(pub u8);

impl MicroOp {
    pub const NOTHING: MicroOp = MicroOp(3 << 6);

    pub const fn pick(plane: Plane, bits: u8, shift: u8) -> MicroOp {
        MicroOp(((plane as u8) << 6) | ((bits - 1) << 3) | shift)
    }
}

/// Four ops, executed first to last for every pixel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Microcode(pub [MicroOp; 4]);

impl Microcode {
    pub const fn bits(&self) -> u32 {
        let [a, b, c, d] = self.0;
        ((d.0 as u32) << 24) | ((c.0 as u32) << 16) | ((b.0 as u32) << 8) | a.0 as u32
    }
}

/// Analog timing of one broadcast standard. Durations are in microseconds.
#[derive(Debug, PartialEq)]
pub struct Timing {
    pub line_us: f64,
    pub total_lines: u16,
    pub sync_us: f64,
    pub short_sync_us: f64,
    pub long_sync_us: f64,
    pub burst_us: f64,
    pub burst_duration_us: f64,
    pub blank_end_us: f64,
    pub front_porch_us: f64,
    pub pllclks_per_pixel: u16,
    /// Extra bytes after every picture line.
    pub line_padding: u16,
    pub levels: Levels,
    /// Write black level from blank end up to the picture start.
    pub black_before_picture: bool,
    pub microcode: Microcode,
    /// Shapes of protolines 1, 2, ...
    pub vsync: &'static [VsyncShape],
    pub frame: &'static [(FrameLine, u16)],
}

const PAL_TIMING: Timing = Timing {
    line_us: 64.0,
    total_lines: 313,
    sync_us: 4.7,
    short_sync_us: 2.35,
    long_sync_us: 27.3,
    burst_us: 5.6,
    burst_duration_us: 2.25,
    blank_end_us: 10.5,
    front_porch_us: 62.35,
    pllclks_per_pixel: 5,
    line_padding: 3,
    levels: Levels { sync: 0x0000, blank: 0x005b, black: 0x005b, burst: 0x2e5b },
    black_before_picture: false,
    microcode: Microcode([
        MicroOp::pick(Plane::V, 2, 2),
        MicroOp::pick(Plane::U, 2, 2),
        MicroOp::pick(Plane::Y, 4, 4),
        MicroOp::NOTHING,
    ]),
    vsync: &[
        VsyncShape { first: Pulse::Short, second: Pulse::Short },
        VsyncShape { first: Pulse::Long, second: Pulse::Long },
        VsyncShape { first: Pulse::Long, second: Pulse::Short },
    ],
    frame: &[
        (FrameLine::Top(0), 2),
        (FrameLine::Top(1), 2),
        (FrameLine::Top(2), 3),
        (FrameLine::Top(3), 1),
        (FrameLine::Top(4), 1),
        (FrameLine::FromEnd(3), 1),
        (FrameLine::FromEnd(2), 1),
        (FrameLine::FromEnd(1), 1),
    ],
};

const NTSC_TIMING: Timing = Timing {
    line_us: 63.5555,
    total_lines: 263,
    sync_us: 4.7,
    short_sync_us: 2.542,
    long_sync_us: 27.33275,
    burst_us: 5.3,
    burst_duration_us: 2.67,
    blank_end_us: 9.155,
    front_porch_us: 61.8105,
    pllclks_per_pixel: 5,
    line_padding: 0,
    levels: Levels { sync: 0x0000, blank: 0x0d66, black: 0x0066, burst: 0x0d66 },
    black_before_picture: true,
    microcode: Microcode([
        MicroOp::pick(Plane::U, 2, 2),
        MicroOp::pick(Plane::V, 2, 2),
        MicroOp::pick(Plane::Y, 4, 4),
        MicroOp::NOTHING,
    ]),
    vsync: &[
        VsyncShape { first: Pulse::Short, second: Pulse::Short },
        VsyncShape { first: Pulse::Long, second: Pulse::Long },
    ],
    frame: &[
        (FrameLine::Top(0), 1),
        (FrameLine::Top(1), 1),
        (FrameLine::Top(2), 1),
        (FrameLine::Top(3), 1),
        (FrameLine::Top(4), 2),
        (FrameLine::Top(5), 2),
        (FrameLine::Top(6), 2),
        (FrameLine::Top(7), 1),
        (FrameLine::Top(8), 1),
        (FrameLine::Top(9), 1),
    ],
};

impl Standard {
    pub const fn timing(self) -> &'static Timing {
        match self {
            Standard::Pal => &PAL_TIMING,
            Standard::Ntsc => &NTSC_TIMING,
        }
    }
}

/// What the user chooses; everything else is derived.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VideoConfig {
    pub standard: Standard,
    pub xtal_mhz: f64,
    pub width: u16,
    pub height: u16,
    /// Scan line showing picture row 0.
    pub first_picture_line: u16,
}

impl VideoConfig {
    pub const PAL: VideoConfig = VideoConfig {
        standard: Standard::Pal,
        xtal_mhz: 4.43361875,
        width: 320,
        height: 240,
        first_picture_line: 40,
    };

    /// 320 pixels do not fit between NTSC blank end and front porch.
    pub const NTSC: VideoConfig = VideoConfig {
        standard: Standard::Ntsc,
        xtal_mhz: 3.579545,
        width: 288,
        height: 200,
        first_picture_line: 40,
    };

    #[cfg(not(feature = "ntsc"))]
    pub const DEFAULT: VideoConfig = VideoConfig::PAL;
    #[cfg(feature = "ntsc")]
    pub const DEFAULT: VideoConfig = VideoConfig::NTSC;
}

/// Derived timing and memory layout.
#[derive(Debug, Copy, Clone)]
pub struct Geometry {
    pub standard: Standard,
    pub width: u16,
    pub height: u16,
    pub total_lines: u16,
    pub first_picture_line: u16,

    pub pllclks_per_line: u16,
    pub pllclks_per_pixel: u16,

    pub protolines: u16,
    pub protoline_words: u16,
    /// Last color clock of a protoline, inclusive.
    pub protoline_last: u16,
    pub protoline_half: u16,

    pub sync: u16,
    pub burst: u16,
    pub burst_duration: u16,
    pub blank_end: u16,
    pub short_sync: u16,
    pub short_sync_mid: u16,
    pub long_sync: u16,
    pub long_sync_mid: u16,

    pub start_pix: u16,
    pub end_pix: u16,

    pub index_start_longwords: u16,
    pub picture_start: u32,
    pub line_stride: u32,

    pub levels: Levels,
    pub black_before_picture: bool,
    pub microcode: Microcode,

    timing: &'static Timing,
}

impl Geometry {
    pub const PAL: Geometry = Geometry::expect(Geometry::derive(&VideoConfig::PAL));
    pub const NTSC: Geometry = Geometry::expect(Geometry::derive(&VideoConfig::NTSC));
    pub const DEFAULT: Geometry = Geometry::expect(Geometry::derive(&VideoConfig::DEFAULT));

    const fn expect(derived: Result<Geometry, ConfigError>) -> Geometry {
        match derived {
            Ok(g) => g,
            Err(_) => panic!("built-in video configuration does not fit the chip"),
        }
    }

    pub const fn derive(config: &VideoConfig) -> Result<Geometry, ConfigError> {
        let t = config.standard.timing();
        let xtal = config.xtal_mhz;
        let pll = xtal * 8.0;
        let (width, height) = (config.width, config.height);

        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroSize);
        }

        let pllclks_per_line = (t.line_us * pll + 0.5 - 10.0) as u16;
        if pllclks_per_line >= 0x8000 {
            return Err(ConfigError::LineTooLong { pllclks: pllclks_per_line });
        }

        let protolines = t.vsync.len() as u16 + 1;
        if protolines > MAX_PROTOLINES {
            return Err(ConfigError::TooManyProtolines { protolines });
        }
        if t.total_lines > MAX_LINES {
            return Err(ConfigError::TooManyLines { lines: t.total_lines });
        }

        let protoline_words = (t.line_us * xtal + 0.5) as u16;
        let protoline_last = (t.line_us * xtal + 0.5 - 10.0 / 8.0) as u16;
        let protoline_half = (t.line_us * xtal / 2.0 + 0.5 - 10.0 / 8.0) as u16;
        let blank_end = (t.blank_end_us * xtal - 10.0 / 8.0) as u16;

        // centre the picture in the visible part of the line
        let pixel_us = t.pllclks_per_pixel as f64 / pll;
        let visible_pixels = (t.front_porch_us - t.blank_end_us) / pixel_us;
        let extra = visible_pixels - width as f64;
        let start_pix = (if extra > 0.0 { ((extra + 0.5) / 3.0) as u16 } else { 0 }) + blank_end;
        let end_pix = start_pix + ((t.pllclks_per_pixel as u32 * width as u32) / 8) as u16;

        let available = ((end_pix - start_pix) as u32 * 8 / t.pllclks_per_pixel as u32) as u16;
        if available < width {
            return Err(ConfigError::PictureTooNarrow { requested: width, available });
        }
        let front_porch = (t.front_porch_us * xtal) as u16;
        if end_pix > front_porch {
            return Err(ConfigError::PictureOverrunsLine { end: end_pix, limit: front_porch });
        }

        let mut first_free = 0;
        let mut last_free = t.total_lines - 1;
        let mut i = 0;
        while i < t.frame.len() {
            match t.frame[i].0 {
                FrameLine::Top(n) => {
                    if n + 1 > first_free {
                        first_free = n + 1;
                    }
                }
                FrameLine::FromEnd(n) => {
                    if t.total_lines - n - 1 < last_free {
                        last_free = t.total_lines - n - 1;
                    }
                }
            }
            i += 1;
        }
        if config.first_picture_line < first_free
            || config.first_picture_line as u32 + height as u32 - 1 > last_free as u32
        {
            return Err(ConfigError::FrameTooShort { first_free, last_free });
        }

        let proto_words = protoline_words as u32 * protolines as u32;
        let index_start_longwords = ((proto_words + 1) / 2) as u16;
        let index_start_bytes = index_start_longwords as u32 * 4;
        let picture_start = index_start_bytes + t.total_lines as u32 * 3 + 2;

        // one spare byte per line, plus padding
        let line_stride = (available * PIXEL_BITS / 8) as u32 + 1 + t.line_padding as u32;
        if line_stride > u16::MAX as u32 {
            return Err(ConfigError::StrideTooLarge { stride: line_stride });
        }

        let needed = picture_start + line_stride * height as u32 + GLYPH_DIRECTORY_BYTES;
        if needed > SRAM_BYTES {
            return Err(ConfigError::OutOfMemory { needed, available: SRAM_BYTES });
        }

        Ok(Geometry {
            standard: config.standard,
            width,
            height,
            total_lines: t.total_lines,
            first_picture_line: config.first_picture_line,
            pllclks_per_line,
            pllclks_per_pixel: t.pllclks_per_pixel,
            protolines,
            protoline_words,
            protoline_last,
            protoline_half,
            sync: (t.sync_us * xtal - 10.0 / 8.0) as u16,
            burst: (t.burst_us * xtal - 10.0 / 8.0) as u16,
            burst_duration: (t.burst_duration_us * xtal) as u16,
            blank_end,
            short_sync: (t.short_sync_us * xtal - 10.0 / 8.0) as u16,
            short_sync_mid: (t.short_sync_us * xtal) as u16,
            long_sync: (t.long_sync_us * xtal) as u16,
            long_sync_mid: (t.long_sync_us * xtal) as u16,
            start_pix,
            end_pix,
            index_start_longwords,
            picture_start,
            line_stride,
            levels: t.levels,
            black_before_picture: t.black_before_picture,
            microcode: t.microcode,
            timing: t,
        })
    }

    /// Word address of protoline `n`.
    #[inline(always)]
    pub const fn protoline_address(&self, n: u16) -> u32 {
        self.protoline_words as u32 * n as u32
    }

    #[inline(always)]
    pub const fn index_start_bytes(&self) -> u32 {
        self.index_start_longwords as u32 * 4
    }

    #[inline(always)]
    pub const fn index_entry_address(&self, line: u16) -> u32 {
        self.index_start_bytes() + line as u32 * 3
    }

    /// Byte address of picture row `n`.
    #[inline(always)]
    pub const fn picture_line_address(&self, n: u16) -> u32 {
        self.picture_start + self.line_stride * n as u32
    }

    #[inline(always)]
    pub const fn glyph_directory_address(&self) -> u32 {
        self.picture_line_address(self.height)
    }

    #[inline(always)]
    pub const fn glyph_bitmap_address(&self) -> u32 {
        self.glyph_directory_address() + GLYPH_DIRECTORY_BYTES
    }

    pub fn video_control2(&self) -> u16 {
        let flags = match self.standard {
            Standard::Pal => VideoControl2::ENABLE_VIDEO | VideoControl2::PAL,
            Standard::Ntsc => VideoControl2::ENABLE_VIDEO,
        };
        flags.with_timing(self.total_lines, self.pllclks_per_pixel)
    }

    pub fn vsync_shapes(&self) -> &'static [VsyncShape] {
        self.timing.vsync
    }

    /// Physical line and protoline of every vertical sync line.
    pub fn vsync_frame(&self) -> impl Iterator<Item = (u16, u16)> + 'static {
        let total = self.total_lines;
        self.timing.frame.iter().map(move |&(line, proto)| match line {
            FrameLine::Top(n) => (n, proto),
            FrameLine::FromEnd(n) => (total - n, proto),
        })
    }

    /// Length in color clocks of a sync pulse at the line start or at half line.
    #[inline(always)]
    pub fn pulse_length(&self, pulse: Pulse, at_half_line: bool) -> u16 {
        match (pulse, at_half_line) {
            (Pulse::Short, false) => self.short_sync,
            (Pulse::Short, true) => self.short_sync_mid,
            (Pulse::Long, false) => self.long_sync,
            (Pulse::Long, true) => self.long_sync_mid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pal_timing() {
        let g = Geometry::PAL;
        assert_eq!(g.total_lines, 313);
        assert_eq!(g.pllclks_per_line, 2260);
        assert_eq!(g.protoline_words, 284);
        assert_eq!(g.protoline_last, 283);
        assert_eq!(g.protoline_half, 141);
        assert_eq!(g.protolines, 4);
        assert_eq!((g.sync, g.burst, g.burst_duration, g.blank_end), (19, 23, 9, 45));
        assert_eq!((g.short_sync, g.short_sync_mid), (9, 10));
        assert_eq!((g.long_sync, g.long_sync_mid), (121, 121));
        assert_eq!((g.start_pix, g.end_pix), (61, 261));
    }

    #[test]
    fn pal_layout() {
        let g = Geometry::PAL;
        assert_eq!(g.index_start_longwords, 568);
        assert_eq!(g.index_start_bytes(), 2272);
        assert_eq!(g.picture_start, 3213);
        assert_eq!(g.line_stride, 324);
        assert_eq!(g.picture_line_address(1), 3213 + 324);
        assert_eq!(g.glyph_directory_address(), 80973);
        assert_eq!(g.glyph_bitmap_address(), 81741);
        assert_eq!(g.protoline_address(3), 852);
    }

    #[test]
    fn pal_registers() {
        let g = Geometry::PAL;
        assert_eq!(g.microcode.bits(), 0xC09C_4A0A);
        assert_eq!(g.video_control2(), 0xD138);
    }

    #[test]
    fn pal_vsync_frame() {
        let frame: heapless::Vec<(u16, u16), 16> = Geometry::PAL.vsync_frame().collect();
        assert_eq!(
            frame.as_slice(),
            &[(0, 2), (1, 2), (2, 3), (3, 1), (4, 1), (310, 1), (311, 1), (312, 1)],
        );
    }

    #[test]
    fn ntsc_preset_fits() {
        let g = Geometry::NTSC;
        assert_eq!(g.total_lines, 263);
        assert_eq!(g.protolines, 3);
        assert_eq!(g.width, 288);
        assert_eq!(g.line_stride, 289);
        assert_eq!(g.microcode.bits(), 0xC09C_0A4A);
        assert_eq!(g.video_control2(), 0x9106);
        assert!(g.black_before_picture);
    }

    #[test]
    fn ntsc_full_width_overruns_line() {
        let config = VideoConfig { width: 320, ..VideoConfig::NTSC };
        assert!(matches!(
            Geometry::derive(&config),
            Err(ConfigError::PictureOverrunsLine { .. }),
        ));
    }

    #[test]
    fn rejects_bad_configs() {
        let zero = VideoConfig { width: 0, ..VideoConfig::PAL };
        assert_eq!(Geometry::derive(&zero).err(), Some(ConfigError::ZeroSize));

        let early = VideoConfig { first_picture_line: 3, ..VideoConfig::PAL };
        assert_eq!(
            Geometry::derive(&early).err(),
            Some(ConfigError::FrameTooShort { first_free: 5, last_free: 309 }),
        );

        let tall = VideoConfig { height: 300, ..VideoConfig::PAL };
        assert!(matches!(Geometry::derive(&tall), Err(ConfigError::FrameTooShort { .. })));
    }

    #[test]
    fn microcode_ops() {
        assert_eq!(MicroOp::pick(Plane::V, 2, 2).0, 0x0A);
        assert_eq!(MicroOp::pick(Plane::U, 2, 2).0, 0x4A);
        assert_eq!(MicroOp::pick(Plane::Y, 4, 4).0, 0x9C);
        assert_eq!(MicroOp::NOTHING.0, 0xC0);
    }
}
