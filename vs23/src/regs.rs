//! # Opcodes and Register Flags
//!
//! Every chip operation starts with one opcode byte. The general SRAM
//! commands come first, then the video and block-move registers.
//!
//! ## VideoControl1 (`2B`)
//!
//! | Flag               | Effect                                          |
//! |--------------------|-------------------------------------------------|
//! | `PLL_ENABLE`       | Start the 8× crystal PLL                        |
//! | `SELECT_PLL_CLOCK` | Clock the video generator from the PLL          |
//!
//! ## VideoControl2 (`2D`)
//!
//! Bits 0-9 hold the frame length in lines minus one, bits 10-13 the PLL
//! clocks per pixel minus one.
//!
//! ## BlockMoveControl (third byte of `34`)
//!
//! Direction, odd-address halves of source and destination, and the DAC and
//! luma filter controls shared with the video output.

use bit_field::BitField;

// general SRAM commands
pub const WRITE_STATUS: u8  = 0x01;
pub const WRITE: u8         = 0x02;
pub const READ: u8          = 0x03;
pub const READ_STATUS: u8   = 0x05;
pub const READ_MULTIIC: u8  = 0xb7;
pub const WRITE_MULTIIC: u8 = 0xb8;
pub const READ_ID: u8       = 0x9f;

// video commands
pub const PROGRAM: u8       = 0x30;
pub const PICSTART: u8      = 0x28;
pub const PICEND: u8        = 0x29;
pub const LINELEN: u8       = 0x2a;
pub const VDCTRL1: u8       = 0x2b;
pub const INDEXSTART: u8    = 0x2c;
pub const VDCTRL2: u8       = 0x2d;
pub const BLOCKMVC1: u8     = 0x34;
pub const BLOCKMVC2: u8     = 0x35;
pub const BLOCKMVST: u8     = 0x36;
pub const CURLINE: u8       = 0x53;

/// Multi-IC control value that leaves only chip 0 enabled.
pub const MULTI_IC_CHIP0_ONLY: u8 = 0x0e;

bitflags::bitflags! {
    /// SRAM status register, written with `WRITE_STATUS`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Status: u8 {
        /// Sequential (autoincrement) access for READ and WRITE.
        const SEQUENTIAL       = 0b0100_0000;
    }

    /// Video display control 1.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct VideoControl1: u16 {
        const PLL_ENABLE       = 1 << 12;
        const SELECT_PLL_CLOCK = 1 << 13;
    }

    /// Video display control 2.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct VideoControl2: u16 {
        /// PAL colour subcarrier handling.
        const PAL              = 1 << 14;
        /// Start the video generator.
        const ENABLE_VIDEO     = 1 << 15;
    }

    /// Flags byte of BLOCKMVC1.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct BlockMoveControl: u8 {
        /// Addresses decrement instead of increment.
        const BACKWARDS        = 0b0000_0001;
        /// Destination starts on the low byte of its word.
        const DST_ODD          = 0b0000_0010;
        /// Source starts on the low byte of its word.
        const SRC_ODD          = 0b0000_0100;
        const DAC_CONTROL      = 0b0000_1000;
        /// Filter the luma output; shares this register with the mover.
        const LUMA_FILTER      = 0b0001_0000;
    }

    /// CURLINE status word.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct LineStatus: u16 {
        /// A block move is still running.
        const MOVE_BUSY        = 1 << 14;
    }
}

impl VideoControl2 {
    /// Flags plus the frame length and pixel width fields.
    pub fn with_timing(self, total_lines: u16, pllclks_per_pixel: u16) -> u16 {
        let mut bits = self.bits();
        bits.set_bits(0..10, total_lines - 1);
        bits.set_bits(10..14, pllclks_per_pixel - 1);
        bits
    }
}

impl BlockMoveControl {
    /// Odd-address flags for a source and destination byte address.
    pub fn for_addresses(src: u32, dst: u32) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::SRC_ODD, src.get_bit(0));
        flags.set(Self::DST_ODD, dst.get_bit(0));
        flags
    }
}
