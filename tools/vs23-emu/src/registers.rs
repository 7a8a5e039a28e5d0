use bit_field::BitField;
use bitfield::bitfield;
use log::{debug, warn};

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
pub const VTABLE: u8        = 0x2e;
pub const UTABLE: u8        = 0x2f;
pub const BLOCKMVC1: u8     = 0x34;
pub const BLOCKMVC2: u8     = 0x35;
pub const BLOCKMVST: u8     = 0x36;
pub const CURLINE: u8       = 0x53;
pub const GPIOCTL: u8       = 0x82;

pub const CURLINE_MVBS: u16 = 1 << 14;

bitfield! {
    /// Third byte of BLOCKMVC1.
    #[derive(Copy, Clone, Default)]
    pub struct BlockMoveFlags(u8);
    impl Debug;
    pub backwards, _: 0;
    pub dst_odd, _: 1;
    pub src_odd, _: 2;
    pub dac_control, _: 3;
    pub luma_filter, _: 4;
}

bitfield! {
    /// One scan-line index entry, the three SRAM bytes read little-endian.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct IndexEntry(u32);
    impl Debug;
    pub u8, protoline, _: 3, 0;
    pub u32, byte_address, _: 23, 7;
}

impl BlockMoveFlags {
    #[inline(always)]
    pub fn from_byte(byte: u8) -> Self {
        BlockMoveFlags(byte)
    }
}

impl IndexEntry {
    #[inline(always)]
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        IndexEntry(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }
}

/// Register file written by the single-purpose video commands.
#[derive(Debug, Default, Copy, Clone)]
pub struct VideoRegisters {
    pub status: u8,
    pub multi_ic: u8,
    pub pic_start: u16,
    pub pic_end: u16,
    pub line_len: u16,
    pub vdctrl1: u16,
    pub index_start: u16,
    pub vdctrl2: u16,
    pub microcode: u32,
    pub gpio: u8,
}

impl VideoRegisters {
    /// Latch a register write. Returns false for opcodes this file does not own.
    pub fn write(&mut self, opcode: u8, payload: &[u8]) -> bool {
        let word = || match payload {
            [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
            [hi] => (*hi as u16) << 8,
            [] => 0,
        };

        match opcode {
            WRITE_STATUS => self.status = payload.first().copied().unwrap_or(0),
            WRITE_MULTIIC => self.multi_ic = payload.first().copied().unwrap_or(0),
            GPIOCTL => self.gpio = payload.first().copied().unwrap_or(0),
            PICSTART => self.pic_start = word(),
            PICEND => self.pic_end = word(),
            LINELEN => self.line_len = word(),
            VDCTRL1 => self.vdctrl1 = word(),
            INDEXSTART => self.index_start = word(),
            VDCTRL2 => {
                self.vdctrl2 = word();
                debug!("video control 2 = {:04X}, enabled {}", self.vdctrl2, self.video_enabled());
            }
            PROGRAM => {
                if payload.len() != 4 {
                    warn!("microcode program with {} bytes", payload.len());
                }
                let mut bytes = [0u8; 4];
                for (dst, src) in bytes.iter_mut().zip(payload) {
                    *dst = *src;
                }
                self.microcode = u32::from_be_bytes(bytes);
            }
            VTABLE | UTABLE => {}
            _ => return false,
        }
        true
    }

    #[inline(always)]
    pub fn index_start_bytes(&self) -> u32 {
        self.index_start as u32 * 4
    }

    #[inline(always)]
    pub fn video_enabled(&self) -> bool {
        self.vdctrl2.get_bit(15)
    }

    #[inline(always)]
    pub fn pal(&self) -> bool {
        self.vdctrl2.get_bit(14)
    }

    /// Number of scan lines per frame programmed into VDCTRL2.
    #[inline(always)]
    pub fn line_count(&self) -> u16 {
        self.vdctrl2.get_bits(0..10) + 1
    }

    /// PLL clocks per picture pixel programmed into VDCTRL2.
    #[inline(always)]
    pub fn program_length(&self) -> u16 {
        self.vdctrl2.get_bits(10..14) + 1
    }

    #[inline(always)]
    pub fn sequential_mode(&self) -> bool {
        self.status.get_bit(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_entry_unpacks_address_and_protoline() {
        // byte address 0x13A09 with protoline 0
        let entry = IndexEntry::from_bytes([0x80, 0x04, 0x9D]);
        assert_eq!(entry.byte_address(), 0x13A09);
        assert_eq!(entry.protoline(), 0);

        let entry = IndexEntry::from_bytes([0x03, 0x1C, 0x02]);
        assert_eq!(entry.byte_address(), 0x438);
        assert_eq!(entry.protoline(), 3);
    }

    #[test]
    fn vdctrl2_fields() {
        let mut regs = VideoRegisters::default();
        assert!(regs.write(VDCTRL2, &[0xD1, 0x38]));
        assert!(regs.video_enabled());
        assert!(regs.pal());
        assert_eq!(regs.line_count(), 313);
        assert_eq!(regs.program_length(), 5);
    }

    #[test]
    fn block_move_opcodes_are_not_registers() {
        let mut regs = VideoRegisters::default();
        assert!(!regs.write(BLOCKMVC1, &[0, 0, 0, 0, 0]));
        assert!(!regs.write(WRITE, &[]));
    }
}
