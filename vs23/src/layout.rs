//! Scan-line index and protoline memory.
//!
//! Every physical scan line has a 3-byte index entry. Read as a 24-bit
//! little-endian value it holds a protoline selector in bits 0-3 and the byte
//! address the line starts from in bits 7-23. Lines without picture point at
//! a protoline; picture lines point at their row in picture memory and take
//! sync, burst and blanking from protoline 0.

use bitfield::bitfield;

use crate::{console::Console, error::Error, geometry::Geometry, transport::Transport};

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct IndexEntry(u32);
    impl Debug;
    pub u8, protoline, set_protoline: 3, 0;
    pub u32, byte_address, set_byte_address: 23, 7;
}

impl IndexEntry {
    pub fn new(byte_address: u32, protoline: u8) -> Self {
        let mut entry = IndexEntry(0);
        entry.set_byte_address(byte_address);
        entry.set_protoline(protoline);
        entry
    }

    #[inline(always)]
    pub fn to_bytes(self) -> [u8; 3] {
        let [a, b, c, _] = self.0.to_le_bytes();
        [a, b, c]
    }

    #[inline(always)]
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        IndexEntry(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }
}

/// What a scan line shows.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineTarget {
    Protoline(u16),
    /// Picture row, with protoline 0 timing.
    Picture(u16),
}

impl Geometry {
    pub fn index_entry(&self, target: LineTarget) -> IndexEntry {
        match target {
            LineTarget::Protoline(n) => IndexEntry::new(self.protoline_address(n) << 1, 0),
            LineTarget::Picture(row) => IndexEntry::new(self.picture_line_address(row), 0),
        }
    }
}

impl<T: Transport> Console<T> {
    /// Point physical scan line `line` at a protoline or a picture row.
    pub fn write_index_entry(&mut self, line: u16, target: LineTarget) -> Result<(), Error<T::Error>> {
        let address = self.geometry.index_entry_address(line);
        let bytes = self.geometry.index_entry(target).to_bytes();
        self.settle()?;
        self.bus.write_bytes(address, &bytes)
    }

    /// Fill words `offset..=offset + limit` of protoline `n` with `value`.
    pub fn fill_protoline(&mut self, n: u16, offset: u16, limit: u16, value: u16) -> Result<(), Error<T::Error>> {
        let start = self.geometry.protoline_address(n) + offset as u32;
        self.settle()?;
        self.bus.fill_words(start, limit as u32 + 1, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn picture_entry_bytes() {
        let g = Geometry::PAL;
        let a = g.picture_line_address(0);
        let bytes = g.index_entry(LineTarget::Picture(0)).to_bytes();
        assert_eq!(bytes, [((a << 7) & 0x80) as u8, (a >> 1) as u8, (a >> 9) as u8]);
    }

    #[test]
    fn protoline_entry_bytes() {
        let g = Geometry::PAL;
        let word = g.protoline_address(2);
        let bytes = g.index_entry(LineTarget::Protoline(2)).to_bytes();
        assert_eq!(bytes, [0, word as u8, (word >> 8) as u8]);
    }

    #[test]
    fn entries_round_trip_through_chip() {
        let mut console = testing::console();
        console.write_index_entry(100, LineTarget::Picture(17)).unwrap();

        let entry = console.transport().chip.index_entry(100);
        assert_eq!(entry.byte_address(), Geometry::PAL.picture_line_address(17));
        assert_eq!(entry.protoline(), 0);
    }

    #[test]
    fn protoline_fill_is_inclusive() {
        let mut console = testing::console();
        console.fill_protoline(1, 200, 3, 0xABCD).unwrap();

        let chip = &console.transport().chip;
        let base = Geometry::PAL.protoline_address(1) + 200;
        for w in 0..4 {
            assert_eq!(chip.peek_word(base + w), 0xABCD);
        }
        assert_ne!(chip.peek_word(base + 4), 0xABCD);
    }
}
