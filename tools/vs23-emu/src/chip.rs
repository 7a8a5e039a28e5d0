use alloc::vec;
use alloc::vec::Vec;
use log::{debug, warn};

use crate::block_mover::BlockMover;
use crate::registers::*;

/// 64K 16-bit words.
pub const SRAM_BYTES: usize = 0x20000;
const ADDRESS_MASK: u32 = SRAM_BYTES as u32 - 1;

/// Everything clocked in during one chip-select span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

impl Transaction {
    /// 24-bit address of a WRITE/READ transaction.
    pub fn address(&self) -> Option<u32> {
        match (self.opcode, self.payload.as_slice()) {
            (WRITE | READ, [a, b, c, ..]) => Some(u32::from_be_bytes([0, *a, *b, *c])),
            _ => None,
        }
    }

    /// Data bytes following the address of a WRITE/READ transaction.
    pub fn data(&self) -> &[u8] {
        match self.opcode {
            WRITE | READ => self.payload.get(3..).unwrap_or(&[]),
            _ => &self.payload,
        }
    }
}

pub struct Chip {
    sram: Vec<u8>,
    pub registers: VideoRegisters,
    pub block_mover: BlockMover,

    selected: bool,
    opcode: Option<u8>,
    address: u32,
    address_bytes: u8,
    status_latch: u16,
    payload: Vec<u8>,

    /// Keep a copy of every transaction in `transactions()`.
    pub record: bool,
    log: Vec<Transaction>,
    /// Bytes clocked while chip select was high.
    pub stray_bytes: u32,
    /// READ or WRITE commands addressed while a block move was in flight.
    pub access_during_move: u32,
}

impl Default for Chip {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip {
    pub fn new() -> Self {
        Self::with_fill(0)
    }

    /// SRAM powers up with arbitrary content; `fill` stands in for it.
    pub fn with_fill(fill: u8) -> Self {
        Self {
            sram: vec![fill; SRAM_BYTES],
            registers: VideoRegisters::default(),
            block_mover: BlockMover::default(),
            selected: false,
            opcode: None,
            address: 0,
            address_bytes: 0,
            status_latch: 0,
            payload: Vec::new(),
            record: true,
            log: Vec::new(),
            stray_bytes: 0,
            access_during_move: 0,
        }
    }

    #[inline(always)]
    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn set_select(&mut self, active: bool) {
        if active {
            if self.selected {
                warn!("chip select asserted twice, previous transaction dropped");
            }
            self.selected = true;
            self.opcode = None;
            self.address = 0;
            self.address_bytes = 0;
            self.payload.clear();
        } else if self.selected {
            self.selected = false;
            self.commit();
        }
    }

    /// Clock one byte in both directions.
    pub fn exchange(&mut self, out: u8) -> u8 {
        if !self.selected {
            warn!("byte {:02X} clocked while deselected", out);
            self.stray_bytes += 1;
            return 0xff;
        }

        let Some(opcode) = self.opcode else {
            self.opcode = Some(out);
            return 0;
        };
        self.payload.push(out);

        match opcode {
            WRITE | READ if self.address_bytes < 3 => {
                self.address = (self.address << 8) | out as u32;
                self.address_bytes += 1;
                if self.address_bytes == 3 && self.block_mover.busy() {
                    warn!("SRAM access at {:05X} while a block move is running", self.address);
                    self.access_during_move += 1;
                }
                0
            }
            WRITE => {
                let at = (self.address & ADDRESS_MASK) as usize;
                let previous = self.sram[at];
                self.sram[at] = out;
                self.address = self.address.wrapping_add(1);
                previous
            }
            READ => {
                let at = (self.address & ADDRESS_MASK) as usize;
                self.address = self.address.wrapping_add(1);
                self.sram[at]
            }
            CURLINE => {
                if self.payload.len() == 1 {
                    self.status_latch = if self.block_mover.busy() { CURLINE_MVBS } else { 0 };
                    (self.status_latch >> 8) as u8
                } else {
                    self.status_latch as u8
                }
            }
            READ_STATUS => self.registers.status,
            READ_MULTIIC => self.registers.multi_ic,
            _ => 0,
        }
    }

    fn commit(&mut self) {
        let Some(opcode) = self.opcode else {
            return
        };

        match opcode {
            WRITE | READ | READ_STATUS | READ_MULTIIC | READ_ID => {}
            BLOCKMVC1 => self.block_mover.load_control1(&self.payload),
            BLOCKMVC2 => self.block_mover.load_control2(&self.payload),
            BLOCKMVST => self.block_mover.start(&mut self.sram),
            CURLINE => self.block_mover.poll(&mut self.sram),
            _ => {
                if !self.registers.write(opcode, &self.payload) {
                    warn!("unknown opcode {:02X} with {} bytes", opcode, self.payload.len());
                }
            }
        }

        if opcode == WRITE && self.payload.len() > 0x10000 {
            debug!("bulk write of {} bytes", self.payload.len());
        }

        if self.record {
            self.log.push(Transaction { opcode, payload: self.payload.clone() });
        }
    }

    pub fn sram(&self) -> &[u8] {
        &self.sram
    }

    pub fn sram_mut(&mut self) -> &mut [u8] {
        &mut self.sram
    }

    #[inline(always)]
    pub fn peek(&self, address: u32) -> u8 {
        self.sram[(address & ADDRESS_MASK) as usize]
    }

    /// Word at a word address, stored most significant byte first.
    #[inline(always)]
    pub fn peek_word(&self, word_address: u32) -> u16 {
        let at = word_address << 1;
        u16::from_be_bytes([self.peek(at), self.peek(at + 1)])
    }

    /// Decode the index entry of a physical scan line through INDEXSTART.
    pub fn index_entry(&self, line: u16) -> IndexEntry {
        let at = self.registers.index_start_bytes() + line as u32 * 3;
        IndexEntry::from_bytes([self.peek(at), self.peek(at + 1), self.peek(at + 2)])
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    pub fn clear_transactions(&mut self) {
        self.log.clear();
    }

    /// Transactions that changed SRAM or started a block move.
    pub fn memory_writes(&self) -> usize {
        self.log.iter().filter(|t| t.opcode == WRITE || t.opcode == BLOCKMVST).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(chip: &mut Chip, bytes: &[u8]) -> Vec<u8> {
        chip.set_select(true);
        let back = bytes.iter().map(|b| chip.exchange(*b)).collect();
        chip.set_select(false);
        back
    }

    #[test]
    fn write_then_read_autoincrements() {
        let mut chip = Chip::new();
        send(&mut chip, &[WRITE, 0x01, 0x00, 0x10, 0xAA, 0xBB, 0xCC]);
        assert_eq!(chip.peek(0x10010), 0xAA);
        assert_eq!(chip.peek(0x10012), 0xCC);

        let back = send(&mut chip, &[READ, 0x01, 0x00, 0x11, 0, 0]);
        assert_eq!(&back[4..], &[0xBB, 0xCC]);

        let tx = &chip.transactions()[0];
        assert_eq!(tx.address(), Some(0x10010));
        assert_eq!(tx.data(), &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn words_are_big_endian() {
        let mut chip = Chip::new();
        // word address 0x11C shifted to byte address 0x238
        send(&mut chip, &[WRITE, 0x00, 0x02, 0x38, 0x2E, 0x5B]);
        assert_eq!(chip.peek_word(0x11C), 0x2E5B);
    }

    #[test]
    fn register_writes_latch_on_deselect() {
        let mut chip = Chip::new();
        send(&mut chip, &[LINELEN, 0x08, 0xD4]);
        send(&mut chip, &[PROGRAM, 0xC0, 0x9C, 0x4A, 0x0A]);
        assert_eq!(chip.registers.line_len, 2260);
        assert_eq!(chip.registers.microcode, 0xC09C4A0A);
    }

    #[test]
    fn curline_reports_block_move_busy() {
        let mut chip = Chip::new();
        chip.block_mover.latency = 1;
        send(&mut chip, &[BLOCKMVC1, 0, 0, 0, 8, 0]);
        send(&mut chip, &[BLOCKMVC2, 0, 0, 4, 0]);
        send(&mut chip, &[BLOCKMVST]);

        let busy = send(&mut chip, &[CURLINE, 0, 0]);
        assert_eq!(busy[1], (CURLINE_MVBS >> 8) as u8);
        let idle = send(&mut chip, &[CURLINE, 0, 0]);
        assert_eq!(idle[1], 0);
    }

    #[test]
    fn memory_access_during_a_move_is_counted() {
        let mut chip = Chip::new();
        chip.block_mover.latency = 1;
        send(&mut chip, &[WRITE, 0x00, 0x00, 0x00, 7, 7, 7, 7]);
        send(&mut chip, &[BLOCKMVC1, 0, 0, 0, 8, 0]);
        send(&mut chip, &[BLOCKMVC2, 0, 0, 4, 0]);
        send(&mut chip, &[BLOCKMVST]);

        let early = send(&mut chip, &[READ, 0x00, 0x00, 0x10, 0]);
        assert_eq!(early[4], 0);
        assert_eq!(chip.access_during_move, 1);

        send(&mut chip, &[CURLINE, 0, 0]);
        let late = send(&mut chip, &[READ, 0x00, 0x00, 0x10, 0]);
        assert_eq!(late[4], 7);
        assert_eq!(chip.access_during_move, 1);
    }

    #[test]
    fn bytes_outside_select_are_counted() {
        let mut chip = Chip::new();
        assert_eq!(chip.exchange(0x12), 0xff);
        assert_eq!(chip.stray_bytes, 1);
        assert!(chip.transactions().is_empty());
    }
}
