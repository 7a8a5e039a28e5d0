use log::{debug, trace, warn};

use crate::registers::BlockMoveFlags;

/// Parameters latched by BLOCKMVST. Later register loads do not touch a move
/// already started.
#[derive(Debug, Copy, Clone)]
struct Transfer {
    src: u32,
    dst: u32,
    width: u8,
    rows: u32,
    skip: u32,
    backwards: bool,
}

impl Transfer {
    fn run(self, sram: &mut [u8]) {
        let mask = sram.len() as u32 - 1;
        let (mut s, mut d) = (self.src, self.dst);
        for _ in 0..self.rows {
            for _ in 0..self.width {
                sram[(d & mask) as usize] = sram[(s & mask) as usize];
                if self.backwards {
                    s = s.wrapping_sub(1);
                    d = d.wrapping_sub(1);
                } else {
                    s = s.wrapping_add(1);
                    d = d.wrapping_add(1);
                }
            }
            if self.backwards {
                s = s.wrapping_sub(self.skip);
                d = d.wrapping_sub(self.skip);
            } else {
                s = s.wrapping_add(self.skip);
                d = d.wrapping_add(self.skip);
            }
        }
        debug!("block move complete, copied {} bytes", self.width as u32 * self.rows);
    }
}

#[derive(Debug, Default)]
pub struct BlockMover {
    src_word: u16,
    dst_word: u16,
    flags: BlockMoveFlags,

    skip: u16,
    width: u8,
    height: u8,

    in_flight: Option<Transfer>,
    busy_polls: u32,
    /// Status polls that report busy after each start. The copy lands in
    /// SRAM when the last of them completes.
    pub latency: u32,
    /// Never finish: every poll reports busy and nothing is copied.
    pub stuck: bool,

    pub moves: u32,
    /// Moves started with parameters the silicon is known to mishandle.
    pub quirk_hits: u32,
    /// Starts issued while a previous move still reported busy.
    pub overruns: u32,
}

impl BlockMover {
    /// BLOCKMVC1: source word, destination word, flags.
    pub fn load_control1(&mut self, payload: &[u8]) {
        if payload.len() != 5 {
            warn!("BLOCKMVC1 with {} bytes", payload.len());
            return
        }
        self.src_word = u16::from_be_bytes([payload[0], payload[1]]);
        self.dst_word = u16::from_be_bytes([payload[2], payload[3]]);
        self.flags = BlockMoveFlags::from_byte(payload[4]);
    }

    /// BLOCKMVC2: row skip, width, height - 1.
    pub fn load_control2(&mut self, payload: &[u8]) {
        if payload.len() != 4 {
            warn!("BLOCKMVC2 with {} bytes", payload.len());
            return
        }
        self.skip = u16::from_be_bytes([payload[0], payload[1]]);
        self.width = payload[2];
        self.height = payload[3];
    }

    #[inline(always)]
    pub fn flags(&self) -> BlockMoveFlags {
        self.flags
    }

    #[inline(always)]
    pub fn busy(&self) -> bool {
        self.stuck || self.busy_polls > 0
    }

    /// One CURLINE read completed.
    pub fn poll(&mut self, sram: &mut [u8]) {
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
        }
        if !self.busy() {
            if let Some(transfer) = self.in_flight.take() {
                transfer.run(sram);
            }
        }
    }

    #[inline(always)]
    pub fn source(&self) -> u32 {
        ((self.src_word as u32) << 1) | self.flags.src_odd() as u32
    }

    #[inline(always)]
    pub fn destination(&self) -> u32 {
        ((self.dst_word as u32) << 1) | self.flags.dst_odd() as u32
    }

    /// BLOCKMVST: latch the registers and start the move. With no latency
    /// the copy is done before this returns.
    pub fn start(&mut self, sram: &mut [u8]) {
        if self.busy() {
            warn!("block move started while previous move is still running");
            self.overruns += 1;
        }
        // the chip runs one move at a time
        if let Some(previous) = self.in_flight.take() {
            previous.run(sram);
        }

        let transfer = Transfer {
            src: self.source(),
            dst: self.destination(),
            width: self.width,
            rows: self.height as u32 + 1,
            skip: self.skip as u32,
            backwards: self.flags.backwards(),
        };

        if transfer.width < 4 {
            warn!("block move {} bytes wide, hardware is unreliable below 4", transfer.width);
            self.quirk_hits += 1;
        }
        if transfer.src.abs_diff(transfer.dst) == 1 {
            warn!("block move source and destination differ by one pixel");
            self.quirk_hits += 1;
        }

        trace!("block move {:05X} -> {:05X}: {}x{} skip {} {}",
            transfer.src, transfer.dst, transfer.width, transfer.rows, transfer.skip,
            if transfer.backwards { "backwards" } else { "forwards" },
        );

        self.moves += 1;
        self.busy_polls = self.latency;
        if self.busy() {
            self.in_flight = Some(transfer);
        } else {
            transfer.run(sram);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn copies_rows_with_skip() {
        let mut sram = vec![0u8; 64];
        sram[0..4].copy_from_slice(&[1, 2, 3, 4]);
        sram[8..12].copy_from_slice(&[5, 6, 7, 8]);

        let mut mover = BlockMover::default();
        // src 0, dst 32, forwards
        mover.load_control1(&[0, 0, 0, 16, 0]);
        // skip 4, width 4, two rows
        mover.load_control2(&[0, 4, 4, 1]);
        mover.start(&mut sram);

        assert_eq!(&sram[32..36], &[1, 2, 3, 4]);
        assert_eq!(&sram[40..44], &[5, 6, 7, 8]);
        assert_eq!(mover.quirk_hits, 0);
    }

    #[test]
    fn odd_addresses_come_from_flags() {
        let mut sram = vec![0u8; 64];
        sram[3..8].copy_from_slice(&[9, 9, 9, 9, 9]);

        let mut mover = BlockMover::default();
        // src word 1 + odd, dst word 10 + odd
        mover.load_control1(&[0, 1, 0, 10, 0b110]);
        mover.load_control2(&[0, 0, 5, 0]);
        mover.start(&mut sram);

        assert_eq!(mover.source(), 3);
        assert_eq!(mover.destination(), 21);
        assert_eq!(&sram[21..26], &[9, 9, 9, 9, 9]);
    }

    #[test]
    fn narrow_moves_count_as_quirks() {
        let mut sram = vec![0u8; 64];
        let mut mover = BlockMover::default();
        mover.load_control1(&[0, 0, 0, 8, 0]);
        mover.load_control2(&[0, 0, 2, 0]);
        mover.start(&mut sram);
        assert_eq!(mover.quirk_hits, 1);
    }

    #[test]
    fn latency_delays_the_copy() {
        let mut sram = vec![0u8; 64];
        sram[0..4].copy_from_slice(&[1, 2, 3, 4]);
        let mut mover = BlockMover { latency: 2, ..Default::default() };
        mover.load_control1(&[0, 0, 0, 8, 0]);
        mover.load_control2(&[0, 0, 4, 0]);
        mover.start(&mut sram);

        // loading the next move does not disturb the running one
        mover.load_control1(&[0, 0, 0, 24, 0]);
        assert!(mover.busy());
        assert_eq!(&sram[16..20], &[0; 4]);

        mover.poll(&mut sram);
        assert!(mover.busy());
        mover.poll(&mut sram);
        assert!(!mover.busy());
        assert_eq!(&sram[16..20], &[1, 2, 3, 4]);
        assert_eq!(&sram[48..52], &[0; 4]);
    }

    #[test]
    fn start_while_busy_finishes_previous_first() {
        let mut sram = vec![0u8; 64];
        sram[0..4].copy_from_slice(&[1, 2, 3, 4]);
        let mut mover = BlockMover { latency: 5, ..Default::default() };
        mover.load_control1(&[0, 0, 0, 8, 0]);
        mover.load_control2(&[0, 0, 4, 0]);
        mover.start(&mut sram);

        // copy what the first move writes
        mover.load_control1(&[0, 8, 0, 16, 0]);
        mover.start(&mut sram);
        assert_eq!(mover.overruns, 1);
        assert_eq!(&sram[16..20], &[1, 2, 3, 4]);

        for _ in 0..5 {
            mover.poll(&mut sram);
        }
        assert_eq!(&sram[32..36], &[1, 2, 3, 4]);
    }

    #[test]
    fn stuck_mover_never_copies() {
        let mut sram = vec![0u8; 64];
        sram[0..4].copy_from_slice(&[1, 2, 3, 4]);
        let mut mover = BlockMover { stuck: true, ..Default::default() };
        mover.load_control1(&[0, 0, 0, 8, 0]);
        mover.load_control2(&[0, 0, 4, 0]);
        mover.start(&mut sram);
        for _ in 0..10 {
            mover.poll(&mut sram);
        }
        assert_eq!(&sram[16..20], &[0; 4]);
    }
}
