//! # Block mover
//!
//! The chip can copy rectangles inside its own SRAM while the host keeps
//! talking to it. A move is described by two control registers and started
//! by a third:
//!
//! ```text
//! BLOCKMVC1  source word, destination word, flags
//! BLOCKMVC2  row skip, width, height - 1
//! BLOCKMVST  start
//! ```
//!
//! A new move may only start once the previous one is done, so the driver
//! loads the next move's registers first and polls the busy bit in CURLINE
//! just before the start command. Transfers keep running in the background
//! after [`Console::block_move`] returns; any direct SRAM read or write the
//! driver makes afterwards waits for the move to finish first.
//!
//! ## Hardware limits
//!
//! * Moves narrower than [`MIN_BLOCK_MOVE_WIDTH`] bytes are unreliable and
//!   are done through the transport instead.
//! * Source and destination must not differ by exactly one byte.
//! * Overlapping forward moves need the source after the destination.
//!
//! ```ignore
//! // copy a 16×8 block of the picture 40 pixels to the right
//! let src = console.geometry().picture_line_address(10) + 20;
//! console.copy_rect(src, src + 40, 16, 8)?;
//! ```

use log::{trace, warn};

use crate::{
    console::Console,
    error::Error,
    regs::{BLOCKMVC1, BLOCKMVC2, BLOCKMVST, BlockMoveControl, LineStatus},
    transport::Transport,
};

pub const MIN_BLOCK_MOVE_WIDTH: u8 = 4;
/// Widest row the driver hands to the block mover in one move.
pub const MAX_BLOCK_MOVE_WIDTH: u16 = 250;
pub const DEFAULT_MAX_POLLS: u32 = 10_000;

/// How long to wait for the previous move before starting the next.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Poll once and fail if the mover is busy.
    FailFast,
    /// Poll up to this many times.
    Bounded(u32),
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::Bounded(DEFAULT_MAX_POLLS)
    }
}

impl WaitPolicy {
    #[inline(always)]
    fn polls(self) -> u32 {
        match self {
            WaitPolicy::FailFast => 1,
            WaitPolicy::Bounded(n) => n.max(1),
        }
    }
}

/// One rectangle copy, in picture bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockMove {
    pub src: u32,
    pub dst: u32,
    pub width: u8,
    pub height: u8,
    /// Addresses count down from `src` and `dst`.
    pub backwards: bool,
}

impl<T: Transport> Console<T> {
    /// True while a started block move has not finished.
    pub fn block_move_active(&mut self) -> Result<bool, Error<T::Error>> {
        Ok(self.line_status()?.contains(LineStatus::MOVE_BUSY))
    }

    /// Wait for the block mover according to the console's [`WaitPolicy`].
    pub fn wait_block_move(&mut self) -> Result<(), Error<T::Error>> {
        let polls = self.wait.polls();
        for _ in 0..polls {
            if !self.block_move_active()? {
                self.move_pending = false;
                return Ok(());
            }
        }
        warn!("block mover still busy after {} polls", polls);
        Err(Error::BlockMoveTimeout { polls })
    }

    /// Wait for a move started by this console, if one may still be running.
    /// Called before every direct SRAM access.
    #[inline(always)]
    pub(crate) fn settle(&mut self) -> Result<(), Error<T::Error>> {
        if self.move_pending {
            self.wait_block_move()?;
        }
        Ok(())
    }

    /// Hand one move to the hardware.
    ///
    /// Rows are `linesize()` bytes apart at both ends. The caller keeps the
    /// move within the hardware limits listed in the module docs.
    pub fn block_move(&mut self, mv: BlockMove) -> Result<(), Error<T::Error>> {
        if mv.width == 0 || mv.height == 0 {
            return Ok(());
        }
        debug_assert!(mv.width >= MIN_BLOCK_MOVE_WIDTH);
        debug_assert!(mv.src.abs_diff(mv.dst) != 1);

        let mut flags = BlockMoveControl::for_addresses(mv.src, mv.dst) | BlockMoveControl::LUMA_FILTER;
        flags.set(BlockMoveControl::BACKWARDS, mv.backwards);
        let skip = (self.geometry.line_stride as u16).wrapping_sub(mv.width as u16);

        trace!("block move {:05X} -> {:05X} {}x{}", mv.src, mv.dst, mv.width, mv.height);

        let mut f = self.bus.frame()?;
        f.byte(BLOCKMVC1)?;
        f.word((mv.src >> 1) as u16)?;
        f.word((mv.dst >> 1) as u16)?;
        f.byte(flags.bits())?;
        f.close()?;

        let mut f = self.bus.frame()?;
        f.byte(BLOCKMVC2)?;
        f.word(skip)?;
        f.byte(mv.width)?;
        f.byte(mv.height - 1)?;
        f.close()?;

        self.wait_block_move()?;

        let mut f = self.bus.frame()?;
        f.byte(BLOCKMVST)?;
        f.close()?;

        self.move_pending = true;
        self.stats.block_moves += 1;
        Ok(())
    }

    /// Copy a `width` × `height` rectangle forwards, through the block mover
    /// when it is wide enough and through the transport otherwise.
    pub fn copy_rect(&mut self, src: u32, dst: u32, width: u8, height: u8) -> Result<(), Error<T::Error>> {
        if width >= MIN_BLOCK_MOVE_WIDTH && src.abs_diff(dst) != 1 {
            return self.block_move(BlockMove { src, dst, width, height, backwards: false });
        }
        self.software_copy(src, dst, width, height)
    }

    fn software_copy(&mut self, src: u32, dst: u32, width: u8, height: u8) -> Result<(), Error<T::Error>> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        // reads must see the result of moves still in flight
        self.settle()?;

        let stride = self.geometry.line_stride;
        let mut row = [0u8; 256];
        let row = &mut row[..width as usize];
        for r in 0..height as u32 {
            self.bus.read_bytes(src + r * stride, row)?;
            self.bus.write_bytes(dst + r * stride, row)?;
        }
        self.stats.software_copies += 1;
        Ok(())
    }
}
