//! # Command framing
//!
//! Everything the driver does reaches the chip as a short SPI transaction:
//! chip select goes low, an opcode byte is clocked out, then an optional
//! 24-bit address and data, and chip select goes high again.
//!
//! The host only supplies the two primitives of [`Transport`]. [`Bus`] builds
//! the chip's command set on top of them, and [`Frame`] keeps each command
//! inside a single select span, releasing chip select when dropped even if a
//! byte exchange fails halfway.
//!
//! | Command           | Bytes on the wire                                  |
//! |-------------------|----------------------------------------------------|
//! | `write_byte`      | `02` `A23..16` `A15..8` `A7..0` `data`             |
//! | `write_word`      | `02` + byte address (word address × 2) + `hi` `lo` |
//! | `read_byte`       | `03` + address + one dummy byte                    |
//! | `reg_byte`        | `op` `data`                                        |
//! | `reg_word`        | `op` `hi` `lo`                                     |
//! | `write_program`   | `30` + four microcode bytes, most significant first|

pub mod hal;
pub mod mmio;

use core::fmt::Debug;

use crate::error::Error;
use crate::regs::{PROGRAM, READ, WRITE};

/// Byte-level link to the chip, provided by the host.
///
/// The link must shift most significant bit first, with the clock idling low
/// and data sampled on the rising edge (SPI mode 0).
pub trait Transport {
    type Error: Debug;

    /// Clock one byte out and return the byte clocked in at the same time.
    fn exchange_byte(&mut self, out: u8) -> Result<u8, Self::Error>;

    /// Drive chip select; `true` asserts it.
    fn select(&mut self, active: bool) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    #[inline(always)]
    fn exchange_byte(&mut self, out: u8) -> Result<u8, Self::Error> {
        (**self).exchange_byte(out)
    }

    #[inline(always)]
    fn select(&mut self, active: bool) -> Result<(), Self::Error> {
        (**self).select(active)
    }
}

/// One chip-select span.
///
/// Chip select is released by [`Frame::close`], or by `Drop` when a frame is
/// abandoned through an early return.
pub struct Frame<'a, T: Transport> {
    transport: &'a mut T,
    open: bool,
}

impl<'a, T: Transport> Frame<'a, T> {
    pub fn open(transport: &'a mut T) -> Result<Self, Error<T::Error>> {
        transport.select(true).map_err(Error::Transport)?;
        Ok(Self { transport, open: true })
    }

    #[inline(always)]
    pub fn byte(&mut self, out: u8) -> Result<u8, Error<T::Error>> {
        self.transport.exchange_byte(out).map_err(Error::Transport)
    }

    /// Two byte exchanges, most significant first.
    #[inline(always)]
    pub fn word(&mut self, out: u16) -> Result<u16, Error<T::Error>> {
        let hi = self.byte((out >> 8) as u8)?;
        let lo = self.byte(out as u8)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// 24-bit memory address.
    #[inline(always)]
    pub fn address(&mut self, address: u32) -> Result<(), Error<T::Error>> {
        self.byte((address >> 16) as u8)?;
        self.word(address as u16)?;
        Ok(())
    }

    pub fn close(mut self) -> Result<(), Error<T::Error>> {
        self.open = false;
        self.transport.select(false).map_err(Error::Transport)
    }
}

impl<'a, T: Transport> Drop for Frame<'a, T> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.transport.select(false);
        }
    }
}

/// The chip's command set over a [`Transport`].
pub struct Bus<T: Transport> {
    transport: T,
}

impl<T: Transport> Bus<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn release(self) -> T {
        self.transport
    }

    #[inline(always)]
    pub fn frame(&mut self) -> Result<Frame<'_, T>, Error<T::Error>> {
        Frame::open(&mut self.transport)
    }

    /// Load the four pattern generator ops.
    pub fn write_program(&mut self, program: u32) -> Result<(), Error<T::Error>> {
        let mut f = self.frame()?;
        f.byte(PROGRAM)?;
        f.word((program >> 16) as u16)?;
        f.word(program as u16)?;
        f.close()
    }

    pub fn write_word(&mut self, word_address: u32, data: u16) -> Result<u16, Error<T::Error>> {
        let mut f = self.frame()?;
        f.byte(WRITE)?;
        f.address(word_address << 1)?;
        let previous = f.word(data)?;
        f.close()?;
        Ok(previous)
    }

    pub fn write_byte(&mut self, address: u32, data: u8) -> Result<u8, Error<T::Error>> {
        let mut f = self.frame()?;
        f.byte(WRITE)?;
        f.address(address)?;
        let previous = f.byte(data)?;
        f.close()?;
        Ok(previous)
    }

    pub fn read_byte(&mut self, address: u32) -> Result<u8, Error<T::Error>> {
        let mut f = self.frame()?;
        f.byte(READ)?;
        f.address(address)?;
        let data = f.byte(0)?;
        f.close()?;
        Ok(data)
    }

    /// Sequential read; relies on the chip being in autoincrement mode.
    pub fn read_bytes(&mut self, address: u32, buf: &mut [u8]) -> Result<(), Error<T::Error>> {
        let mut f = self.frame()?;
        f.byte(READ)?;
        f.address(address)?;
        for b in buf.iter_mut() {
            *b = f.byte(0)?;
        }
        f.close()
    }

    /// Sequential write; relies on the chip being in autoincrement mode.
    pub fn write_bytes(&mut self, address: u32, data: &[u8]) -> Result<(), Error<T::Error>> {
        let mut f = self.frame()?;
        f.byte(WRITE)?;
        f.address(address)?;
        for b in data {
            f.byte(*b)?;
        }
        f.close()
    }

    /// `count` copies of one byte from `address` on.
    pub fn fill_bytes(&mut self, address: u32, count: u32, value: u8) -> Result<(), Error<T::Error>> {
        let mut f = self.frame()?;
        f.byte(WRITE)?;
        f.address(address)?;
        for _ in 0..count {
            f.byte(value)?;
        }
        f.close()
    }

    /// `count` copies of one word from `word_address` on.
    pub fn fill_words(&mut self, word_address: u32, count: u32, value: u16) -> Result<(), Error<T::Error>> {
        let mut f = self.frame()?;
        f.byte(WRITE)?;
        f.address(word_address << 1)?;
        for _ in 0..count {
            f.word(value)?;
        }
        f.close()
    }

    pub fn reg_byte(&mut self, op: u8, data: u8) -> Result<u8, Error<T::Error>> {
        let mut f = self.frame()?;
        f.byte(op)?;
        let back = f.byte(data)?;
        f.close()?;
        Ok(back)
    }

    pub fn reg_word(&mut self, op: u8, data: u16) -> Result<u16, Error<T::Error>> {
        let mut f = self.frame()?;
        f.byte(op)?;
        let back = f.word(data)?;
        f.close()?;
        Ok(back)
    }
}
