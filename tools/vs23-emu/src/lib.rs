//! Host-side model of the VS23S010 as seen from its SPI port.
//!
//! The model decodes the chip's command bytes, keeps the 128 KiB SRAM, the
//! video control registers and the block mover, and records every
//! chip-select span as a [`Transaction`](chip::Transaction). It does not
//! generate a video signal; it exists so drivers can be exercised and
//! inspected without hardware.
#![cfg_attr(not(test), no_std)]
#![allow(clippy::single_match)]
extern crate alloc;

pub mod block_mover;
pub mod chip;
pub mod registers;

pub use chip::{Chip, Transaction, SRAM_BYTES};
