//! Driver for the VLSI VS23S010 composite video SRAM.
//!
//! The chip holds a 128 KiB frame store and generates a PAL or NTSC signal
//! from it. The host talks to it over SPI: this crate programs the video
//! timing, lays out the frame in SRAM and draws into it, using the chip's
//! block mover for fills, text and scrolling.
//!
//! ```ignore
//! use vs23::{Console, Geometry, transport::hal::HalTransport};
//!
//! let link = HalTransport::new(spi, cs)?;
//! let mut console = Console::new(link, Geometry::DEFAULT);
//! console.init()?;
//! console.filled_rect(0, 0, 319, 239, 0)?;
//! ```
#![cfg_attr(not(test), no_std)]

pub mod blitter;
pub mod console;
pub mod draw;
pub mod error;
pub mod font;
pub mod geometry;
pub mod init;
pub mod layout;
pub mod regs;
pub mod text;
pub mod transport;

#[cfg(test)]
mod testing;

pub use blitter::WaitPolicy;
pub use console::{Console, DrawStats};
pub use error::{ConfigError, Error};
pub use font::{Font, Glyphs};
pub use geometry::{Geometry, Standard, VideoConfig};
pub use transport::Transport;
