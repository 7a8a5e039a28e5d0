//! [`Transport`] for a memory-mapped SPI shift register.
//!
//! Many small MCUs expose SPI as three byte registers: control, status and
//! data. Writing the data register starts a shift; the status register's
//! transfer-complete bit rises when the received byte can be read back.
//!
//! ```ignore
//! let regs = unsafe { SpiRegisters::at(0x4c) };
//! let link = MmioSpi::new(regs, cs_pin)?;
//! let mut console = Console::new(link, Geometry::DEFAULT);
//! ```

use core::fmt;

use bit_field::BitField;
use embedded_hal::digital::OutputPin;
use volatile_register::{RO, RW};

use super::Transport;

/// Transfer complete flag in `status`.
pub const SPIF: usize = 7;
/// Controller enable and controller mode bits in `control`.
pub const CONTROL_ENABLE: u8 = 0b0101_0000;

/// Polls of the status register before a byte exchange is abandoned.
pub const DEFAULT_SPIF_POLLS: u32 = 1000;

#[repr(C)]
pub struct SpiRegisters {
    pub control: RW<u8>,
    pub status: RO<u8>,
    pub data: RW<u8>,
}

impl SpiRegisters {
    /// # Safety
    /// `address` must be the base of an SPI register block that nothing else
    /// accesses for the lifetime of the returned reference.
    #[inline(always)]
    pub unsafe fn at(address: usize) -> &'static mut SpiRegisters {
        unsafe { &mut *(address as *mut SpiRegisters) }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MmioError<P> {
    /// The transfer complete flag never rose.
    Timeout { polls: u32 },
    Pin(P),
}

impl<P: fmt::Debug> fmt::Display for MmioError<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MmioError::Timeout { polls } => write!(f, "SPI transfer not complete after {} polls", polls),
            MmioError::Pin(e) => write!(f, "chip select error: {:?}", e),
        }
    }
}

pub struct MmioSpi<'a, CS> {
    regs: &'a mut SpiRegisters,
    cs: CS,
    max_polls: u32,
}

impl<'a, CS: OutputPin> MmioSpi<'a, CS> {
    /// Enables the controller and parks chip select high.
    pub fn new(regs: &'a mut SpiRegisters, mut cs: CS) -> Result<Self, MmioError<CS::Error>> {
        cs.set_high().map_err(MmioError::Pin)?;
        unsafe { regs.control.write(CONTROL_ENABLE) };
        Ok(Self { regs, cs, max_polls: DEFAULT_SPIF_POLLS })
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls.max(1);
        self
    }

    pub fn release(self) -> (&'a mut SpiRegisters, CS) {
        (self.regs, self.cs)
    }
}

impl<'a, CS: OutputPin> Transport for MmioSpi<'a, CS> {
    type Error = MmioError<CS::Error>;

    fn exchange_byte(&mut self, out: u8) -> Result<u8, Self::Error> {
        unsafe { self.regs.data.write(out) };
        for _ in 0..self.max_polls {
            if self.regs.status.read().get_bit(SPIF) {
                return Ok(self.regs.data.read());
            }
        }
        Err(MmioError::Timeout { polls: self.max_polls })
    }

    fn select(&mut self, active: bool) -> Result<(), Self::Error> {
        if active {
            self.cs.set_low().map_err(MmioError::Pin)
        } else {
            self.cs.set_high().map_err(MmioError::Pin)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    struct Pin(bool);

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0 = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0 = true;
            Ok(())
        }
    }

    // control, status, data
    fn block(status: u8) -> [u8; 3] {
        [0, status, 0]
    }

    #[test]
    fn ready_flag_returns_data_register() {
        let mut ram = block(1 << SPIF);
        let regs = unsafe { &mut *(ram.as_mut_ptr() as *mut SpiRegisters) };
        let mut spi = MmioSpi::new(regs, Pin(false)).unwrap();

        spi.select(true).unwrap();
        // plain RAM behind the data register echoes the byte written
        assert_eq!(spi.exchange_byte(0x5A).unwrap(), 0x5A);
        spi.select(false).unwrap();

        let (_, cs) = spi.release();
        assert!(cs.0);
        assert_eq!(ram[0], CONTROL_ENABLE);
    }

    #[test]
    fn missing_ready_flag_times_out() {
        let mut ram = block(0);
        let regs = unsafe { &mut *(ram.as_mut_ptr() as *mut SpiRegisters) };
        let mut spi = MmioSpi::new(regs, Pin(true)).unwrap().with_max_polls(8);

        assert_eq!(spi.exchange_byte(0x01), Err(MmioError::Timeout { polls: 8 }));
    }
}
