//! [`Transport`] over `embedded-hal` 1.0 traits.
//!
//! The SPI bus is owned exclusively; chip select is a plain output pin driven
//! by the driver because one chip-select span covers a whole command, which
//! `SpiDevice` transactions cannot express byte by byte.

use core::fmt;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use super::Transport;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HalError<S, P> {
    Spi(S),
    Pin(P),
}

impl<S: fmt::Debug, P: fmt::Debug> fmt::Display for HalError<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalError::Spi(e) => write!(f, "SPI error: {:?}", e),
            HalError::Pin(e) => write!(f, "chip select error: {:?}", e),
        }
    }
}

/// SPI bus plus an active-low chip select pin.
pub struct HalTransport<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> HalTransport<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Takes the bus and pin and parks chip select high.
    pub fn new(spi: SPI, mut cs: CS) -> Result<Self, HalError<SPI::Error, CS::Error>> {
        cs.set_high().map_err(HalError::Pin)?;
        Ok(Self { spi, cs })
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> Transport for HalTransport<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    type Error = HalError<SPI::Error, CS::Error>;

    #[inline(always)]
    fn exchange_byte(&mut self, out: u8) -> Result<u8, Self::Error> {
        let mut buf = [out];
        self.spi.transfer_in_place(&mut buf).map_err(HalError::Spi)?;
        Ok(buf[0])
    }

    fn select(&mut self, active: bool) -> Result<(), Self::Error> {
        if active {
            self.cs.set_low().map_err(HalError::Pin)
        } else {
            // the last byte must be on the wire before chip select rises
            self.spi.flush().map_err(HalError::Spi)?;
            self.cs.set_high().map_err(HalError::Pin)
        }
    }
}
