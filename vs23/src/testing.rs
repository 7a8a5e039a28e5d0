//! Test links: the chip model and a link that fails on demand.

use core::convert::Infallible;

use vs23_emu::Chip;

use crate::{console::Console, geometry::Geometry, transport::Transport};

#[derive(Default)]
pub struct Emu {
    pub chip: Chip,
}

impl Transport for Emu {
    type Error = Infallible;

    fn exchange_byte(&mut self, out: u8) -> Result<u8, Infallible> {
        Ok(self.chip.exchange(out))
    }

    fn select(&mut self, active: bool) -> Result<(), Infallible> {
        self.chip.set_select(active);
        Ok(())
    }
}

/// Initialised PAL console on a fresh chip.
pub fn console() -> Console<Emu> {
    console_with_fill(0)
}

pub fn console_with_fill(fill: u8) -> Console<Emu> {
    let mut console = Console::new(Emu { chip: Chip::with_fill(fill) }, Geometry::PAL);
    console.init().unwrap();
    console
}

/// Fails every exchange after the first `budget`.
pub struct Flaky {
    budget: u32,
    pub exchanged: u32,
    pub selected: bool,
}

impl Flaky {
    pub fn new(budget: u32) -> Self {
        Self { budget, exchanged: 0, selected: false }
    }
}

impl Transport for Flaky {
    type Error = &'static str;

    fn exchange_byte(&mut self, out: u8) -> Result<u8, Self::Error> {
        if self.exchanged == self.budget {
            return Err("link down");
        }
        self.exchanged += 1;
        Ok(out)
    }

    fn select(&mut self, active: bool) -> Result<(), Self::Error> {
        self.selected = active;
        Ok(())
    }
}
