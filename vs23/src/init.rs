use log::{debug, info};

use crate::{
    console::Console,
    error::Error,
    layout::LineTarget,
    regs::{
        BLOCKMVC1, BlockMoveControl, INDEXSTART, LINELEN, MULTI_IC_CHIP0_ONLY, PICEND, PICSTART, Status,
        VDCTRL1, VDCTRL2, VideoControl1, WRITE, WRITE_MULTIIC, WRITE_STATUS,
    },
    transport::Transport,
};

/// Words written by the power-up clear; the three extra words cover the
/// address wrap.
const CLEAR_WORDS: u32 = 65536 + 3;

impl<T: Transport> Console<T> {
    /// Program the chip from scratch and start video output.
    ///
    /// Clears all of SRAM, so a glyph cache built earlier is dropped and
    /// [`Console::set_font`] must be called again to use it.
    pub fn init(&mut self) -> Result<(), Error<T::Error>> {
        let g = self.geometry;
        debug!(
            "video init: {:?} {}x{}, {} lines, stride {}",
            g.standard, g.width, g.height, g.total_lines, g.line_stride,
        );

        self.bus.reg_byte(WRITE_MULTIIC, MULTI_IC_CHIP0_ONLY)?;
        self.bus.reg_byte(WRITE_STATUS, Status::SEQUENTIAL.bits())?;

        self.bus.reg_word(PICSTART, g.start_pix - 1)?;
        self.bus.reg_word(PICEND, g.end_pix - 1)?;
        self.bus.reg_word(VDCTRL1, (VideoControl1::PLL_ENABLE | VideoControl1::SELECT_PLL_CLOCK).bits())?;

        self.settle()?;
        self.clear_memory()?;
        self.glyph_cache = None;

        self.bus.reg_word(LINELEN, g.pllclks_per_line)?;
        self.bus.write_program(g.microcode.bits())?;

        self.bus.reg_word(INDEXSTART, g.index_start_longwords)?;
        for line in 0..g.total_lines {
            self.write_index_entry(line, LineTarget::Protoline(0))?;
        }

        self.build_picture_protoline()?;
        self.build_vsync_protolines()?;

        for (line, proto) in g.vsync_frame() {
            self.write_index_entry(line, LineTarget::Protoline(proto))?;
        }
        for row in 0..g.height {
            self.write_index_entry(g.first_picture_line + row, LineTarget::Picture(row))?;
        }

        let mut f = self.bus.frame()?;
        f.byte(BLOCKMVC1)?;
        f.word(0)?;
        f.word(0)?;
        f.byte(BlockMoveControl::LUMA_FILTER.bits())?;
        f.close()?;

        self.bus.reg_word(VDCTRL2, g.video_control2())?;

        info!("video output enabled, picture at {:05X}", g.picture_start);
        Ok(())
    }

    /// Switch the colour burst of picture lines on or off.
    pub fn enable_color(&mut self, enable: bool) -> Result<(), Error<T::Error>> {
        let g = self.geometry;
        let level = if enable { g.levels.burst } else { g.levels.blank };
        self.fill_protoline(0, g.burst, g.burst_duration, level)
    }

    fn clear_memory(&mut self) -> Result<(), Error<T::Error>> {
        let mut f = self.bus.frame()?;
        f.byte(WRITE)?;
        for _ in 0..CLEAR_WORDS {
            f.word(0)?;
        }
        f.close()
    }

    /// Protoline 0: blank, horizontal sync and colour burst.
    fn build_picture_protoline(&mut self) -> Result<(), Error<T::Error>> {
        let g = self.geometry;
        self.fill_protoline(0, 0, g.protoline_last, g.levels.blank)?;
        self.fill_protoline(0, 0, g.sync, g.levels.sync)?;
        if g.black_before_picture {
            self.fill_protoline(0, g.blank_end, g.start_pix - g.blank_end, g.levels.black)?;
        }
        self.enable_color(true)
    }

    /// Protolines 1.. carry the vertical sync pulse pairs.
    fn build_vsync_protolines(&mut self) -> Result<(), Error<T::Error>> {
        let g = self.geometry;
        for (i, shape) in g.vsync_shapes().iter().enumerate() {
            let n = i as u16 + 1;
            self.fill_protoline(n, 0, g.pulse_length(shape.first, false), g.levels.sync)?;
            self.fill_protoline(n, g.protoline_half, g.pulse_length(shape.second, true), g.levels.sync)?;
        }
        Ok(())
    }
}
