use crate::{
    blitter::WaitPolicy,
    error::Error,
    font::{Font, PLACEHOLDER},
    geometry::Geometry,
    regs::{CURLINE, LineStatus},
    text::GlyphCache,
    transport::{Bus, Transport},
};

pub const DEFAULT_FG: u8 = 15;
pub const DEFAULT_BG: u8 = 0;

/// Counters for work the driver skipped or routed around the block mover.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DrawStats {
    /// Drawing calls dropped because they were entirely off screen, plus
    /// one per off-screen pixel passed to `set_pixel`.
    pub clipped: u32,
    pub block_moves: u32,
    /// Narrow copies done by reading and writing through the transport.
    pub software_copies: u32,
}

/// One VS23S010 and everything the driver remembers about it.
///
/// ```ignore
/// let link = HalTransport::new(spi, cs)?;
/// let mut console = Console::new(link, Geometry::DEFAULT);
/// console.init()?;
/// console.set_font(Some(&MY_FONT))?;
/// console.filled_rect(10, 10, 50, 30, 0x5c)?;
/// console.puts("hello")?;
/// ```
pub struct Console<T: Transport> {
    pub(crate) bus: Bus<T>,
    pub(crate) geometry: Geometry,
    pub(crate) wait: WaitPolicy,
    pub(crate) fg: u8,
    pub(crate) bg: u8,
    pub(crate) cursor_x: i16,
    pub(crate) cursor_y: i16,
    pub(crate) font: &'static Font,
    pub(crate) glyph_cache: Option<GlyphCache>,
    pub(crate) stats: DrawStats,
    /// A block move was started and has not been seen to finish.
    pub(crate) move_pending: bool,
}

impl<T: Transport> Console<T> {
    /// Takes the link; nothing is sent until [`Console::init`].
    pub fn new(transport: T, geometry: Geometry) -> Self {
        Self {
            bus: Bus::new(transport),
            geometry,
            wait: WaitPolicy::default(),
            fg: DEFAULT_FG,
            bg: DEFAULT_BG,
            cursor_x: 0,
            cursor_y: 0,
            font: &PLACEHOLDER,
            glyph_cache: None,
            stats: DrawStats::default(),
            move_pending: false,
        }
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn release(self) -> T {
        self.bus.release()
    }

    pub fn transport(&self) -> &T {
        self.bus.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.bus.transport_mut()
    }

    #[inline(always)]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline(always)]
    pub fn width(&self) -> u16 {
        self.geometry.width
    }

    #[inline(always)]
    pub fn height(&self) -> u16 {
        self.geometry.height
    }

    /// Bytes between the starts of two picture rows.
    #[inline(always)]
    pub fn linesize(&self) -> u32 {
        self.geometry.line_stride
    }

    pub fn set_colors(&mut self, fg: u8, bg: u8) {
        self.fg = fg;
        self.bg = bg;
    }

    /// Foreground and background.
    pub fn colors(&self) -> (u8, u8) {
        (self.fg, self.bg)
    }

    pub fn set_pos(&mut self, x: i16, y: i16) {
        self.cursor_x = x;
        self.cursor_y = y;
    }

    pub fn pos(&self) -> (i16, i16) {
        (self.cursor_x, self.cursor_y)
    }

    pub fn font(&self) -> &'static Font {
        self.font
    }

    /// Location of the rendered glyphs, once [`Console::set_font`] has run.
    pub fn glyph_cache(&self) -> Option<GlyphCache> {
        self.glyph_cache
    }

    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DrawStats::default();
    }

    /// Raw CURLINE status word.
    pub fn line_status(&mut self) -> Result<LineStatus, Error<T::Error>> {
        let mut f = self.bus.frame()?;
        f.byte(CURLINE)?;
        let status = f.word(0)?;
        f.close()?;
        Ok(LineStatus::from_bits_retain(status))
    }
}
