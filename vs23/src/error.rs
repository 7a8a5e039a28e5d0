use core::fmt;

/// A video configuration that cannot be laid out on the chip.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroSize,
    /// The line timing leaves room for fewer pixels than requested.
    PictureTooNarrow { requested: u16, available: u16 },
    /// The picture runs into the front porch.
    PictureOverrunsLine { end: u16, limit: u16 },
    /// PLL clocks per line must fit in 15 bits.
    LineTooLong { pllclks: u16 },
    /// Picture lines collide with the vertical sync lines.
    FrameTooShort { first_free: u16, last_free: u16 },
    TooManyLines { lines: u16 },
    TooManyProtolines { protolines: u16 },
    /// Protolines, index, picture and glyph directory exceed SRAM.
    OutOfMemory { needed: u32, available: u32 },
    StrideTooLarge { stride: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSize => write!(f, "picture has zero width or height"),
            ConfigError::PictureTooNarrow { requested, available } => {
                write!(f, "{} pixels requested, line holds {}", requested, available)
            }
            ConfigError::PictureOverrunsLine { end, limit } => {
                write!(f, "picture ends at color clock {}, past {}", end, limit)
            }
            ConfigError::LineTooLong { pllclks } => write!(f, "{} PLL clocks per line", pllclks),
            ConfigError::FrameTooShort { first_free, last_free } => {
                write!(f, "picture must stay within lines {}..={}", first_free, last_free)
            }
            ConfigError::TooManyLines { lines } => write!(f, "{} lines per frame", lines),
            ConfigError::TooManyProtolines { protolines } => write!(f, "{} protolines", protolines),
            ConfigError::OutOfMemory { needed, available } => {
                write!(f, "layout needs {} bytes, chip has {}", needed, available)
            }
            ConfigError::StrideTooLarge { stride } => write!(f, "line stride {} too large", stride),
        }
    }
}

/// Driver error, generic over the transport's error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error<E> {
    Transport(E),
    /// The block mover still reported busy after this many status polls.
    BlockMoveTimeout { polls: u32 },
    /// The font's glyph cache does not fit after the picture memory.
    GlyphCacheFull { needed: u32, available: u32 },
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "transport error: {:?}", e),
            Error::BlockMoveTimeout { polls } => write!(f, "block mover busy after {} polls", polls),
            Error::GlyphCacheFull { needed, available } => {
                write!(f, "glyph cache needs {} bytes of SRAM, {} available", needed, available)
            }
        }
    }
}
