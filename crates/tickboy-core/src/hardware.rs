/// Master clock frequency in T-cycles per second.
pub const TICKS_PER_SEC: u32 = 4_194_304;

/// Dots per scanline.
pub const TICKS_PER_LINE: u32 = 456;

/// Scanlines per frame, including VBlank.
pub const LINES_PER_FRAME: u32 = 154;

pub const TICKS_PER_FRAME: u32 = TICKS_PER_LINE * LINES_PER_FRAME;

/// Console model being emulated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Model {
    #[default]
    Dmg,
    Cgb,
}

impl Model {
    #[inline]
    pub const fn is_cgb(self) -> bool {
        matches!(self, Model::Cgb)
    }
}
