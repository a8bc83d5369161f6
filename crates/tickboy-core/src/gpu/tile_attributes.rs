use super::registers::GpuRegister;

/// BG map attribute byte (VRAM bank 1) or OAM flags byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileAttributes(u8);

impl TileAttributes {
    pub const EMPTY: TileAttributes = TileAttributes(0);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// BG-to-OBJ priority.
    pub const fn is_priority(self) -> bool {
        self.0 & 0x80 != 0
    }

    pub const fn is_y_flip(self) -> bool {
        self.0 & 0x40 != 0
    }

    pub const fn is_x_flip(self) -> bool {
        self.0 & 0x20 != 0
    }

    /// DMG object palette register selected by bit 4.
    pub const fn dmg_palette(self) -> GpuRegister {
        if self.0 & 0x10 == 0 {
            GpuRegister::Obp0
        } else {
            GpuRegister::Obp1
        }
    }

    pub const fn bank(self) -> usize {
        if self.0 & 0x08 == 0 { 0 } else { 1 }
    }

    pub const fn color_palette_index(self) -> u8 {
        self.0 & 0x07
    }
}
