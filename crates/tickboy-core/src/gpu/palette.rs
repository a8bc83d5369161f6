use crate::address_space::AddressSpace;

pub const BG_PALETTE_ADDR: u16 = 0xFF68;
pub const OBJ_PALETTE_ADDR: u16 = 0xFF6A;

const INDEX_MASK: u8 = 0x3F;
const AUTO_INCREMENT: u8 = 0x80;
const INDEX_UNUSED_BIT: u8 = 0x40;

/// CGB palette memory behind an index/data register pair
/// (gbdev.io/pandocs/Palettes.html#lcd-color-palettes-cgb-only).
///
/// Holds eight palettes of four 15-bit BGR colors.
#[derive(Clone, Debug)]
pub struct ColorPalette {
    index_addr: u16,
    index: u8,
    auto_increment: bool,
    palettes: [[u16; 4]; 8],
}

impl ColorPalette {
    pub fn new(index_addr: u16) -> Self {
        Self {
            index_addr,
            index: 0,
            auto_increment: false,
            palettes: [[0; 4]; 8],
        }
    }

    /// Object palettes power on as white.
    pub fn filled_white(index_addr: u16) -> Self {
        Self {
            palettes: [[0x7FFF; 4]; 8],
            ..Self::new(index_addr)
        }
    }

    fn data_addr(&self) -> u16 {
        self.index_addr + 1
    }

    pub fn palette(&self, index: u8) -> &[u16; 4] {
        &self.palettes[usize::from(index & 0x07)]
    }

    pub fn color(&self, palette: u8, color: u8) -> u16 {
        self.palette(palette)[usize::from(color & 0x03)]
    }

    fn slot(&mut self) -> &mut u16 {
        let index = usize::from(self.index);
        &mut self.palettes[index / 8][(index % 8) / 2]
    }
}

impl AddressSpace for ColorPalette {
    fn accepts(&self, addr: u16) -> bool {
        addr == self.index_addr || addr == self.data_addr()
    }

    fn read(&self, addr: u16) -> u8 {
        if addr == self.index_addr {
            let auto = if self.auto_increment { AUTO_INCREMENT } else { 0 };
            return self.index | auto | INDEX_UNUSED_BIT;
        }
        let index = usize::from(self.index);
        let color = self.palettes[index / 8][(index % 8) / 2];
        if index % 2 == 0 {
            color as u8
        } else {
            (color >> 8) as u8
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if addr == self.index_addr {
            self.index = value & INDEX_MASK;
            self.auto_increment = value & AUTO_INCREMENT != 0;
            return;
        }
        let low_byte = self.index % 2 == 0;
        let slot = self.slot();
        *slot = if low_byte {
            (*slot & 0xFF00) | u16::from(value)
        } else {
            (*slot & 0x00FF) | (u16::from(value) << 8)
        };
        if self.auto_increment {
            self.index = (self.index + 1) & INDEX_MASK;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_increment_fills_consecutive_colors() {
        let mut bg = ColorPalette::new(BG_PALETTE_ADDR);
        bg.write(BG_PALETTE_ADDR, 0x80 | 0x3E);
        assert_eq!(bg.read(BG_PALETTE_ADDR), 0xFE);
        bg.write(BG_PALETTE_ADDR + 1, 0x1F);
        bg.write(BG_PALETTE_ADDR + 1, 0x7C);
        // wrapped around to palette 0, color 0
        assert_eq!(bg.read(BG_PALETTE_ADDR), 0xC0);
        bg.write(BG_PALETTE_ADDR + 1, 0xE0);
        bg.write(BG_PALETTE_ADDR + 1, 0x03);
        assert_eq!(bg.color(7, 3), 0x7C1F);
        assert_eq!(bg.color(0, 0), 0x03E0);
    }

    #[test]
    fn data_reads_follow_index_without_increment() {
        let mut obj = ColorPalette::filled_white(OBJ_PALETTE_ADDR);
        obj.write(OBJ_PALETTE_ADDR, 0x09);
        assert_eq!(obj.read(OBJ_PALETTE_ADDR + 1), 0x7F);
        obj.write(OBJ_PALETTE_ADDR + 1, 0x12);
        assert_eq!(obj.read(OBJ_PALETTE_ADDR + 1), 0x12);
        assert_eq!(obj.color(1, 0), 0x12FF);
        assert_eq!(obj.read(OBJ_PALETTE_ADDR), 0x49);
    }
}
