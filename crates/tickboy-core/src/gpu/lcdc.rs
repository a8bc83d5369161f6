// LCDC bits (gbdev.io/pandocs/LCDC.html)
const BG_WINDOW_DISPLAY: u8 = 0x01;
const OBJ_DISPLAY: u8 = 0x02;
const OBJ_SIZE: u8 = 0x04;
const BG_TILE_MAP: u8 = 0x08;
const TILE_DATA: u8 = 0x10;
const WINDOW_DISPLAY: u8 = 0x20;
const WINDOW_TILE_MAP: u8 = 0x40;
const LCD_ENABLE: u8 = 0x80;

pub const LCDC_ADDR: u16 = 0xFF40;
const LCDC_POWER_ON: u8 = 0x91;

/// LCD control register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lcdc(u8);

impl Lcdc {
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub fn set(&mut self, value: u8) {
        self.0 = value;
    }

    pub const fn is_bg_and_window_display(self) -> bool {
        self.0 & BG_WINDOW_DISPLAY != 0
    }

    pub const fn is_obj_display(self) -> bool {
        self.0 & OBJ_DISPLAY != 0
    }

    pub const fn sprite_height(self) -> u8 {
        if self.0 & OBJ_SIZE == 0 { 8 } else { 16 }
    }

    pub const fn bg_tile_map(self) -> u16 {
        if self.0 & BG_TILE_MAP == 0 { 0x9800 } else { 0x9C00 }
    }

    pub const fn bg_window_tile_data(self) -> u16 {
        if self.0 & TILE_DATA == 0 { 0x9000 } else { 0x8000 }
    }

    /// Tile ids index around 0x9000 as signed bytes.
    pub const fn is_bg_window_tile_data_signed(self) -> bool {
        self.0 & TILE_DATA == 0
    }

    pub const fn is_window_display(self) -> bool {
        self.0 & WINDOW_DISPLAY != 0
    }

    pub const fn window_tile_map(self) -> u16 {
        if self.0 & WINDOW_TILE_MAP == 0 { 0x9800 } else { 0x9C00 }
    }

    pub const fn is_lcd_enabled(self) -> bool {
        self.0 & LCD_ENABLE != 0
    }
}

impl Default for Lcdc {
    fn default() -> Self {
        Self(LCDC_POWER_ON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_layout() {
        let lcdc = Lcdc::default();
        assert!(lcdc.is_lcd_enabled());
        assert!(lcdc.is_bg_and_window_display());
        assert!(!lcdc.is_obj_display());
        assert_eq!(lcdc.bg_window_tile_data(), 0x8000);
        assert!(!lcdc.is_bg_window_tile_data_signed());
        assert_eq!(lcdc.bg_tile_map(), 0x9800);
        assert_eq!(lcdc.sprite_height(), 8);
    }

    #[test]
    fn signed_tile_data_and_tall_sprites() {
        let lcdc = Lcdc::new(0x4C);
        assert_eq!(lcdc.bg_window_tile_data(), 0x9000);
        assert!(lcdc.is_bg_window_tile_data_signed());
        assert_eq!(lcdc.window_tile_map(), 0x9C00);
        assert_eq!(lcdc.bg_tile_map(), 0x9C00);
        assert_eq!(lcdc.sprite_height(), 16);
    }
}
