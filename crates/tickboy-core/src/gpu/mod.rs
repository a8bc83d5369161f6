pub mod fifo;
pub mod lcdc;
pub mod oam_search;
pub mod palette;
pub mod phase;
pub mod pixel_transfer;
pub mod registers;
pub mod sprite_bug;
pub mod tile_attributes;

use log::debug;

use crate::address_space::{AddressSpace, Ram};
use crate::display::Display;
use crate::hardware::Model;
use crate::interrupts::{Interrupt, Interrupts};

use lcdc::{LCDC_ADDR, Lcdc};
use oam_search::{MAX_SPRITES_PER_LINE, OAM_START, OamSearch, SpritePosition};
use palette::{BG_PALETTE_ADDR, ColorPalette, OBJ_PALETTE_ADDR};
use phase::{HBlankPhase, VBlankPhase};
use pixel_transfer::{PixelTransfer, VideoMemory};
use registers::{GpuRegister, GpuRegisters};

const VRAM_START: u16 = 0x8000;
const VRAM_BANK_SIZE: usize = 0x2000;
const OAM_SIZE: usize = 0xA0;

const VBLANK_LINE: u8 = 144;
const LAST_LINE: u8 = 153;
// LY already reads 0 from this dot of line 153.
const LY_RESET_TICK: u32 = 4;

// Dots the line is considered to have used when the LCD is switched off.
const LCD_OFF_HBLANK_START: u32 = 250;
// Dots between setting LCDC bit 7 and the first line.
const LCD_ON_DELAY: u32 = 244;

// STAT interrupt source bits
const STAT_HBLANK: u8 = 3;
const STAT_VBLANK: u8 = 4;
const STAT_OAM: u8 = 5;
const STAT_LYC: u8 = 6;

/// LCD mode as reported in STAT bits 0-1.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamSearch = 2,
    PixelTransfer = 3,
}

/// Picture processing unit: VRAM, OAM, LCD registers and the per-dot mode
/// state machine.
pub struct Gpu {
    vram0: Ram,
    vram1: Ram,
    oam: Ram,
    lcdc: Lcdc,
    regs: GpuRegisters,
    bg_palette: ColorPalette,
    obj_palette: ColorPalette,
    model: Model,
    display: Box<dyn Display>,

    mode: Mode,
    ticks_in_line: u32,
    lcd_enabled: bool,
    lcd_enabled_delay: Option<u32>,

    oam_search: OamSearch,
    pixel_transfer: PixelTransfer,
    hblank: HBlankPhase,
    vblank: VBlankPhase,
}

impl Gpu {
    pub fn new(model: Model, mut display: Box<dyn Display>) -> Self {
        display.set_enabled(true);
        let mut gpu = Self {
            vram0: Ram::new(VRAM_START, VRAM_BANK_SIZE),
            vram1: Ram::new(VRAM_START, VRAM_BANK_SIZE),
            oam: Ram::new(OAM_START, OAM_SIZE),
            lcdc: Lcdc::default(),
            regs: GpuRegisters::default(),
            bg_palette: ColorPalette::new(BG_PALETTE_ADDR),
            obj_palette: ColorPalette::filled_white(OBJ_PALETTE_ADDR),
            model,
            display,
            mode: Mode::OamSearch,
            ticks_in_line: 0,
            lcd_enabled: true,
            lcd_enabled_delay: None,
            oam_search: OamSearch::new(),
            pixel_transfer: PixelTransfer::new(),
            hblank: HBlankPhase::default(),
            vblank: VBlankPhase::default(),
        };
        gpu.oam_search.start();
        gpu
    }

    /// Advances one dot. Returns the new mode when it changed.
    pub fn tick(&mut self, interrupts: &mut Interrupts) -> Option<Mode> {
        if !self.lcd_enabled
            && let Some(delay) = self.lcd_enabled_delay
        {
            if delay <= 1 {
                self.lcd_enabled_delay = None;
                self.display.set_enabled(true);
                self.lcd_enabled = true;
                debug!("LCD on");
            } else {
                self.lcd_enabled_delay = Some(delay - 1);
            }
        }
        if !self.lcd_enabled {
            return None;
        }

        let old_mode = self.mode;
        self.ticks_in_line += 1;
        let in_phase = match self.mode {
            Mode::OamSearch => {
                let ly = self.regs.get(GpuRegister::Ly);
                self.oam_search
                    .tick(&self.oam, ly, self.lcdc.sprite_height())
            }
            Mode::PixelTransfer => self.tick_pixel_transfer(),
            Mode::HBlank => self.hblank.tick(),
            Mode::VBlank => self.vblank.tick(),
        };

        if in_phase {
            if self.ticks_in_line == LY_RESET_TICK
                && self.mode == Mode::VBlank
                && self.regs.get(GpuRegister::Ly) == LAST_LINE
            {
                self.regs.put(GpuRegister::Ly, 0);
                self.request_lyc_interrupt(interrupts);
            }
        } else {
            self.next_mode(interrupts);
        }

        if self.mode == old_mode {
            None
        } else {
            #[cfg(feature = "ppu-trace")]
            eprintln!(
                "[PPU] {:?} -> {:?} ly={} dot={}",
                old_mode,
                self.mode,
                self.regs.get(GpuRegister::Ly),
                self.ticks_in_line
            );
            Some(self.mode)
        }
    }

    fn next_mode(&mut self, interrupts: &mut Interrupts) {
        match self.mode {
            Mode::OamSearch => {
                self.mode = Mode::PixelTransfer;
                let sprites = self.oam_search.sprites();
                self.start_pixel_transfer(sprites);
            }
            Mode::PixelTransfer => {
                self.mode = Mode::HBlank;
                self.hblank.start(self.ticks_in_line);
                self.request_stat_interrupt(interrupts, STAT_HBLANK);
            }
            Mode::HBlank => {
                self.ticks_in_line = 0;
                if self.regs.pre_increment(GpuRegister::Ly) == VBLANK_LINE {
                    self.mode = Mode::VBlank;
                    self.vblank.start();
                    interrupts.request(Interrupt::VBlank);
                    self.request_stat_interrupt(interrupts, STAT_VBLANK);
                } else {
                    self.mode = Mode::OamSearch;
                    self.oam_search.start();
                }
                self.request_stat_interrupt(interrupts, STAT_OAM);
                self.request_lyc_interrupt(interrupts);
            }
            Mode::VBlank => {
                self.ticks_in_line = 0;
                // LY was reset to 0 early in line 153
                if self.regs.pre_increment(GpuRegister::Ly) == 1 {
                    self.mode = Mode::OamSearch;
                    self.regs.put(GpuRegister::Ly, 0);
                    self.oam_search.start();
                    self.request_stat_interrupt(interrupts, STAT_OAM);
                } else {
                    self.vblank.start();
                }
                self.request_lyc_interrupt(interrupts);
            }
        }
    }

    fn start_pixel_transfer(&mut self, sprites: [Option<SpritePosition>; MAX_SPRITES_PER_LINE]) {
        let Gpu {
            vram0,
            vram1,
            oam,
            lcdc,
            regs,
            bg_palette,
            obj_palette,
            model,
            pixel_transfer,
            ..
        } = self;
        let mem = VideoMemory {
            vram0,
            vram1,
            oam,
            lcdc: *lcdc,
            regs,
            bg_palette,
            obj_palette,
            model: *model,
        };
        pixel_transfer.start(&mem, sprites);
    }

    fn tick_pixel_transfer(&mut self) -> bool {
        let Gpu {
            vram0,
            vram1,
            oam,
            lcdc,
            regs,
            bg_palette,
            obj_palette,
            model,
            pixel_transfer,
            display,
            ..
        } = self;
        let mem = VideoMemory {
            vram0,
            vram1,
            oam,
            lcdc: *lcdc,
            regs,
            bg_palette,
            obj_palette,
            model: *model,
        };
        pixel_transfer.tick(&mem, &mut **display)
    }

    fn request_stat_interrupt(&self, interrupts: &mut Interrupts, bit: u8) {
        if self.regs.get(GpuRegister::Stat) & (1 << bit) != 0 {
            interrupts.request(Interrupt::LcdStat);
        }
    }

    fn request_lyc_interrupt(&self, interrupts: &mut Interrupts) {
        if self.regs.get(GpuRegister::Lyc) == self.regs.get(GpuRegister::Ly) {
            self.request_stat_interrupt(interrupts, STAT_LYC);
        }
    }

    fn set_lcdc(&mut self, value: u8) {
        self.lcdc.set(value);
        if value & 0x80 == 0 {
            self.disable_lcd();
        } else if !self.lcd_enabled && self.lcd_enabled_delay.is_none() {
            self.lcd_enabled_delay = Some(LCD_ON_DELAY);
        }
    }

    fn disable_lcd(&mut self) {
        if self.lcd_enabled {
            debug!("LCD off");
        }
        self.regs.put(GpuRegister::Ly, 0);
        self.ticks_in_line = 0;
        self.hblank.start(LCD_OFF_HBLANK_START);
        self.mode = Mode::HBlank;
        self.lcd_enabled = false;
        self.lcd_enabled_delay = None;
        self.display.set_enabled(false);
    }

    fn vram(&self) -> &Ram {
        if self.model.is_cgb() && self.regs.get(GpuRegister::Vbk) & 1 == 1 {
            &self.vram1
        } else {
            &self.vram0
        }
    }

    fn vram_mut(&mut self) -> &mut Ram {
        if self.model.is_cgb() && self.regs.get(GpuRegister::Vbk) & 1 == 1 {
            &mut self.vram1
        } else {
            &mut self.vram0
        }
    }

    fn read_stat(&self) -> u8 {
        let coincidence = if self.regs.get(GpuRegister::Lyc) == self.regs.get(GpuRegister::Ly) {
            0x04
        } else {
            0
        };
        self.regs.get(GpuRegister::Stat) | self.mode as u8 | coincidence | 0x80
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn ticks_in_line(&self) -> u32 {
        self.ticks_in_line
    }

    pub fn lcdc(&self) -> Lcdc {
        self.lcdc
    }

    /// True while the LCD is running (after the power-on delay).
    pub fn is_lcd_enabled(&self) -> bool {
        self.lcd_enabled
    }

    pub fn ly(&self) -> u8 {
        self.regs.get(GpuRegister::Ly)
    }

    pub fn oam(&self) -> &Ram {
        &self.oam
    }

    /// Direct OAM access for the DMA engine, bypassing bus blocking.
    pub fn oam_mut(&mut self) -> &mut Ram {
        &mut self.oam
    }

    pub fn display(&self) -> &dyn Display {
        self.display.as_ref()
    }

    pub fn display_mut(&mut self) -> &mut dyn Display {
        self.display.as_mut()
    }

    fn is_palette(addr: u16) -> bool {
        (BG_PALETTE_ADDR..=OBJ_PALETTE_ADDR + 1).contains(&addr)
    }
}

impl AddressSpace for Gpu {
    fn accepts(&self, addr: u16) -> bool {
        self.vram0.accepts(addr)
            || self.oam.accepts(addr)
            || addr == LCDC_ADDR
            || GpuRegister::from_address(addr).is_some()
            || Self::is_palette(addr)
    }

    fn read(&self, addr: u16) -> u8 {
        if self.vram0.accepts(addr) {
            return self.vram().read(addr);
        }
        if self.oam.accepts(addr) {
            return self.oam.read(addr);
        }
        if addr == LCDC_ADDR {
            return self.lcdc.get();
        }
        if Self::is_palette(addr) {
            if !self.model.is_cgb() {
                return 0xFF;
            }
            return if addr < OBJ_PALETTE_ADDR {
                self.bg_palette.read(addr)
            } else {
                self.obj_palette.read(addr)
            };
        }
        match GpuRegister::from_address(addr) {
            Some(GpuRegister::Stat) => self.read_stat(),
            Some(GpuRegister::Vbk) => {
                if self.model.is_cgb() {
                    0xFE | self.regs.get(GpuRegister::Vbk)
                } else {
                    0xFF
                }
            }
            Some(reg) => self.regs.get(reg),
            None => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if self.vram0.accepts(addr) {
            self.vram_mut().write(addr, value);
            return;
        }
        if self.oam.accepts(addr) {
            self.oam.write(addr, value);
            return;
        }
        if addr == LCDC_ADDR {
            self.set_lcdc(value);
            return;
        }
        if Self::is_palette(addr) {
            if !self.model.is_cgb() {
                return;
            }
            if addr < OBJ_PALETTE_ADDR {
                self.bg_palette.write(addr, value);
            } else {
                self.obj_palette.write(addr, value);
            }
            return;
        }
        match GpuRegister::from_address(addr) {
            Some(GpuRegister::Stat) => self.regs.put(GpuRegister::Stat, value & 0x78),
            Some(GpuRegister::Vbk) => self.regs.put(GpuRegister::Vbk, value & 0x01),
            Some(reg) if reg.is_writable() => self.regs.put(reg, value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullDisplay;

    fn gpu(model: Model) -> (Gpu, Interrupts) {
        (Gpu::new(model, Box::new(NullDisplay::default())), Interrupts::new(model))
    }

    #[test]
    fn stat_reports_mode_and_coincidence() {
        let (mut gpu, _) = gpu(Model::Dmg);
        gpu.write(0xFF41, 0xFF);
        // LY == LYC == 0 at power-on, OAM search
        assert_eq!(gpu.read(0xFF41), 0x80 | 0x78 | 0x04 | 0x02);
    }

    #[test]
    fn ly_is_read_only() {
        let (mut gpu, _) = gpu(Model::Dmg);
        gpu.write(0xFF44, 0x42);
        assert_eq!(gpu.read(0xFF44), 0);
    }

    #[test]
    fn vram_banking_only_on_cgb() {
        let (mut cgb, _) = gpu(Model::Cgb);
        cgb.write(0x8000, 0x11);
        cgb.write(0xFF4F, 0x01);
        assert_eq!(cgb.read(0xFF4F), 0xFF);
        assert_eq!(cgb.read(0x8000), 0x00);
        cgb.write(0x8000, 0x22);
        cgb.write(0xFF4F, 0x00);
        assert_eq!(cgb.read(0xFF4F), 0xFE);
        assert_eq!(cgb.read(0x8000), 0x11);

        let (mut dmg, _) = gpu(Model::Dmg);
        dmg.write(0x8000, 0x11);
        dmg.write(0xFF4F, 0x01);
        assert_eq!(dmg.read(0xFF4F), 0xFF);
        assert_eq!(dmg.read(0x8000), 0x11);
    }

    #[test]
    fn dmg_ignores_color_palettes() {
        let (mut dmg, _) = gpu(Model::Dmg);
        dmg.write(0xFF68, 0x80);
        assert_eq!(dmg.read(0xFF68), 0xFF);
        assert_eq!(dmg.read(0xFF69), 0xFF);
    }

    #[test]
    fn lcd_off_freezes_and_on_resumes_after_delay() {
        let (mut gpu, mut irq) = gpu(Model::Dmg);
        for _ in 0..1000 {
            gpu.tick(&mut irq);
        }
        gpu.write(0xFF40, 0x11);
        assert!(!gpu.is_lcd_enabled());
        assert!(!gpu.display().enabled());
        assert_eq!(gpu.ly(), 0);
        assert_eq!(gpu.mode(), Mode::HBlank);
        for _ in 0..1000 {
            assert_eq!(gpu.tick(&mut irq), None);
        }
        gpu.write(0xFF40, 0x91);
        for _ in 0..LCD_ON_DELAY - 1 {
            gpu.tick(&mut irq);
            assert!(!gpu.is_lcd_enabled());
        }
        gpu.tick(&mut irq);
        assert!(gpu.is_lcd_enabled());
        assert!(gpu.display().enabled());
    }
}
