use log::debug;

use crate::address_space::{AddressSpace, Ram};
use crate::gpu::Mode;

pub const HDMA1: u16 = 0xFF51;
pub const HDMA2: u16 = 0xFF52;
pub const HDMA3: u16 = 0xFF53;
pub const HDMA4: u16 = 0xFF54;
pub const HDMA5: u16 = 0xFF55;

/// Bytes moved per block.
pub const CHUNK_LEN: u16 = 0x10;
// Clocks spent per block.
const CHUNK_TICKS: u32 = 0x20;

/// One block the bus should copy from `src` to `dst`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HdmaChunk {
    pub src: u16,
    pub dst: u16,
}

/// CGB VRAM DMA, general purpose or HBlank-gated.
pub struct Hdma {
    /// HDMA1-4 source/destination latches
    regs: Ram,
    gpu_mode: Option<Mode>,
    in_progress: bool,
    hblank_transfer: bool,
    lcd_enabled: bool,
    /// Blocks left minus one, as HDMA5 reports it
    length: u8,
    src: u16,
    dst: u16,
    tick: u32,
}

impl Hdma {
    pub fn new() -> Self {
        Self {
            regs: Ram::new(HDMA1, 4),
            gpu_mode: None,
            in_progress: false,
            hblank_transfer: false,
            lcd_enabled: true,
            length: 0,
            src: 0,
            dst: 0,
            tick: 0,
        }
    }

    /// Advances an active transfer by one clock. Returns the block to copy
    /// once its time has come.
    pub fn tick(&mut self) -> Option<HdmaChunk> {
        if !self.is_transfer_in_progress() {
            return None;
        }
        self.tick += 1;
        if self.tick < CHUNK_TICKS {
            return None;
        }
        self.tick = 0;
        let chunk = HdmaChunk {
            src: self.src,
            dst: self.dst,
        };
        self.src = self.src.wrapping_add(CHUNK_LEN);
        self.dst = self.dst.wrapping_add(CHUNK_LEN);
        if self.length == 0 {
            self.in_progress = false;
            self.length = 0x7F;
        } else {
            self.length -= 1;
            if self.hblank_transfer {
                // wait for the next HBlank
                self.gpu_mode = None;
            }
        }
        Some(chunk)
    }

    pub fn on_gpu_update(&mut self, mode: Mode) {
        self.gpu_mode = Some(mode);
    }

    pub fn on_lcd_switch(&mut self, lcd_enabled: bool) {
        self.lcd_enabled = lcd_enabled;
    }

    /// Whether the transfer owns the bus this clock, stalling the CPU.
    pub fn is_transfer_in_progress(&self) -> bool {
        if !self.in_progress {
            return false;
        }
        !self.hblank_transfer || self.gpu_mode == Some(Mode::HBlank) || !self.lcd_enabled
    }

    fn start_transfer(&mut self, value: u8) {
        self.hblank_transfer = value & 0x80 != 0;
        self.length = value & 0x7F;
        let src = u16::from_be_bytes([self.regs.read(HDMA1), self.regs.read(HDMA2) & 0xF0]);
        let dst = u16::from_be_bytes([self.regs.read(HDMA3) & 0x1F, self.regs.read(HDMA4) & 0xF0]);
        self.src = src & 0xFFF0;
        self.dst = (dst & 0x1FFF) | 0x8000;
        self.tick = 0;
        self.in_progress = true;
        debug!(
            "HDMA {:#06x} -> {:#06x}, {} blocks{}",
            self.src,
            self.dst,
            u16::from(self.length) + 1,
            if self.hblank_transfer { " on HBlank" } else { "" }
        );
    }
}

impl Default for Hdma {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace for Hdma {
    fn accepts(&self, addr: u16) -> bool {
        (HDMA1..=HDMA5).contains(&addr)
    }

    fn read(&self, addr: u16) -> u8 {
        if addr == HDMA5 {
            (if self.in_progress { 0 } else { 0x80 }) | self.length
        } else {
            0xFF
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if self.regs.accepts(addr) {
            self.regs.write(addr, value);
        } else if addr == HDMA5 {
            if self.in_progress {
                debug!("HDMA stopped with {} blocks left", u16::from(self.length) + 1);
                self.in_progress = false;
            } else {
                self.start_transfer(value);
            }
        }
    }
}
