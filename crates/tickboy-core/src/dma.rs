use log::trace;

use crate::address_space::AddressSpace;

pub const DMA_ADDR: u16 = 0xFF46;
pub const OAM_SIZE: u16 = 0xA0;

// 160 M-cycles plus start-up delay (gbdev.io/pandocs/OAM_DMA_Transfer.html)
const TRANSFER_TICKS: u32 = 648;
// OAM stays accessible for the first few clocks after the trigger.
const BLOCK_DELAY_TICKS: u32 = 5;

/// OAM DMA engine.
///
/// The copy itself happens in one go once the transfer window has elapsed;
/// until then OAM is blocked for the CPU.
#[derive(Debug)]
pub struct OamDma {
    in_progress: bool,
    /// Triggered while a previous transfer was already blocking OAM
    restarted: bool,
    from: u16,
    ticks: u32,
    reg: u8,
}

impl OamDma {
    pub fn new() -> Self {
        Self {
            in_progress: false,
            restarted: false,
            from: 0,
            ticks: 0,
            reg: 0xFF,
        }
    }

    /// Advances the transfer. Returns the source base address when the copy
    /// into OAM is due.
    pub fn tick(&mut self, speed: u32) -> Option<u16> {
        if !self.in_progress {
            return None;
        }
        self.ticks += 1;
        if self.ticks < TRANSFER_TICKS / speed {
            return None;
        }
        self.in_progress = false;
        self.restarted = false;
        self.ticks = 0;
        Some(self.from)
    }

    pub fn is_oam_blocked(&self) -> bool {
        self.restarted || (self.in_progress && self.ticks >= BLOCK_DELAY_TICKS)
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// DMA sees the echo region as work RAM instead of its real mapping.
    pub fn source_address(addr: u16) -> u16 {
        if addr < 0xE000 { addr } else { addr - 0x2000 }
    }
}

impl Default for OamDma {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace for OamDma {
    fn accepts(&self, addr: u16) -> bool {
        addr == DMA_ADDR
    }

    fn read(&self, _addr: u16) -> u8 {
        self.reg
    }

    fn write(&mut self, _addr: u16, value: u8) {
        self.from = u16::from(value) * 0x100;
        self.restarted = self.is_oam_blocked();
        self.ticks = 0;
        self.in_progress = true;
        self.reg = value;
        trace!("OAM DMA from {:#06x}", self.from);
    }
}
