use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::cartridge::Cartridge;
use crate::cpu::Cpu;
use crate::cpu::registers::Registers;
use crate::display::{Display, NullDisplay};
use crate::error::CoreError;
use crate::gpu::Mode;
use crate::hardware::{Model, TICKS_PER_FRAME};
use crate::joypad::JoypadHandle;
use crate::mmu::Mmu;
use crate::serial::{NullSerialEndpoint, SerialEndpoint};
use crate::sound::{NR52_ADDR, NullSoundOutput, SoundOutput};

const BGP_ADDR: u16 = 0xFF47;
const BOOT_BGP: u8 = 0xFC;
const BOOT_NR52: u8 = 0xF1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub model: Model,
    /// Start at 0x0100 with the post-boot register state instead of running
    /// a boot ROM.
    pub skip_boot: bool,
}

/// Where the machine's output goes.
pub struct Sinks {
    pub display: Box<dyn Display>,
    pub sound: Box<dyn SoundOutput>,
    pub serial: Box<dyn SerialEndpoint>,
}

impl Default for Sinks {
    fn default() -> Self {
        Self {
            display: Box::new(NullDisplay::default()),
            sound: Box::new(NullSoundOutput),
            serial: Box::new(NullSerialEndpoint),
        }
    }
}

pub struct GameBoy {
    pub cpu: Cpu,
    pub mmu: Mmu,
    pub config: Config,
    requested_refresh: bool,
    lcd_disabled: bool,
}

impl GameBoy {
    pub fn new(config: Config, cartridge: Cartridge, sinks: Sinks) -> Self {
        let mut mmu = Mmu::new(
            config.model,
            cartridge,
            sinks.display,
            sinks.sound,
            sinks.serial,
        );
        let cpu = if config.skip_boot {
            mmu.cartridge.unmap_boot_rom();
            mmu.write_byte(BGP_ADDR, BOOT_BGP);
            mmu.write_byte(NR52_ADDR, BOOT_NR52);
            Cpu::new(Registers::post_boot(config.model))
        } else {
            Cpu::new(Registers::default())
        };
        info!(
            "{:?} machine ready{}",
            config.model,
            if config.skip_boot { ", boot skipped" } else { "" }
        );
        Self {
            cpu,
            mmu,
            config,
            requested_refresh: false,
            lcd_disabled: false,
        }
    }

    /// Handle for pressing buttons from another thread.
    pub fn joypad(&self) -> JoypadHandle {
        self.mmu.joypad.handle()
    }

    /// Advances every component by one clock. Returns the graphics mode when
    /// it changed during this clock.
    pub fn tick(&mut self) -> Result<Option<Mode>, CoreError> {
        self.mmu.poll_joypad();
        self.mmu.tick_timer();
        if self.mmu.hdma.is_transfer_in_progress() {
            self.mmu.tick_hdma();
        } else {
            self.cpu.tick(&mut self.mmu)?;
        }
        self.mmu.tick_dma();
        self.mmu.tick_serial();
        let mode = self.mmu.tick_gpu();
        self.mmu.tick_sound();
        Ok(mode)
    }

    /// One clock plus the display hand-off and HDMA notifications.
    pub fn step(&mut self) -> Result<(), CoreError> {
        let mode = self.tick()?;
        if let Some(mode) = mode {
            self.mmu.hdma.on_gpu_update(mode);
        }

        let lcd_enabled = self.mmu.gpu.is_lcd_enabled();
        if !self.lcd_disabled && !lcd_enabled {
            self.lcd_disabled = true;
            self.mmu.gpu.display_mut().request_refresh();
            self.mmu.hdma.on_lcd_switch(false);
        } else if mode == Some(Mode::VBlank) {
            self.requested_refresh = true;
            self.mmu.gpu.display_mut().request_refresh();
        }

        if self.lcd_disabled && lcd_enabled {
            self.lcd_disabled = false;
            self.mmu.gpu.display_mut().wait_for_refresh();
            self.mmu.hdma.on_lcd_switch(true);
        } else if self.requested_refresh && mode == Some(Mode::OamSearch) {
            self.requested_refresh = false;
            self.mmu.gpu.display_mut().wait_for_refresh();
        }
        Ok(())
    }

    /// Runs one frame's worth of clocks.
    pub fn run_frame(&mut self) -> Result<(), CoreError> {
        for _ in 0..TICKS_PER_FRAME {
            self.step()?;
        }
        Ok(())
    }

    /// Runs until `cancel` is raised or the processor faults.
    pub fn run(&mut self, cancel: &AtomicBool) -> Result<(), CoreError> {
        while !cancel.load(Ordering::Relaxed) {
            self.step()?;
        }
        info!("run loop cancelled");
        Ok(())
    }
}
