use crate::address_space::{AddressSpace, Ram, ShadowSpace, VoidSpace};
use crate::cartridge::Cartridge;
use crate::display::Display;
use crate::dma::{OAM_SIZE, OamDma};
use crate::gbc_ram::{SVBK_ADDR, UndocumentedRegisters, WramBanks};
use crate::gpu::oam_search::OAM_START;
use crate::gpu::sprite_bug::{self, OamCorruption};
use crate::gpu::{Gpu, Mode};
use crate::hardware::Model;
use crate::hdma::{CHUNK_LEN, Hdma};
use crate::interrupts::{Interrupt, Interrupts};
use crate::joypad::Joypad;
use crate::serial::{SerialEndpoint, SerialPort};
use crate::sound::{Sound, SoundOutput};
use crate::speed_mode::SpeedMode;
use crate::timer::Timer;

const WRAM0_START: u16 = 0xC000;
const WRAM_BANK_SIZE: usize = 0x1000;
const HRAM_START: u16 = 0xFF80;
const HRAM_SIZE: usize = 0x7F;
const ECHO: ShadowSpace = ShadowSpace::new(0xE000, WRAM0_START, 0x1E00);

// SpriteBug only fires while the scan is still inside OAM.
const OAM_BUG_LAST_TICK: u32 = 79;

/// Device that owns an address on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    Cartridge,
    Gpu,
    Wram0,
    WramBanks,
    Joypad,
    Serial,
    Timer,
    Interrupts,
    Sound,
    Dma,
    SpeedMode,
    Hdma,
    GbcRegisters,
    Hram,
    Void,
}

/// The memory bus and every peripheral hanging off it.
pub struct Mmu {
    pub model: Model,
    pub cartridge: Cartridge,
    pub gpu: Gpu,
    pub wram0: Ram,
    pub wram_banks: WramBanks,
    pub hram: Ram,
    pub interrupts: Interrupts,
    pub timer: Timer,
    pub dma: OamDma,
    pub hdma: Hdma,
    pub speed_mode: SpeedMode,
    pub serial: SerialPort,
    pub joypad: Joypad,
    pub sound: Sound,
    pub gbc_registers: UndocumentedRegisters,
    void: VoidSpace,
}

impl Mmu {
    pub fn new(
        model: Model,
        cartridge: Cartridge,
        display: Box<dyn Display>,
        sound: Box<dyn SoundOutput>,
        serial: Box<dyn SerialEndpoint>,
    ) -> Self {
        Self {
            model,
            cartridge,
            gpu: Gpu::new(model, display),
            wram0: Ram::new(WRAM0_START, WRAM_BANK_SIZE),
            wram_banks: WramBanks::new(model),
            hram: Ram::new(HRAM_START, HRAM_SIZE),
            interrupts: Interrupts::new(model),
            timer: Timer::new(),
            dma: OamDma::new(),
            hdma: Hdma::new(),
            speed_mode: SpeedMode::new(),
            serial: SerialPort::new(serial),
            joypad: Joypad::new(),
            sound: Sound::new(sound),
            gbc_registers: UndocumentedRegisters::new(),
            void: VoidSpace,
        }
    }

    /// Resolves an address to its device and the address that device sees.
    /// Echo RAM is folded onto work RAM here.
    pub fn resolve(&self, addr: u16) -> (Device, u16) {
        if ECHO.contains(addr) {
            let target = ECHO.translate(addr);
            return (self.owner(target), target);
        }
        (self.owner(addr), addr)
    }

    /// Device mapped at `addr`, not following the echo region.
    pub fn owner(&self, addr: u16) -> Device {
        let cgb = self.model.is_cgb();
        match addr {
            0x0000..=0x7FFF | 0xA000..=0xBFFF | 0xFF50 => Device::Cartridge,
            0x8000..=0x9FFF => Device::Gpu,
            0xC000..=0xCFFF => Device::Wram0,
            0xD000..=0xDFFF => Device::WramBanks,
            0xFE00..=0xFE9F if !self.dma.is_oam_blocked() => Device::Gpu,
            0xFF00 => Device::Joypad,
            0xFF01..=0xFF02 => Device::Serial,
            0xFF04..=0xFF07 => Device::Timer,
            0xFF0F | 0xFFFF => Device::Interrupts,
            0xFF10..=0xFF14 | 0xFF16..=0xFF19 | 0xFF1A..=0xFF1E | 0xFF20..=0xFF26 | 0xFF30..=0xFF3F => {
                Device::Sound
            }
            0xFF40..=0xFF45 | 0xFF47..=0xFF4B | 0xFF4F | 0xFF68..=0xFF6B => Device::Gpu,
            0xFF46 => Device::Dma,
            0xFF4D if cgb => Device::SpeedMode,
            0xFF51..=0xFF55 if cgb => Device::Hdma,
            0xFF6C | 0xFF72..=0xFF77 if cgb => Device::GbcRegisters,
            SVBK_ADDR if cgb => Device::WramBanks,
            0xFF80..=0xFFFE => Device::Hram,
            _ => Device::Void,
        }
    }

    pub fn device(&self, device: Device) -> &dyn AddressSpace {
        match device {
            Device::Cartridge => &self.cartridge,
            Device::Gpu => &self.gpu,
            Device::Wram0 => &self.wram0,
            Device::WramBanks => &self.wram_banks,
            Device::Joypad => &self.joypad,
            Device::Serial => &self.serial,
            Device::Timer => &self.timer,
            Device::Interrupts => &self.interrupts,
            Device::Sound => &self.sound,
            Device::Dma => &self.dma,
            Device::SpeedMode => &self.speed_mode,
            Device::Hdma => &self.hdma,
            Device::GbcRegisters => &self.gbc_registers,
            Device::Hram => &self.hram,
            Device::Void => &self.void,
        }
    }

    pub fn device_mut(&mut self, device: Device) -> &mut dyn AddressSpace {
        match device {
            Device::Cartridge => &mut self.cartridge,
            Device::Gpu => &mut self.gpu,
            Device::Wram0 => &mut self.wram0,
            Device::WramBanks => &mut self.wram_banks,
            Device::Joypad => &mut self.joypad,
            Device::Serial => &mut self.serial,
            Device::Timer => &mut self.timer,
            Device::Interrupts => &mut self.interrupts,
            Device::Sound => &mut self.sound,
            Device::Dma => &mut self.dma,
            Device::SpeedMode => &mut self.speed_mode,
            Device::Hdma => &mut self.hdma,
            Device::GbcRegisters => &mut self.gbc_registers,
            Device::Hram => &mut self.hram,
            Device::Void => &mut self.void,
        }
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        let (device, addr) = self.resolve(addr);
        self.device(device).read(addr)
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) {
        let (device, addr) = self.resolve(addr);
        self.device_mut(device).write(addr, value);
    }

    pub fn speed(&self) -> u32 {
        self.speed_mode.speed()
    }

    /// Turns a host button press into a joypad interrupt request.
    pub fn poll_joypad(&mut self) {
        if self.joypad.take_press() {
            self.interrupts.request(Interrupt::Joypad);
        }
    }

    pub fn tick_timer(&mut self) {
        let speed = self.speed();
        self.timer.tick(speed, &mut self.interrupts);
    }

    pub fn tick_dma(&mut self) {
        let speed = self.speed();
        if let Some(from) = self.dma.tick(speed) {
            for i in 0..OAM_SIZE {
                let value = self.read_byte(OamDma::source_address(from.wrapping_add(i)));
                self.gpu.oam_mut().write(OAM_START + i, value);
            }
        }
    }

    pub fn tick_hdma(&mut self) {
        if let Some(chunk) = self.hdma.tick() {
            for i in 0..CHUNK_LEN {
                let value = self.read_byte(chunk.src.wrapping_add(i));
                self.write_byte(chunk.dst.wrapping_add(i), value);
            }
        }
    }

    pub fn tick_serial(&mut self) {
        let speed = self.speed();
        self.serial.tick(speed, &mut self.interrupts);
    }

    pub fn tick_gpu(&mut self) -> Option<Mode> {
        self.gpu.tick(&mut self.interrupts)
    }

    pub fn tick_sound(&mut self) {
        self.sound.tick();
    }

    /// Applies the OAM corruption pattern if the PPU is currently scanning
    /// OAM.
    pub fn corrupt_oam(&mut self, kind: OamCorruption) {
        let ticks = self.gpu.ticks_in_line();
        if self.gpu.lcdc().is_lcd_enabled()
            && self.gpu.mode() == Mode::OamSearch
            && ticks < OAM_BUG_LAST_TICK
        {
            sprite_bug::corrupt_oam(self, kind, ticks);
        }
    }
}

impl AddressSpace for Mmu {
    fn accepts(&self, _addr: u16) -> bool {
        true
    }

    fn read(&self, addr: u16) -> u8 {
        self.read_byte(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write_byte(addr, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullDisplay;
    use crate::serial::NullSerialEndpoint;
    use crate::sound::NullSoundOutput;

    fn mmu(model: Model) -> Mmu {
        let cart = Cartridge::from_bytes(vec![0x00; 0x8000]).unwrap();
        Mmu::new(
            model,
            cart,
            Box::new(NullDisplay::default()),
            Box::new(NullSoundOutput),
            Box::new(NullSerialEndpoint),
        )
    }

    #[test]
    fn echo_mirrors_work_ram() {
        let mut mmu = mmu(Model::Dmg);
        mmu.write_byte(0xE123, 0x5A);
        assert_eq!(mmu.read_byte(0xC123), 0x5A);
        mmu.write_byte(0xD456, 0xA5);
        assert_eq!(mmu.read_byte(0xF456), 0xA5);
    }

    #[test]
    fn cgb_only_registers_are_void_on_dmg() {
        let mut mmu = mmu(Model::Dmg);
        for addr in [0xFF4D, 0xFF55, 0xFF6C, 0xFF70, 0xFF75] {
            assert_eq!(mmu.owner(addr), Device::Void, "{addr:#06x}");
            mmu.write_byte(addr, 0x00);
            assert_eq!(mmu.read_byte(addr), 0xFF);
        }
    }

    #[test]
    fn unmapped_io_reads_ff() {
        let mmu = mmu(Model::Cgb);
        for addr in [0xFF03, 0xFF08, 0xFF15, 0xFF27, 0xFF4C, 0xFF56, 0xFF7F, 0xFEA0] {
            assert_eq!(mmu.read_byte(addr), 0xFF, "{addr:#06x}");
        }
    }

    #[test]
    fn oam_bug_needs_oam_scan() {
        let mut mmu = mmu(Model::Dmg);
        for i in 0..0xA0u16 {
            mmu.gpu.oam_mut().write(OAM_START + i, i as u8);
        }
        // power-on: OAM search, dot 0
        for _ in 0..8 {
            mmu.tick_gpu();
        }
        mmu.corrupt_oam(OamCorruption::IncDec);
        assert_eq!(mmu.read_byte(OAM_START + 18), 10);

        mmu.write_byte(0xFF40, 0x00);
        mmu.gpu.oam_mut().write(OAM_START + 18, 18);
        mmu.corrupt_oam(OamCorruption::IncDec);
        assert_eq!(mmu.read_byte(OAM_START + 18), 18);
    }
}
