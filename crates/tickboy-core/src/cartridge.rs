use std::fs;
use std::path::Path;

use log::debug;

use crate::address_space::AddressSpace;
use crate::error::CartridgeError;
use crate::hardware::Model;

pub const BOOT_UNMAP_ADDR: u16 = 0xFF50;

const ROM_END: u16 = 0x7FFF;
const EXTERNAL_RAM_START: u16 = 0xA000;
const EXTERNAL_RAM_END: u16 = 0xBFFF;

/// Mapper-less 32 KiB cartridge. Bank switching writes are ignored and the
/// external RAM window reads zero.
#[derive(Debug, Clone)]
pub struct RomOnly {
    rom: Vec<u8>,
}

impl RomOnly {
    pub fn new(rom: Vec<u8>) -> Self {
        Self { rom }
    }
}

impl AddressSpace for RomOnly {
    fn accepts(&self, addr: u16) -> bool {
        addr <= ROM_END || (EXTERNAL_RAM_START..=EXTERNAL_RAM_END).contains(&addr)
    }

    fn read(&self, addr: u16) -> u8 {
        if addr <= ROM_END {
            self.rom.get(usize::from(addr)).copied().unwrap_or(0xFF)
        } else {
            0x00
        }
    }

    fn write(&mut self, _addr: u16, _value: u8) {}
}

/// Cartridge slot: a mapper plus the boot ROM overlaid on top of it until
/// 0xFF50 is written.
pub struct Cartridge {
    mapper: Box<dyn AddressSpace + Send>,
    boot_rom: Option<Vec<u8>>,
    boot_mapped: bool,
    cgb: bool,
}

impl Cartridge {
    pub fn new(mapper: Box<dyn AddressSpace + Send>) -> Self {
        Self {
            mapper,
            boot_rom: None,
            boot_mapped: false,
            cgb: false,
        }
    }

    pub fn from_bytes(rom: Vec<u8>) -> Result<Self, CartridgeError> {
        if rom.is_empty() {
            return Err(CartridgeError::Empty);
        }
        Ok(Self::new(Box::new(RomOnly::new(rom))))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let rom = fs::read(&path)?;
        debug!("loaded {} bytes from {}", rom.len(), path.as_ref().display());
        Self::from_bytes(rom)
    }

    /// Maps a boot image over 0x0000-0x00FF, and on CGB also 0x0200-0x08FF.
    pub fn with_boot_rom(mut self, image: Vec<u8>, model: Model) -> Result<Self, CartridgeError> {
        if image.is_empty() {
            return Err(CartridgeError::Empty);
        }
        self.boot_rom = Some(image);
        self.boot_mapped = true;
        self.cgb = model.is_cgb();
        Ok(self)
    }

    pub fn is_boot_rom_mapped(&self) -> bool {
        self.boot_mapped
    }

    pub fn unmap_boot_rom(&mut self) {
        if self.boot_mapped {
            debug!("boot ROM unmapped");
        }
        self.boot_mapped = false;
    }

    fn boot_byte(&self, addr: u16) -> Option<u8> {
        if !self.boot_mapped {
            return None;
        }
        let overlaid = match addr {
            0x0000..=0x00FF => true,
            0x0200..=0x08FF => self.cgb,
            _ => false,
        };
        if !overlaid {
            return None;
        }
        let image = self.boot_rom.as_ref()?;
        Some(image.get(usize::from(addr)).copied().unwrap_or(0xFF))
    }
}

impl AddressSpace for Cartridge {
    fn accepts(&self, addr: u16) -> bool {
        addr == BOOT_UNMAP_ADDR || self.mapper.accepts(addr)
    }

    fn read(&self, addr: u16) -> u8 {
        if addr == BOOT_UNMAP_ADDR {
            return 0xFF;
        }
        if let Some(byte) = self.boot_byte(addr) {
            return byte;
        }
        self.mapper.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        if addr == BOOT_UNMAP_ADDR {
            self.unmap_boot_rom();
        } else {
            self.mapper.write(addr, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom() -> Vec<u8> {
        (0..0x8000u32).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn empty_image_is_rejected() {
        assert!(matches!(
            Cartridge::from_bytes(Vec::new()),
            Err(CartridgeError::Empty)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Cartridge::from_file("/nonexistent/tickboy.gb").err();
        assert!(matches!(err, Some(CartridgeError::Io(_))));
    }

    #[test]
    fn dmg_boot_overlay_until_unmapped() {
        let mut cart = Cartridge::from_bytes(rom())
            .unwrap()
            .with_boot_rom(vec![0xAA; 0x100], Model::Dmg)
            .unwrap();
        assert_eq!(cart.read(0x0000), 0xAA);
        assert_eq!(cart.read(0x0100), (0x100 % 251) as u8);
        assert_eq!(cart.read(0x0200), (0x200 % 251) as u8);
        cart.write(BOOT_UNMAP_ADDR, 1);
        assert!(!cart.is_boot_rom_mapped());
        assert_eq!(cart.read(0x0000), 0);
        assert_eq!(cart.read(BOOT_UNMAP_ADDR), 0xFF);
    }

    #[test]
    fn cgb_boot_overlay_skips_header() {
        let mut image = vec![0xBB; 0x900];
        image[0x0150] = 0x00;
        let cart = Cartridge::from_bytes(rom())
            .unwrap()
            .with_boot_rom(image, Model::Cgb)
            .unwrap();
        assert_eq!(cart.read(0x00FF), 0xBB);
        assert_eq!(cart.read(0x0150), (0x150 % 251) as u8);
        assert_eq!(cart.read(0x0200), 0xBB);
        assert_eq!(cart.read(0x08FF), 0xBB);
        assert_eq!(cart.read(0x0900), (0x900 % 251) as u8);
    }

    #[test]
    fn rom_only_ignores_writes() {
        let mut cart = Cartridge::from_bytes(vec![0x12; 0x4000]).unwrap();
        cart.write(0x2000, 0x05);
        assert_eq!(cart.read(0x0000), 0x12);
        assert_eq!(cart.read(0x4000), 0xFF);
        assert_eq!(cart.read(0xA000), 0x00);
    }
}
