use crate::address_space::{AddressSpace, Ram};
use crate::hardware::Model;

pub const SVBK_ADDR: u16 = 0xFF70;
const WRAM_BANK_START: u16 = 0xD000;
const WRAM_BANK_SIZE: usize = 0x1000;
const CGB_SWITCHABLE_BANKS: usize = 7;

/// Work RAM at 0xD000-0xDFFF plus SVBK. CGB switches between banks 1-7;
/// DMG has a single fixed bank.
#[derive(Debug)]
pub struct WramBanks {
    banks: Vec<Ram>,
    svbk: u8,
    cgb: bool,
}

impl WramBanks {
    pub fn new(model: Model) -> Self {
        let count = if model.is_cgb() { CGB_SWITCHABLE_BANKS } else { 1 };
        Self {
            banks: (0..count)
                .map(|_| Ram::new(WRAM_BANK_START, WRAM_BANK_SIZE))
                .collect(),
            svbk: 0,
            cgb: model.is_cgb(),
        }
    }

    /// Selected bank number, 1-7.
    pub fn bank(&self) -> usize {
        usize::from((self.svbk & 0x07).max(1))
    }

    fn current(&self) -> &Ram {
        &self.banks[(self.bank() - 1).min(self.banks.len() - 1)]
    }

    fn current_mut(&mut self) -> &mut Ram {
        let idx = (self.bank() - 1).min(self.banks.len() - 1);
        &mut self.banks[idx]
    }
}

impl AddressSpace for WramBanks {
    fn accepts(&self, addr: u16) -> bool {
        (self.cgb && addr == SVBK_ADDR) || self.current().accepts(addr)
    }

    fn read(&self, addr: u16) -> u8 {
        if addr == SVBK_ADDR {
            return self.svbk | 0xF8;
        }
        self.current().read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        if addr == SVBK_ADDR {
            self.svbk = value & 0x07;
            return;
        }
        self.current_mut().write(addr, value);
    }
}

/// Undocumented CGB registers 0xFF6C and 0xFF72-0xFF77.
#[derive(Debug)]
pub struct UndocumentedRegisters {
    ff6c: u8,
    ff72: u8,
    ff73: u8,
    ff74: u8,
    ff75: u8,
    ff76: u8,
    ff77: u8,
}

impl UndocumentedRegisters {
    pub fn new() -> Self {
        Self {
            ff6c: 0xFE,
            ff72: 0x00,
            ff73: 0x00,
            ff74: 0xFF,
            ff75: 0x8F,
            ff76: 0x00,
            ff77: 0x00,
        }
    }
}

impl Default for UndocumentedRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace for UndocumentedRegisters {
    fn accepts(&self, addr: u16) -> bool {
        addr == 0xFF6C || (0xFF72..=0xFF77).contains(&addr)
    }

    fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF6C => self.ff6c,
            0xFF72 => self.ff72,
            0xFF73 => self.ff73,
            0xFF74 => self.ff74,
            0xFF75 => self.ff75,
            0xFF76 => self.ff76,
            0xFF77 => self.ff77,
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0xFF6C => self.ff6c = 0xFE | (value & 0x01),
            0xFF72 => self.ff72 = value,
            0xFF73 => self.ff73 = value,
            0xFF74 => self.ff74 = value,
            0xFF75 => self.ff75 = 0x8F | (value & 0x70),
            // read-only
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_zero_selects_bank_one() {
        let mut wram = WramBanks::new(Model::Cgb);
        wram.write(0xD000, 0x11);
        wram.write(SVBK_ADDR, 0x03);
        assert_eq!(wram.bank(), 3);
        assert_eq!(wram.read(0xD000), 0x00);
        wram.write(0xD000, 0x33);
        wram.write(SVBK_ADDR, 0x00);
        assert_eq!(wram.bank(), 1);
        assert_eq!(wram.read(0xD000), 0x11);
        assert_eq!(wram.read(SVBK_ADDR), 0xF8);
        wram.write(SVBK_ADDR, 0x0B);
        assert_eq!(wram.read(0xD000), 0x33);
    }

    #[test]
    fn dmg_has_one_bank_and_no_svbk() {
        let wram = WramBanks::new(Model::Dmg);
        assert!(!wram.accepts(SVBK_ADDR));
        assert!(wram.accepts(0xDFFF));
    }

    #[test]
    fn undocumented_register_masks() {
        let mut regs = UndocumentedRegisters::new();
        assert_eq!(regs.read(0xFF6C), 0xFE);
        assert_eq!(regs.read(0xFF74), 0xFF);
        regs.write(0xFF6C, 0x03);
        regs.write(0xFF75, 0xFF);
        regs.write(0xFF76, 0x12);
        regs.write(0xFF72, 0x34);
        assert_eq!(regs.read(0xFF6C), 0xFF);
        assert_eq!(regs.read(0xFF75), 0xFF);
        assert_eq!(regs.read(0xFF76), 0x00);
        assert_eq!(regs.read(0xFF72), 0x34);
    }
}
