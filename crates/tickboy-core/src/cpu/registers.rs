use std::fmt;

use crate::hardware::Model;

// CPU flag bits as documented in gbdev.io/pandocs/The_CPU_Flags.html
const FLAG_Z: u8 = 0x80; // Zero
const FLAG_N: u8 = 0x40; // Subtract
const FLAG_H: u8 = 0x20; // Half Carry
const FLAG_C: u8 = 0x10; // Carry

// Post-boot register state (gbdev.io/pandocs/Power_Up_State.html)
const BOOT_AF: u16 = 0x01B0;
const BOOT_CGB_A: u8 = 0x11;
const BOOT_BC: u16 = 0x0013;
const BOOT_DE: u16 = 0x00D8;
const BOOT_HL: u16 = 0x014D;
const BOOT_SP: u16 = 0xFFFE;
const BOOT_PC: u16 = 0x0100;

/// The F register. The low nibble is hard-wired to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0xF0)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn z(self) -> bool {
        self.0 & FLAG_Z != 0
    }

    #[inline]
    pub const fn n(self) -> bool {
        self.0 & FLAG_N != 0
    }

    #[inline]
    pub const fn h(self) -> bool {
        self.0 & FLAG_H != 0
    }

    #[inline]
    pub const fn c(self) -> bool {
        self.0 & FLAG_C != 0
    }

    pub fn set_z(&mut self, on: bool) {
        self.set(FLAG_Z, on);
    }

    pub fn set_n(&mut self, on: bool) {
        self.set(FLAG_N, on);
    }

    pub fn set_h(&mut self, on: bool) {
        self.set(FLAG_H, on);
    }

    pub fn set_c(&mut self, on: bool) {
        self.set(FLAG_C, on);
    }

    fn set(&mut self, mask: u8, on: bool) {
        if on {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bit = |set: bool, name: char| if set { name } else { '-' };
        write!(
            f,
            "{}{}{}{}",
            bit(self.z(), 'Z'),
            bit(self.n(), 'N'),
            bit(self.h(), 'H'),
            bit(self.c(), 'C')
        )
    }
}

/// CPU register file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub flags: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    /// Register contents right after the boot ROM hands over to the cartridge.
    pub fn post_boot(model: Model) -> Self {
        let mut regs = Self::default();
        regs.set_af(BOOT_AF);
        if model.is_cgb() {
            regs.a = BOOT_CGB_A;
        }
        regs.set_bc(BOOT_BC);
        regs.set_de(BOOT_DE);
        regs.set_hl(BOOT_HL);
        regs.sp = BOOT_SP;
        regs.pc = BOOT_PC;
        regs
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.flags.bits()])
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    pub fn set_af(&mut self, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.a = hi;
        self.flags = Flags::from_bits(lo);
    }

    pub fn set_bc(&mut self, value: u16) {
        [self.b, self.c] = value.to_be_bytes();
    }

    pub fn set_de(&mut self, value: u16) {
        [self.d, self.e] = value.to_be_bytes();
    }

    pub fn set_hl(&mut self, value: u16) {
        [self.h, self.l] = value.to_be_bytes();
    }

    pub fn inc_pc(&mut self) {
        self.pc = self.pc.wrapping_add(1);
    }

    pub fn inc_sp(&mut self) {
        self.sp = self.sp.wrapping_add(1);
    }

    pub fn dec_sp(&mut self) {
        self.sp = self.sp.wrapping_sub(1);
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AF={:04x} BC={:04x} DE={:04x} HL={:04x} SP={:04x} PC={:04x} {}",
            self.af(),
            self.bc(),
            self.de(),
            self.hl(),
            self.sp,
            self.pc,
            self.flags
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_low_nibble_reads_zero() {
        let mut regs = Registers::default();
        regs.set_af(0x12FF);
        assert_eq!(regs.af(), 0x12F0);
        assert!(regs.flags.z() && regs.flags.n() && regs.flags.h() && regs.flags.c());
    }

    #[test]
    fn pairs_compose() {
        let mut regs = Registers::default();
        regs.set_bc(0xBEEF);
        regs.set_hl(0x1234);
        assert_eq!((regs.b, regs.c), (0xBE, 0xEF));
        assert_eq!((regs.h, regs.l), (0x12, 0x34));
        regs.e = 0x99;
        assert_eq!(regs.de(), 0x0099);
    }

    #[test]
    fn post_boot_state() {
        let dmg = Registers::post_boot(Model::Dmg);
        assert_eq!(dmg.af(), 0x01B0);
        assert_eq!(dmg.pc, 0x0100);
        assert_eq!(dmg.sp, 0xFFFE);
        let cgb = Registers::post_boot(Model::Cgb);
        assert_eq!(cgb.a, 0x11);
        assert_eq!(format!("{}", cgb.flags), "Z-HC");
    }
}
