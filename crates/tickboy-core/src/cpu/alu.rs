//! Arithmetic and logic functions shared by the instruction table.
//!
//! Every function takes the accumulated 16-bit context value, updates the
//! flags in place and returns the new value. 8-bit functions only ever see and
//! return values below 0x100.

use super::registers::Flags;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryAlu {
    Inc8,
    Dec8,
    Inc16,
    Dec16,
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
    Daa,
    Cpl,
    Scf,
    Ccf,
}

impl UnaryAlu {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            UnaryAlu::Inc8 | UnaryAlu::Inc16 => "INC",
            UnaryAlu::Dec8 | UnaryAlu::Dec16 => "DEC",
            UnaryAlu::Rlc => "RLC",
            UnaryAlu::Rrc => "RRC",
            UnaryAlu::Rl => "RL",
            UnaryAlu::Rr => "RR",
            UnaryAlu::Sla => "SLA",
            UnaryAlu::Sra => "SRA",
            UnaryAlu::Swap => "SWAP",
            UnaryAlu::Srl => "SRL",
            UnaryAlu::Daa => "DAA",
            UnaryAlu::Cpl => "CPL",
            UnaryAlu::Scf => "SCF",
            UnaryAlu::Ccf => "CCF",
        }
    }

    /// 16-bit increments and decrements glitch OAM when they touch it.
    pub const fn is_inc_dec_16(self) -> bool {
        matches!(self, UnaryAlu::Inc16 | UnaryAlu::Dec16)
    }

    pub fn apply(self, flags: &mut Flags, arg: u16) -> u16 {
        let byte = arg as u8;
        match self {
            UnaryAlu::Inc8 => {
                let result = byte.wrapping_add(1);
                flags.set_z(result == 0);
                flags.set_n(false);
                flags.set_h(byte & 0x0F == 0x0F);
                result.into()
            }
            UnaryAlu::Dec8 => {
                let result = byte.wrapping_sub(1);
                flags.set_z(result == 0);
                flags.set_n(true);
                flags.set_h(byte & 0x0F == 0);
                result.into()
            }
            UnaryAlu::Inc16 => arg.wrapping_add(1),
            UnaryAlu::Dec16 => arg.wrapping_sub(1),
            UnaryAlu::Rlc => {
                flags.set_c(byte & 0x80 != 0);
                shifted(flags, byte.rotate_left(1))
            }
            UnaryAlu::Rrc => {
                flags.set_c(byte & 0x01 != 0);
                shifted(flags, byte.rotate_right(1))
            }
            UnaryAlu::Rl => {
                let result = (byte << 1) | u8::from(flags.c());
                flags.set_c(byte & 0x80 != 0);
                shifted(flags, result)
            }
            UnaryAlu::Rr => {
                let result = (byte >> 1) | (u8::from(flags.c()) << 7);
                flags.set_c(byte & 0x01 != 0);
                shifted(flags, result)
            }
            UnaryAlu::Sla => {
                flags.set_c(byte & 0x80 != 0);
                shifted(flags, byte << 1)
            }
            UnaryAlu::Sra => {
                flags.set_c(byte & 0x01 != 0);
                shifted(flags, (byte >> 1) | (byte & 0x80))
            }
            UnaryAlu::Swap => {
                flags.set_c(false);
                shifted(flags, byte.rotate_left(4))
            }
            UnaryAlu::Srl => {
                flags.set_c(byte & 0x01 != 0);
                shifted(flags, byte >> 1)
            }
            UnaryAlu::Daa => daa(flags, byte),
            UnaryAlu::Cpl => {
                flags.set_n(true);
                flags.set_h(true);
                (!byte).into()
            }
            UnaryAlu::Scf => {
                flags.set_n(false);
                flags.set_h(false);
                flags.set_c(true);
                arg
            }
            UnaryAlu::Ccf => {
                flags.set_n(false);
                flags.set_h(false);
                flags.set_c(!flags.c());
                arg
            }
        }
    }
}

fn shifted(flags: &mut Flags, result: u8) -> u16 {
    flags.set_z(result == 0);
    flags.set_n(false);
    flags.set_h(false);
    result.into()
}

// Carry is only ever set here, never cleared.
fn daa(flags: &mut Flags, arg: u8) -> u16 {
    let mut result = u16::from(arg);
    if flags.n() {
        if flags.h() {
            result = result.wrapping_sub(6) & 0xFF;
        }
        if flags.c() {
            result = result.wrapping_sub(0x60) & 0xFF;
        }
    } else {
        if flags.h() || result & 0x0F > 9 {
            result += 6;
        }
        if flags.c() || result > 0x9F {
            result += 0x60;
        }
    }
    flags.set_h(false);
    if result > 0xFF {
        flags.set_c(true);
    }
    result &= 0xFF;
    flags.set_z(result == 0);
    result
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryAlu {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
    /// ADD HL,rr
    Add16,
    /// PC plus a signed offset, flags untouched.
    AddRelative,
    /// SP plus a signed offset, flags from the low byte.
    AddSp,
    Bit,
    Res,
    Set,
}

impl BinaryAlu {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            BinaryAlu::Add | BinaryAlu::Add16 | BinaryAlu::AddRelative | BinaryAlu::AddSp => {
                "ADD"
            }
            BinaryAlu::Adc => "ADC",
            BinaryAlu::Sub => "SUB",
            BinaryAlu::Sbc => "SBC",
            BinaryAlu::And => "AND",
            BinaryAlu::Xor => "XOR",
            BinaryAlu::Or => "OR",
            BinaryAlu::Cp => "CP",
            BinaryAlu::Bit => "BIT",
            BinaryAlu::Res => "RES",
            BinaryAlu::Set => "SET",
        }
    }

    pub fn apply(self, flags: &mut Flags, a: u16, b: u16) -> u16 {
        match self {
            BinaryAlu::Add => add8(flags, a as u8, b as u8, false).into(),
            BinaryAlu::Adc => {
                let carry = flags.c();
                add8(flags, a as u8, b as u8, carry).into()
            }
            BinaryAlu::Sub => sub8(flags, a as u8, b as u8).into(),
            BinaryAlu::Sbc => {
                let carry = i32::from(flags.c());
                let res = i32::from(a as u8) - i32::from(b as u8) - carry;
                let result = (res & 0xFF) as u8;
                flags.set_z(result == 0);
                flags.set_n(true);
                flags.set_h((a as u8 ^ b as u8 ^ result) & 0x10 != 0);
                flags.set_c(res < 0);
                result.into()
            }
            BinaryAlu::And => logic(flags, a as u8 & b as u8, true),
            BinaryAlu::Xor => logic(flags, a as u8 ^ b as u8, false),
            BinaryAlu::Or => logic(flags, a as u8 | b as u8, false),
            BinaryAlu::Cp => {
                sub8(flags, a as u8, b as u8);
                a
            }
            BinaryAlu::Add16 => {
                flags.set_n(false);
                flags.set_h((a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF);
                flags.set_c(u32::from(a) + u32::from(b) > 0xFFFF);
                a.wrapping_add(b)
            }
            BinaryAlu::AddRelative => a.wrapping_add(signed(b)),
            BinaryAlu::AddSp => {
                let offset = signed(b);
                flags.set_z(false);
                flags.set_n(false);
                flags.set_c((a & 0xFF) + (offset & 0xFF) > 0xFF);
                flags.set_h((a & 0x0F) + (offset & 0x0F) > 0x0F);
                a.wrapping_add(offset)
            }
            BinaryAlu::Bit => {
                flags.set_z(a & (1 << b) == 0);
                flags.set_n(false);
                flags.set_h(true);
                a
            }
            BinaryAlu::Res => a & !(1 << b),
            BinaryAlu::Set => a | (1 << b),
        }
    }
}

fn signed(offset: u16) -> u16 {
    offset as u8 as i8 as u16
}

fn add8(flags: &mut Flags, a: u8, b: u8, carry: bool) -> u8 {
    let carry = u8::from(carry);
    let sum = u16::from(a) + u16::from(b) + u16::from(carry);
    flags.set_z(sum & 0xFF == 0);
    flags.set_n(false);
    flags.set_h((a & 0x0F) + (b & 0x0F) + carry > 0x0F);
    flags.set_c(sum > 0xFF);
    sum as u8
}

fn sub8(flags: &mut Flags, a: u8, b: u8) -> u8 {
    let result = a.wrapping_sub(b);
    flags.set_z(result == 0);
    flags.set_n(true);
    flags.set_h(b & 0x0F > a & 0x0F);
    flags.set_c(b > a);
    result
}

fn logic(flags: &mut Flags, result: u8, half_carry: bool) -> u16 {
    flags.set_z(result == 0);
    flags.set_n(false);
    flags.set_h(half_carry);
    flags.set_c(false);
    result.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daa_after_bcd_add() {
        let mut flags = Flags::default();
        let sum = BinaryAlu::Add.apply(&mut flags, 0x19, 0x28);
        assert_eq!(sum, 0x41);
        assert!(flags.h());
        assert_eq!(UnaryAlu::Daa.apply(&mut flags, sum), 0x47);
        assert!(!flags.c());
    }

    #[test]
    fn daa_carry_out() {
        let mut flags = Flags::default();
        let sum = BinaryAlu::Add.apply(&mut flags, 0x99, 0x01);
        assert_eq!(UnaryAlu::Daa.apply(&mut flags, sum), 0x00);
        assert!(flags.z());
        assert!(flags.c());
    }

    #[test]
    fn add_sp_uses_low_byte_carries() {
        let mut flags = Flags::from_bits(0xF0);
        assert_eq!(BinaryAlu::AddSp.apply(&mut flags, 0xFFF8, 0x08), 0x0000);
        assert!(!flags.z() && !flags.n());
        assert!(flags.h() && flags.c());

        let result = BinaryAlu::AddSp.apply(&mut flags, 0x0005, 0xFE);
        assert_eq!(result, 0x0003);
        assert!(flags.h() && flags.c());
    }

    #[test]
    fn relative_jump_goes_backwards() {
        let mut flags = Flags::default();
        assert_eq!(BinaryAlu::AddRelative.apply(&mut flags, 0x0200, 0xFE), 0x01FE);
        assert_eq!(flags, Flags::default());
    }

    #[test]
    fn sbc_borrows() {
        let mut flags = Flags::default();
        flags.set_c(true);
        assert_eq!(BinaryAlu::Sbc.apply(&mut flags, 0x10, 0x0F), 0x00);
        assert!(flags.z() && flags.n() && flags.h());
        assert!(!flags.c());
        flags.set_c(true);
        assert_eq!(BinaryAlu::Sbc.apply(&mut flags, 0x00, 0x00), 0xFF);
        assert!(flags.c());
    }

    #[test]
    fn swap_and_bit() {
        let mut flags = Flags::from_bits(0x10);
        assert_eq!(UnaryAlu::Swap.apply(&mut flags, 0xA5), 0x5A);
        assert!(!flags.c());
        BinaryAlu::Bit.apply(&mut flags, 0x80, 7);
        assert!(!flags.z() && flags.h());
        BinaryAlu::Bit.apply(&mut flags, 0x80, 6);
        assert!(flags.z());
        assert_eq!(BinaryAlu::Res.apply(&mut flags, 0xFF, 0), 0xFE);
        assert_eq!(BinaryAlu::Set.apply(&mut flags, 0x00, 3), 0x08);
    }
}
