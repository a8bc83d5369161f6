use super::registers::Registers;
use crate::mmu::Mmu;

/// Width of the value an operand produces or consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    D8,
    D16,
    /// Signed 8-bit displacement.
    R8,
}

/// Source or destination of a micro-operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    AF,
    BC,
    DE,
    HL,
    SP,
    PC,
    D8,
    D16,
    R8,
    A16,
    BcInd,
    DeInd,
    HlInd,
    /// `(0xFF00 + a8)`
    A8Ind,
    A16Ind,
    /// `(0xFF00 + C)`
    CInd,
}

impl Operand {
    /// The eight operands encoded in the low three bits of most opcodes.
    pub const R8_TABLE: [Operand; 8] = [
        Operand::B,
        Operand::C,
        Operand::D,
        Operand::E,
        Operand::H,
        Operand::L,
        Operand::HlInd,
        Operand::A,
    ];

    pub const fn data_type(self) -> DataType {
        match self {
            Operand::AF
            | Operand::BC
            | Operand::DE
            | Operand::HL
            | Operand::SP
            | Operand::PC
            | Operand::D16
            | Operand::A16 => DataType::D16,
            Operand::R8 => DataType::R8,
            _ => DataType::D8,
        }
    }

    /// Number of immediate bytes following the opcode.
    pub const fn operand_bytes(self) -> usize {
        match self {
            Operand::D8 | Operand::R8 | Operand::A8Ind => 1,
            Operand::D16 | Operand::A16 | Operand::A16Ind => 2,
            _ => 0,
        }
    }

    pub const fn accesses_memory(self) -> bool {
        matches!(
            self,
            Operand::BcInd
                | Operand::DeInd
                | Operand::HlInd
                | Operand::A8Ind
                | Operand::A16Ind
                | Operand::CInd
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            Operand::A => "A",
            Operand::B => "B",
            Operand::C => "C",
            Operand::D => "D",
            Operand::E => "E",
            Operand::H => "H",
            Operand::L => "L",
            Operand::AF => "AF",
            Operand::BC => "BC",
            Operand::DE => "DE",
            Operand::HL => "HL",
            Operand::SP => "SP",
            Operand::PC => "PC",
            Operand::D8 => "d8",
            Operand::D16 => "d16",
            Operand::R8 => "r8",
            Operand::A16 => "a16",
            Operand::BcInd => "(BC)",
            Operand::DeInd => "(DE)",
            Operand::HlInd => "(HL)",
            Operand::A8Ind => "(a8)",
            Operand::A16Ind => "(a16)",
            Operand::CInd => "(C)",
        }
    }

    pub fn read(self, regs: &Registers, mmu: &Mmu, args: &[u8]) -> u16 {
        match self {
            Operand::A => regs.a.into(),
            Operand::B => regs.b.into(),
            Operand::C => regs.c.into(),
            Operand::D => regs.d.into(),
            Operand::E => regs.e.into(),
            Operand::H => regs.h.into(),
            Operand::L => regs.l.into(),
            Operand::AF => regs.af(),
            Operand::BC => regs.bc(),
            Operand::DE => regs.de(),
            Operand::HL => regs.hl(),
            Operand::SP => regs.sp,
            Operand::PC => regs.pc,
            Operand::D8 | Operand::R8 => args[0].into(),
            Operand::D16 | Operand::A16 => word(args),
            Operand::BcInd => mmu.read_byte(regs.bc()).into(),
            Operand::DeInd => mmu.read_byte(regs.de()).into(),
            Operand::HlInd => mmu.read_byte(regs.hl()).into(),
            Operand::A8Ind => mmu.read_byte(0xFF00 | u16::from(args[0])).into(),
            Operand::A16Ind => mmu.read_byte(word(args)).into(),
            Operand::CInd => mmu.read_byte(0xFF00 | u16::from(regs.c)).into(),
        }
    }

    /// Stores `value`. Writes to immediates are discarded.
    pub fn write(self, regs: &mut Registers, mmu: &mut Mmu, args: &[u8], value: u16) {
        let byte = value as u8;
        match self {
            Operand::A => regs.a = byte,
            Operand::B => regs.b = byte,
            Operand::C => regs.c = byte,
            Operand::D => regs.d = byte,
            Operand::E => regs.e = byte,
            Operand::H => regs.h = byte,
            Operand::L => regs.l = byte,
            Operand::AF => regs.set_af(value),
            Operand::BC => regs.set_bc(value),
            Operand::DE => regs.set_de(value),
            Operand::HL => regs.set_hl(value),
            Operand::SP => regs.sp = value,
            Operand::PC => regs.pc = value,
            Operand::D8 | Operand::R8 | Operand::D16 | Operand::A16 => {}
            Operand::BcInd => mmu.write_byte(regs.bc(), byte),
            Operand::DeInd => mmu.write_byte(regs.de(), byte),
            Operand::HlInd => mmu.write_byte(regs.hl(), byte),
            Operand::A8Ind => mmu.write_byte(0xFF00 | u16::from(args[0]), byte),
            Operand::A16Ind => mmu.write_byte(word(args), byte),
            Operand::CInd => mmu.write_byte(0xFF00 | u16::from(regs.c), byte),
        }
    }
}

/// Little-endian word from the two immediate bytes.
pub(crate) fn word(args: &[u8]) -> u16 {
    u16::from_le_bytes([args[0], args[1]])
}
