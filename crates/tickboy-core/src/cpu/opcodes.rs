//! Instruction table.
//!
//! Every opcode is compiled once into a list of [`Operation`]s. The processor
//! walks that list, spending one machine cycle per bus access, so cycle costs
//! fall out of the list itself.

use std::fmt;
use std::sync::OnceLock;

use super::alu::{BinaryAlu, UnaryAlu};
use super::operand::{DataType, Operand};
use super::operation::{Condition, Operation};

pub const PREFIX_CB: u8 = 0xCB;
pub const OPCODE_STOP: u8 = 0x10;
pub const OPCODE_HALT: u8 = 0x76;

#[derive(Clone, Debug)]
pub struct Instruction {
    pub opcode: u8,
    /// Decoded from the 0xCB page.
    pub extended: bool,
    pub mnemonic: String,
    /// Immediate bytes following the opcode.
    pub operand_bytes: usize,
    pub ops: Vec<Operation>,
}

impl Instruction {
    /// Opcode bytes fetched, counting the second byte of CB-prefixed opcodes
    /// and of STOP.
    fn opcode_bytes(&self) -> u32 {
        if self.extended || self.opcode == OPCODE_STOP {
            2
        } else {
            1
        }
    }

    fn machine_cycles(&self, ops: &[Operation]) -> u32 {
        let steps = ops
            .iter()
            .filter(|op| op.touches_memory() || op.forces_finish())
            .count() as u32;
        self.opcode_bytes() + self.operand_bytes as u32 + steps
    }

    /// T-cycles taken when every step runs.
    pub fn cycles(&self) -> u32 {
        4 * self.machine_cycles(&self.ops)
    }

    /// T-cycles taken when the condition fails, for conditional instructions.
    pub fn cycles_not_taken(&self) -> Option<u32> {
        let cut = self
            .ops
            .iter()
            .position(|op| matches!(op, Operation::ProceedIf(_)))?;
        Some(4 * self.machine_cycles(&self.ops[..=cut]))
    }

    pub fn is_conditional(&self) -> bool {
        self.cycles_not_taken().is_some()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extended {
            write!(f, "CB {:02X} {}", self.opcode, self.mnemonic)
        } else {
            write!(f, "{:02X} {}", self.opcode, self.mnemonic)
        }
    }
}

/// Collects the steps of one instruction, tracking the width of the value
/// currently flowing through them.
pub struct InstructionBuilder {
    opcode: u8,
    extended: bool,
    mnemonic: String,
    ops: Vec<Operation>,
    last_type: Option<DataType>,
}

impl InstructionBuilder {
    pub fn new(opcode: u8, mnemonic: impl Into<String>) -> Self {
        Self {
            opcode,
            extended: false,
            mnemonic: mnemonic.into(),
            ops: Vec::new(),
            last_type: None,
        }
    }

    pub fn extended(opcode: u8, mnemonic: impl Into<String>) -> Self {
        Self {
            extended: true,
            ..Self::new(opcode, mnemonic)
        }
    }

    pub fn load(mut self, source: Operand) -> Self {
        self.last_type = Some(source.data_type());
        self.ops.push(Operation::Load(source));
        self
    }

    pub fn load_word(mut self, value: u16) -> Self {
        self.last_type = Some(DataType::D16);
        self.ops.push(Operation::LoadWord(value));
        self
    }

    /// Panics when the value in flight does not fit `target`; the table is
    /// static, so that can only be a defect in the table itself.
    pub fn store(mut self, target: Operand) -> Self {
        if self.last_type == Some(DataType::D16) && target == Operand::A16Ind {
            self.ops.push(Operation::StoreLsb);
            self.ops.push(Operation::StoreMsb);
        } else if self.last_type == Some(target.data_type()) {
            self.ops.push(Operation::Store(target));
        } else {
            panic!(
                "{:02X} {}: cannot store {:?} in {}",
                self.opcode,
                self.mnemonic,
                self.last_type,
                target.label()
            );
        }
        self
    }

    pub fn copy_byte(self, source: Operand, target: Operand) -> Self {
        self.load(source).store(target)
    }

    pub fn alu(mut self, func: UnaryAlu) -> Self {
        self.ops.push(Operation::Alu(func));
        self.wide_alu_delay()
    }

    pub fn alu_with(mut self, func: BinaryAlu, operand: Operand) -> Self {
        self.ops.push(Operation::AluOperand(func, operand));
        self.wide_alu_delay()
    }

    pub fn alu_immediate(mut self, func: BinaryAlu, value: u8) -> Self {
        self.ops.push(Operation::AluImmediate(func, value));
        self.wide_alu_delay()
    }

    /// `LD (HL+)`/`LD (HL-)` pointer update.
    pub fn alu_hl(self, func: UnaryAlu) -> Self {
        let mut builder = self.load(Operand::HL);
        builder.ops.push(Operation::AluHl(func));
        builder.store(Operand::HL)
    }

    pub fn push(mut self) -> Self {
        self.ops.push(Operation::PushMsb);
        self.ops.push(Operation::PushLsb);
        self
    }

    pub fn pop(mut self) -> Self {
        self.last_type = Some(DataType::D16);
        self.ops.push(Operation::PopLsb);
        self.ops.push(Operation::PopMsb);
        self
    }

    pub fn proceed_if(mut self, condition: Condition) -> Self {
        self.ops.push(Operation::ProceedIf(condition));
        self
    }

    pub fn bit_hl(mut self, bit: u8) -> Self {
        self.ops.push(Operation::BitHl(bit));
        self
    }

    pub fn clear_z(mut self) -> Self {
        self.ops.push(Operation::ClearZ);
        self
    }

    pub fn switch_interrupts(mut self, enable: bool, with_delay: bool) -> Self {
        self.ops
            .push(Operation::SwitchInterrupts { enable, with_delay });
        self
    }

    pub fn extra_cycle(mut self) -> Self {
        self.ops.push(Operation::ExtraCycle);
        self
    }

    pub fn force_finish(mut self) -> Self {
        self.ops.push(Operation::ForceFinish);
        self
    }

    pub fn build(self) -> Instruction {
        let operand_bytes = self
            .ops
            .iter()
            .map(|op| op.operand_bytes())
            .max()
            .unwrap_or(0);
        Instruction {
            opcode: self.opcode,
            extended: self.extended,
            mnemonic: self.mnemonic,
            operand_bytes,
            ops: self.ops,
        }
    }

    // 16-bit ALU results need an extra internal cycle.
    fn wide_alu_delay(self) -> Self {
        if self.last_type == Some(DataType::D16) {
            self.extra_cycle()
        } else {
            self
        }
    }
}

/// Both opcode pages.
pub struct InstructionSet {
    base: Vec<Option<Instruction>>,
    extended: Vec<Instruction>,
}

impl InstructionSet {
    pub fn base(&self, opcode: u8) -> Option<&Instruction> {
        self.base[usize::from(opcode)].as_ref()
    }

    pub fn extended(&self, opcode: u8) -> &Instruction {
        &self.extended[usize::from(opcode)]
    }

    pub fn base_instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.base.iter().flatten()
    }

    pub fn extended_instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.extended.iter()
    }
}

static INSTRUCTION_SET: OnceLock<InstructionSet> = OnceLock::new();

/// The shared instruction table, built on first use.
pub fn instruction_set() -> &'static InstructionSet {
    INSTRUCTION_SET.get_or_init(|| InstructionSet {
        base: build_base(),
        extended: build_extended(),
    })
}

const R16: [Operand; 4] = [Operand::BC, Operand::DE, Operand::HL, Operand::SP];
const R16_STACK: [Operand; 4] = [Operand::BC, Operand::DE, Operand::HL, Operand::AF];
const ALU8: [BinaryAlu; 8] = [
    BinaryAlu::Add,
    BinaryAlu::Adc,
    BinaryAlu::Sub,
    BinaryAlu::Sbc,
    BinaryAlu::And,
    BinaryAlu::Xor,
    BinaryAlu::Or,
    BinaryAlu::Cp,
];
const SHIFTS: [UnaryAlu; 8] = [
    UnaryAlu::Rlc,
    UnaryAlu::Rrc,
    UnaryAlu::Rl,
    UnaryAlu::Rr,
    UnaryAlu::Sla,
    UnaryAlu::Sra,
    UnaryAlu::Swap,
    UnaryAlu::Srl,
];

fn ld(opcode: u8, source: Operand, target: Operand) -> InstructionBuilder {
    InstructionBuilder::new(opcode, format!("LD {},{}", target.label(), source.label()))
        .copy_byte(source, target)
}

fn build_base() -> Vec<Option<Instruction>> {
    let mut table: Vec<Option<InstructionBuilder>> = (0..0x100).map(|_| None).collect();
    let mut put = |builder: InstructionBuilder| {
        let slot = usize::from(builder.opcode);
        table[slot] = Some(builder);
    };

    put(InstructionBuilder::new(0x00, "NOP"));

    for (i, &rr) in R16.iter().enumerate() {
        let row = 0x10 * i as u8;
        put(ld(0x01 + row, Operand::D16, rr));
        put(InstructionBuilder::new(0x03 + row, format!("INC {}", rr.label()))
            .load(rr)
            .alu(UnaryAlu::Inc16)
            .store(rr));
        put(InstructionBuilder::new(0x09 + row, format!("ADD HL,{}", rr.label()))
            .load(Operand::HL)
            .alu_with(BinaryAlu::Add16, rr)
            .store(Operand::HL));
        put(InstructionBuilder::new(0x0B + row, format!("DEC {}", rr.label()))
            .load(rr)
            .alu(UnaryAlu::Dec16)
            .store(rr));
    }

    put(ld(0x02, Operand::A, Operand::BcInd));
    put(ld(0x12, Operand::A, Operand::DeInd));
    put(ld(0x0A, Operand::BcInd, Operand::A));
    put(ld(0x1A, Operand::DeInd, Operand::A));

    for (i, &r) in Operand::R8_TABLE.iter().enumerate() {
        let row = 0x08 * i as u8;
        put(InstructionBuilder::new(0x04 + row, format!("INC {}", r.label()))
            .load(r)
            .alu(UnaryAlu::Inc8)
            .store(r));
        put(InstructionBuilder::new(0x05 + row, format!("DEC {}", r.label()))
            .load(r)
            .alu(UnaryAlu::Dec8)
            .store(r));
        put(ld(0x06 + row, Operand::D8, r));
    }

    for (opcode, name, func) in [
        (0x07, "RLCA", UnaryAlu::Rlc),
        (0x0F, "RRCA", UnaryAlu::Rrc),
        (0x17, "RLA", UnaryAlu::Rl),
        (0x1F, "RRA", UnaryAlu::Rr),
    ] {
        put(InstructionBuilder::new(opcode, name)
            .load(Operand::A)
            .alu(func)
            .clear_z()
            .store(Operand::A));
    }

    put(ld(0x08, Operand::SP, Operand::A16Ind));
    put(InstructionBuilder::new(OPCODE_STOP, "STOP"));

    put(InstructionBuilder::new(0x18, "JR r8")
        .load(Operand::PC)
        .alu_with(BinaryAlu::AddRelative, Operand::R8)
        .store(Operand::PC));
    for (i, &cc) in Condition::ALL.iter().enumerate() {
        put(InstructionBuilder::new(0x20 + 0x08 * i as u8, format!("JR {},r8", cc.label()))
            .load(Operand::PC)
            .proceed_if(cc)
            .alu_with(BinaryAlu::AddRelative, Operand::R8)
            .store(Operand::PC));
    }

    put(InstructionBuilder::new(0x22, "LD (HL+),A")
        .copy_byte(Operand::A, Operand::HlInd)
        .alu_hl(UnaryAlu::Inc16));
    put(InstructionBuilder::new(0x2A, "LD A,(HL+)")
        .copy_byte(Operand::HlInd, Operand::A)
        .alu_hl(UnaryAlu::Inc16));
    put(InstructionBuilder::new(0x32, "LD (HL-),A")
        .copy_byte(Operand::A, Operand::HlInd)
        .alu_hl(UnaryAlu::Dec16));
    put(InstructionBuilder::new(0x3A, "LD A,(HL-)")
        .copy_byte(Operand::HlInd, Operand::A)
        .alu_hl(UnaryAlu::Dec16));

    for (opcode, func) in [
        (0x27, UnaryAlu::Daa),
        (0x2F, UnaryAlu::Cpl),
        (0x37, UnaryAlu::Scf),
        (0x3F, UnaryAlu::Ccf),
    ] {
        put(InstructionBuilder::new(opcode, func.mnemonic())
            .load(Operand::A)
            .alu(func)
            .store(Operand::A));
    }

    for (t, &target) in Operand::R8_TABLE.iter().enumerate() {
        for (s, &source) in Operand::R8_TABLE.iter().enumerate() {
            let opcode = 0x40 + 0x08 * t as u8 + s as u8;
            if opcode != OPCODE_HALT {
                put(ld(opcode, source, target));
            }
        }
    }
    put(InstructionBuilder::new(OPCODE_HALT, "HALT"));

    for (f, &func) in ALU8.iter().enumerate() {
        for (s, &source) in Operand::R8_TABLE.iter().enumerate() {
            let opcode = 0x80 + 0x08 * f as u8 + s as u8;
            put(InstructionBuilder::new(opcode, format!("{} {}", func.mnemonic(), source.label()))
                .load(Operand::A)
                .alu_with(func, source)
                .store(Operand::A));
        }
        put(InstructionBuilder::new(0xC6 + 0x08 * f as u8, format!("{} d8", func.mnemonic()))
            .load(Operand::A)
            .alu_with(func, Operand::D8)
            .store(Operand::A));
    }

    for (i, &cc) in Condition::ALL.iter().enumerate() {
        let row = 0x08 * i as u8;
        put(InstructionBuilder::new(0xC0 + row, format!("RET {}", cc.label()))
            .extra_cycle()
            .proceed_if(cc)
            .pop()
            .force_finish()
            .store(Operand::PC));
        put(InstructionBuilder::new(0xC2 + row, format!("JP {},a16", cc.label()))
            .load(Operand::A16)
            .proceed_if(cc)
            .store(Operand::PC)
            .extra_cycle());
        put(InstructionBuilder::new(0xC4 + row, format!("CALL {},a16", cc.label()))
            .proceed_if(cc)
            .extra_cycle()
            .load(Operand::PC)
            .push()
            .load(Operand::A16)
            .store(Operand::PC));
    }

    for (i, &rr) in R16_STACK.iter().enumerate() {
        let row = 0x10 * i as u8;
        put(InstructionBuilder::new(0xC1 + row, format!("POP {}", rr.label()))
            .pop()
            .store(rr));
        put(InstructionBuilder::new(0xC5 + row, format!("PUSH {}", rr.label()))
            .extra_cycle()
            .load(rr)
            .push());
    }

    put(InstructionBuilder::new(0xC3, "JP a16")
        .load(Operand::A16)
        .store(Operand::PC)
        .extra_cycle());

    for vector in (0x00..=0x38u8).step_by(0x08) {
        put(InstructionBuilder::new(0xC7 + vector, format!("RST {vector:02X}H"))
            .load(Operand::PC)
            .push()
            .force_finish()
            .load_word(vector.into())
            .store(Operand::PC));
    }

    put(InstructionBuilder::new(0xC9, "RET")
        .pop()
        .force_finish()
        .store(Operand::PC));
    put(InstructionBuilder::new(0xCD, "CALL a16")
        .load(Operand::PC)
        .extra_cycle()
        .push()
        .load(Operand::A16)
        .store(Operand::PC));
    put(InstructionBuilder::new(0xD9, "RETI")
        .pop()
        .force_finish()
        .store(Operand::PC)
        .switch_interrupts(true, false));

    put(ld(0xE2, Operand::A, Operand::CInd));
    put(ld(0xF2, Operand::CInd, Operand::A));
    put(InstructionBuilder::new(0xE9, "JP (HL)")
        .load(Operand::HL)
        .store(Operand::PC));
    put(InstructionBuilder::new(0xE0, "LDH (a8),A").copy_byte(Operand::A, Operand::A8Ind));
    put(InstructionBuilder::new(0xF0, "LDH A,(a8)").copy_byte(Operand::A8Ind, Operand::A));

    put(InstructionBuilder::new(0xE8, "ADD SP,r8")
        .load(Operand::SP)
        .alu_with(BinaryAlu::AddSp, Operand::R8)
        .extra_cycle()
        .store(Operand::SP));
    put(InstructionBuilder::new(0xF8, "LD HL,SP+r8")
        .load(Operand::SP)
        .alu_with(BinaryAlu::AddSp, Operand::R8)
        .store(Operand::HL));

    put(ld(0xEA, Operand::A, Operand::A16Ind));
    put(ld(0xFA, Operand::A16Ind, Operand::A));

    put(InstructionBuilder::new(0xF3, "DI").switch_interrupts(false, true));
    put(InstructionBuilder::new(0xFB, "EI").switch_interrupts(true, true));
    put(ld(0xF9, Operand::HL, Operand::SP).extra_cycle());

    table
        .into_iter()
        .map(|slot| slot.map(InstructionBuilder::build))
        .collect()
}

fn build_extended() -> Vec<Instruction> {
    let mut table = Vec::with_capacity(0x100);
    for (f, &func) in SHIFTS.iter().enumerate() {
        for (r, &reg) in Operand::R8_TABLE.iter().enumerate() {
            let opcode = 0x08 * f as u8 + r as u8;
            table.push(
                InstructionBuilder::extended(opcode, format!("{} {}", func.mnemonic(), reg.label()))
                    .load(reg)
                    .alu(func)
                    .store(reg)
                    .build(),
            );
        }
    }
    for (page, func) in [BinaryAlu::Bit, BinaryAlu::Res, BinaryAlu::Set]
        .into_iter()
        .enumerate()
    {
        for bit in 0..8u8 {
            for (r, &reg) in Operand::R8_TABLE.iter().enumerate() {
                let opcode = 0x40 * (page as u8 + 1) + 0x08 * bit + r as u8;
                let name = format!("{} {bit},{}", func.mnemonic(), reg.label());
                let builder = InstructionBuilder::extended(opcode, name);
                let builder = if func == BinaryAlu::Bit && reg == Operand::HlInd {
                    builder.bit_hl(bit)
                } else {
                    builder.load(reg).alu_immediate(func, bit).store(reg)
                };
                table.push(builder.build());
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(opcode: u8) -> &'static Instruction {
        instruction_set()
            .base(opcode)
            .unwrap_or_else(|| panic!("{opcode:02X} missing"))
    }

    #[test]
    fn illegal_opcodes_are_absent() {
        let set = instruction_set();
        let illegal = [0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD];
        for opcode in 0..=0xFFu8 {
            assert_eq!(
                set.base(opcode).is_none(),
                illegal.contains(&opcode) || opcode == PREFIX_CB,
                "opcode {opcode:02X}"
            );
        }
        assert_eq!(set.extended_instructions().count(), 0x100);
    }

    #[test]
    fn extended_page_is_indexed_by_opcode() {
        let set = instruction_set();
        for opcode in 0..=0xFFu8 {
            assert_eq!(set.extended(opcode).opcode, opcode);
        }
        assert_eq!(set.extended(0x7E).ops, vec![Operation::BitHl(7)]);
        assert_eq!(set.extended(0xC7).mnemonic, "SET 0,A");
    }

    #[test]
    fn store_of_sp_to_memory_splits_bytes() {
        let ops = &base(0x08).ops;
        assert_eq!(ops[1..], [Operation::StoreLsb, Operation::StoreMsb]);
        assert_eq!(base(0x08).operand_bytes, 2);
    }

    #[test]
    #[should_panic]
    fn mismatched_store_is_rejected() {
        InstructionBuilder::new(0x00, "bogus")
            .load(Operand::HL)
            .store(Operand::A);
    }
}
