use std::fmt;

use super::alu::{BinaryAlu, UnaryAlu};
use super::operand::{Operand, word};
use super::registers::{Flags, Registers};
use crate::gpu::sprite_bug::OamCorruption;
use crate::interrupts::Interrupts;
use crate::mmu::Mmu;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    NZ,
    Z,
    NC,
    C,
}

impl Condition {
    pub const ALL: [Condition; 4] = [Condition::NZ, Condition::Z, Condition::NC, Condition::C];

    pub const fn holds(self, flags: Flags) -> bool {
        match self {
            Condition::NZ => !flags.z(),
            Condition::Z => flags.z(),
            Condition::NC => !flags.c(),
            Condition::C => flags.c(),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Condition::NZ => "NZ",
            Condition::Z => "Z",
            Condition::NC => "NC",
            Condition::C => "C",
        }
    }
}

/// One step of an instruction.
///
/// Steps pass a 16-bit context value along: loads produce it, ALU steps
/// transform it and stores consume it. A step that touches the bus costs one
/// machine cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Load(Operand),
    LoadWord(u16),
    Store(Operand),
    /// Low byte of the context to `(a16)`.
    StoreLsb,
    /// High byte of the context to `(a16 + 1)`.
    StoreMsb,
    Alu(UnaryAlu),
    AluImmediate(BinaryAlu, u8),
    AluOperand(BinaryAlu, Operand),
    /// HL update of `LD (HL+)`/`LD (HL-)`.
    AluHl(UnaryAlu),
    PopLsb,
    PopMsb,
    PushMsb,
    PushLsb,
    ProceedIf(Condition),
    BitHl(u8),
    ClearZ,
    SwitchInterrupts { enable: bool, with_delay: bool },
    /// Internal delay that occupies a machine cycle.
    ExtraCycle,
    /// Ends the current machine cycle without touching the bus.
    ForceFinish,
}

const OAM_AREA: std::ops::RangeInclusive<u16> = 0xFE00..=0xFEFF;

impl Operation {
    pub fn reads_memory(self) -> bool {
        match self {
            Operation::Load(operand) | Operation::AluOperand(_, operand) => {
                operand.accesses_memory()
            }
            Operation::PopLsb | Operation::PopMsb | Operation::BitHl(_) | Operation::ExtraCycle => {
                true
            }
            _ => false,
        }
    }

    pub fn writes_memory(self) -> bool {
        match self {
            Operation::Store(operand) => operand.accesses_memory(),
            Operation::StoreLsb | Operation::StoreMsb | Operation::PushMsb | Operation::PushLsb => {
                true
            }
            _ => false,
        }
    }

    pub fn touches_memory(self) -> bool {
        self.reads_memory() || self.writes_memory()
    }

    pub fn forces_finish(self) -> bool {
        matches!(self, Operation::ForceFinish)
    }

    /// Number of immediate bytes this step consumes.
    pub fn operand_bytes(self) -> usize {
        match self {
            Operation::Load(operand)
            | Operation::Store(operand)
            | Operation::AluOperand(_, operand) => operand.operand_bytes(),
            Operation::StoreLsb | Operation::StoreMsb => Operand::A16Ind.operand_bytes(),
            _ => 0,
        }
    }

    pub fn should_proceed(self, regs: &Registers) -> bool {
        match self {
            Operation::ProceedIf(condition) => condition.holds(regs.flags),
            _ => true,
        }
    }

    /// Sprite table corruption this step would trigger, judged before it runs.
    pub fn causes_oam_bug(self, regs: &Registers, context: u16) -> Option<OamCorruption> {
        match self {
            Operation::Alu(func) if func.is_inc_dec_16() && OAM_AREA.contains(&context) => {
                Some(OamCorruption::IncDec)
            }
            Operation::AluHl(func) if func.is_inc_dec_16() && OAM_AREA.contains(&context) => {
                Some(OamCorruption::LdHl)
            }
            Operation::PopLsb if OAM_AREA.contains(&regs.sp) => Some(OamCorruption::Pop1),
            Operation::PopMsb if OAM_AREA.contains(&regs.sp) => Some(OamCorruption::Pop2),
            Operation::PushMsb if OAM_AREA.contains(&regs.sp) => Some(OamCorruption::Push1),
            Operation::PushLsb if OAM_AREA.contains(&regs.sp) => Some(OamCorruption::Push2),
            _ => None,
        }
    }

    pub fn execute(self, regs: &mut Registers, mmu: &mut Mmu, args: &[u8], context: u16) -> u16 {
        match self {
            Operation::Load(operand) => operand.read(regs, mmu, args),
            Operation::LoadWord(value) => value,
            Operation::Store(operand) => {
                operand.write(regs, mmu, args, context);
                context
            }
            Operation::StoreLsb => {
                mmu.write_byte(word(args), context as u8);
                context
            }
            Operation::StoreMsb => {
                mmu.write_byte(word(args).wrapping_add(1), (context >> 8) as u8);
                context
            }
            Operation::Alu(func) | Operation::AluHl(func) => func.apply(&mut regs.flags, context),
            Operation::AluImmediate(func, value) => {
                func.apply(&mut regs.flags, context, value.into())
            }
            Operation::AluOperand(func, operand) => {
                let value = operand.read(regs, mmu, args);
                func.apply(&mut regs.flags, context, value)
            }
            Operation::PopLsb => {
                let lsb = mmu.read_byte(regs.sp);
                regs.inc_sp();
                lsb.into()
            }
            Operation::PopMsb => {
                let msb = mmu.read_byte(regs.sp);
                regs.inc_sp();
                context | u16::from(msb) << 8
            }
            Operation::PushMsb => {
                regs.dec_sp();
                mmu.write_byte(regs.sp, (context >> 8) as u8);
                context
            }
            Operation::PushLsb => {
                regs.dec_sp();
                mmu.write_byte(regs.sp, context as u8);
                context
            }
            Operation::BitHl(bit) => {
                let value = mmu.read_byte(regs.hl());
                regs.flags.set_n(false);
                regs.flags.set_h(true);
                if bit < 8 {
                    regs.flags.set_z(value & (1 << bit) == 0);
                }
                context
            }
            Operation::ClearZ => {
                regs.flags.set_z(false);
                context
            }
            Operation::ProceedIf(_)
            | Operation::SwitchInterrupts { .. }
            | Operation::ExtraCycle
            | Operation::ForceFinish => context,
        }
    }

    pub fn switch_interrupts(self, interrupts: &mut Interrupts) {
        if let Operation::SwitchInterrupts { enable, with_delay } = self {
            if enable {
                interrupts.enable_interrupts(with_delay);
            } else {
                interrupts.disable_interrupts(with_delay);
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Operation::Load(operand) => write!(f, "{} -> [ctx]", operand.label()),
            Operation::LoadWord(value) => write!(f, "{value:#06x} -> [ctx]"),
            Operation::Store(operand) => write!(f, "[ctx] -> {}", operand.label()),
            Operation::StoreLsb => f.write_str("[ _] -> (a16)"),
            Operation::StoreMsb => f.write_str("[_ ] -> (a16)"),
            Operation::Alu(func) => write!(f, "{}([ctx])", func.mnemonic()),
            Operation::AluImmediate(func, value) => write!(f, "{}({value},[ctx])", func.mnemonic()),
            Operation::AluOperand(func, operand) => {
                write!(f, "{}([ctx],{})", func.mnemonic(), operand.label())
            }
            Operation::AluHl(func) => write!(f, "{}(HL)", func.mnemonic()),
            Operation::PopLsb => f.write_str("(SP++) -> [ _]"),
            Operation::PopMsb => f.write_str("(SP++) -> [_ ]"),
            Operation::PushMsb => f.write_str("[_ ] -> (--SP)"),
            Operation::PushLsb => f.write_str("[ _] -> (--SP)"),
            Operation::ProceedIf(condition) => write!(f, "? {}:", condition.label()),
            Operation::BitHl(bit) => write!(f, "BIT({bit},HL)"),
            Operation::ClearZ => f.write_str("0 -> Z"),
            Operation::SwitchInterrupts { enable, .. } => {
                f.write_str(if enable { "enable interrupts" } else { "disable interrupts" })
            }
            Operation::ExtraCycle => f.write_str("wait cycle"),
            Operation::ForceFinish => f.write_str("finish cycle"),
        }
    }
}
