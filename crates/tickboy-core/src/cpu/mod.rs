//! SM83 core stepped one clock at a time.
//!
//! Instructions are decoded into operation lists (see [`opcodes`]) and run as
//! a state machine: every bus access ends the current machine cycle, so the
//! cycle cost of each instruction follows from its operation list.

pub mod alu;
pub mod opcodes;
pub mod operand;
pub mod operation;
pub mod registers;

use log::{debug, trace};

use crate::error::CoreError;
use crate::interrupts::{IE_ADDR, IF_ADDR, Interrupt};
use crate::mmu::Mmu;

use opcodes::{Instruction, OPCODE_HALT, OPCODE_STOP, PREFIX_CB, instruction_set};
use registers::Registers;

/// Clocks per machine cycle at normal speed.
const CLOCKS_PER_CYCLE: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpuState {
    OpCode,
    ExtendedOpCode,
    Operands,
    Running,
    IrqReadIf,
    IrqReadIe,
    IrqPushMsb,
    IrqPushLsb,
    IrqJump,
    Stopped,
    Halted,
}

pub struct Cpu {
    pub regs: Registers,
    state: CpuState,
    instruction: Option<&'static Instruction>,
    opcode: u8,
    operand: [u8; 2],
    operand_index: usize,
    op_index: usize,
    context: u16,
    halt_bug: bool,
    clock_cycle: u32,
    interrupt_flags: u8,
    requested_irq: Option<Interrupt>,
}

impl Cpu {
    pub fn new(regs: Registers) -> Self {
        Self {
            regs,
            state: CpuState::OpCode,
            instruction: None,
            opcode: 0,
            operand: [0; 2],
            operand_index: 0,
            op_index: 0,
            context: 0,
            halt_bug: false,
            clock_cycle: 0,
            interrupt_flags: 0,
            requested_irq: None,
        }
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    /// Instruction currently being executed, if one has been decoded.
    pub fn instruction(&self) -> Option<&'static Instruction> {
        self.instruction
    }

    fn clear_state(&mut self) {
        self.instruction = None;
        self.opcode = 0;
        self.operand = [0; 2];
        self.operand_index = 0;
        self.op_index = 0;
        self.context = 0;
    }

    /// Advances one clock. Work happens on the last clock of each machine
    /// cycle.
    pub fn tick(&mut self, mmu: &mut Mmu) -> Result<(), CoreError> {
        self.clock_cycle += 1;
        if self.clock_cycle < CLOCKS_PER_CYCLE / mmu.speed() {
            return Ok(());
        }
        self.clock_cycle = 0;

        if matches!(
            self.state,
            CpuState::OpCode | CpuState::Halted | CpuState::Stopped
        ) && mmu.interrupts.ime()
            && mmu.interrupts.is_requested()
        {
            if self.state == CpuState::Stopped {
                mmu.gpu.display_mut().set_enabled(true);
            }
            self.state = CpuState::IrqReadIf;
        }

        match self.state {
            CpuState::IrqReadIf
            | CpuState::IrqReadIe
            | CpuState::IrqPushMsb
            | CpuState::IrqPushLsb
            | CpuState::IrqJump => {
                self.handle_interrupt(mmu);
                return Ok(());
            }
            CpuState::Halted if mmu.interrupts.is_requested() => {
                self.state = CpuState::OpCode;
            }
            CpuState::Halted | CpuState::Stopped => return Ok(()),
            _ => {}
        }

        let mut accessed = false;
        loop {
            match self.state {
                CpuState::OpCode => {
                    self.clear_state();
                    let pc = self.regs.pc;
                    self.opcode = mmu.read_byte(pc);
                    accessed = true;
                    match self.opcode {
                        PREFIX_CB => self.state = CpuState::ExtendedOpCode,
                        OPCODE_STOP => {
                            self.instruction = instruction_set().base(OPCODE_STOP);
                            self.state = CpuState::ExtendedOpCode;
                        }
                        opcode => {
                            let instruction = instruction_set()
                                .base(opcode)
                                .ok_or(CoreError::InvalidOpcode { opcode, pc })?;
                            self.instruction = Some(instruction);
                            self.state = CpuState::Operands;
                        }
                    }
                    if self.halt_bug {
                        self.halt_bug = false;
                    } else {
                        self.regs.inc_pc();
                    }
                }
                CpuState::ExtendedOpCode => {
                    if accessed {
                        return Ok(());
                    }
                    accessed = true;
                    let opcode = mmu.read_byte(self.regs.pc);
                    if self.instruction.is_none() {
                        self.instruction = Some(instruction_set().extended(opcode));
                    }
                    self.regs.inc_pc();
                    self.state = CpuState::Operands;
                }
                CpuState::Operands => {
                    let wanted = self.instruction.map_or(0, |i| i.operand_bytes);
                    while self.operand_index < wanted {
                        if accessed {
                            return Ok(());
                        }
                        accessed = true;
                        self.operand[self.operand_index] = mmu.read_byte(self.regs.pc);
                        self.operand_index += 1;
                        self.regs.inc_pc();
                    }
                    #[cfg(feature = "cpu-trace")]
                    if let Some(instruction) = self.instruction {
                        eprintln!("[CPU] {instruction} {}", self.regs);
                    }
                    self.state = CpuState::Running;
                }
                CpuState::Running => {
                    if self.opcode == OPCODE_STOP {
                        if mmu.speed_mode.on_cpu_stopped() {
                            self.state = CpuState::OpCode;
                        } else {
                            debug!("STOP at {:#06x}", self.regs.pc);
                            self.state = CpuState::Stopped;
                            mmu.gpu.display_mut().set_enabled(false);
                        }
                        return Ok(());
                    }
                    if self.opcode == OPCODE_HALT {
                        if mmu.interrupts.has_halt_bug_condition() {
                            self.state = CpuState::OpCode;
                            self.halt_bug = true;
                        } else {
                            self.state = CpuState::Halted;
                        }
                        return Ok(());
                    }

                    let ops = self.instruction.map_or(&[][..], |i| i.ops.as_slice());
                    if let Some(&op) = ops.get(self.op_index) {
                        let touches_memory = op.touches_memory();
                        if accessed && touches_memory {
                            return Ok(());
                        }
                        self.op_index += 1;
                        if let Some(kind) = op.causes_oam_bug(&self.regs, self.context) {
                            mmu.corrupt_oam(kind);
                        }
                        self.context = op.execute(&mut self.regs, mmu, &self.operand, self.context);
                        op.switch_interrupts(&mut mmu.interrupts);
                        if !op.should_proceed(&self.regs) {
                            self.op_index = ops.len();
                            continue;
                        }
                        if op.forces_finish() {
                            return Ok(());
                        }
                        if touches_memory {
                            accessed = true;
                        }
                    }
                    if self.op_index >= ops.len() {
                        self.state = CpuState::OpCode;
                        self.operand_index = 0;
                        mmu.interrupts.on_instruction_finished();
                        return Ok(());
                    }
                }
                CpuState::IrqReadIf
                | CpuState::IrqReadIe
                | CpuState::IrqPushMsb
                | CpuState::IrqPushLsb
                | CpuState::IrqJump
                | CpuState::Halted
                | CpuState::Stopped => return Ok(()),
            }
        }
    }

    fn handle_interrupt(&mut self, mmu: &mut Mmu) {
        match self.state {
            CpuState::IrqReadIf => {
                self.interrupt_flags = mmu.read_byte(IF_ADDR);
                self.state = CpuState::IrqReadIe;
            }
            CpuState::IrqReadIe => {
                let enabled = mmu.read_byte(IE_ADDR);
                self.requested_irq = Interrupt::highest_priority(self.interrupt_flags & enabled);
                match self.requested_irq {
                    Some(irq) => {
                        mmu.interrupts.clear(irq);
                        mmu.interrupts.disable_interrupts(false);
                        self.state = CpuState::IrqPushMsb;
                    }
                    None => self.state = CpuState::OpCode,
                }
            }
            CpuState::IrqPushMsb => {
                self.regs.dec_sp();
                mmu.write_byte(self.regs.sp, (self.regs.pc >> 8) as u8);
                self.state = CpuState::IrqPushLsb;
            }
            CpuState::IrqPushLsb => {
                self.regs.dec_sp();
                mmu.write_byte(self.regs.sp, self.regs.pc as u8);
                self.state = CpuState::IrqJump;
            }
            CpuState::IrqJump => {
                if let Some(irq) = self.requested_irq.take() {
                    trace!("dispatch {irq:?} from {:#06x}", self.regs.pc);
                    self.regs.pc = irq.vector();
                }
                self.state = CpuState::OpCode;
            }
            _ => {}
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(Registers::default())
    }
}
