mod common;

use common::{ENTRY, machine, run_instruction, run_ticks};
use tickboy_core::Model;
use tickboy_core::cpu::alu::{BinaryAlu, UnaryAlu};
use tickboy_core::cpu::opcodes::instruction_set;
use tickboy_core::cpu::registers::Flags;

const Z: u8 = 0x80;
const N: u8 = 0x40;
const H: u8 = 0x20;
const C: u8 = 0x10;

#[test]
fn load_then_add_immediate() {
    let mut gb = machine(Model::Dmg, &[0x3E, 0x05, 0xC6, 0x03]);
    assert_eq!(run_instruction(&mut gb), 8);
    assert_eq!(gb.cpu.regs.a, 0x05);
    assert_eq!(run_instruction(&mut gb), 8);
    assert_eq!(gb.cpu.regs.a, 0x08);
    assert_eq!(gb.cpu.regs.flags.bits(), 0);
    assert_eq!(gb.cpu.regs.pc, ENTRY + 4);
}

#[test]
fn add_and_sub_flags_for_every_operand_pair() {
    for a in 0..=0xFFu8 {
        for b in 0..=0xFFu8 {
            let mut flags = Flags::default();
            let sum = BinaryAlu::Add.apply(&mut flags, a.into(), b.into());
            let wide = u16::from(a) + u16::from(b);
            assert_eq!(sum, wide & 0xFF, "{a:02X}+{b:02X}");
            assert_eq!(flags.z(), wide & 0xFF == 0);
            assert!(!flags.n());
            assert_eq!(flags.h(), (a & 0x0F) + (b & 0x0F) > 0x0F);
            assert_eq!(flags.c(), wide > 0xFF);

            let mut flags = Flags::default();
            let diff = BinaryAlu::Sub.apply(&mut flags, a.into(), b.into());
            assert_eq!(diff, u16::from(a.wrapping_sub(b)), "{a:02X}-{b:02X}");
            assert_eq!(flags.z(), a == b);
            assert!(flags.n());
            assert_eq!(flags.h(), a & 0x0F < b & 0x0F);
            assert_eq!(flags.c(), a < b);
        }
    }
}

#[test]
fn adc_and_sbc_consume_carry() {
    let mut flags = Flags::from_bits(C);
    assert_eq!(BinaryAlu::Adc.apply(&mut flags, 0x0F, 0x00), 0x10);
    assert_eq!(flags.bits(), H);

    let mut flags = Flags::from_bits(C);
    assert_eq!(BinaryAlu::Sbc.apply(&mut flags, 0x00, 0x00), 0xFF);
    assert_eq!(flags.bits(), N | H | C);
}

#[test]
fn inc_dec_keep_carry() {
    // SCF; LD A,0xFF; INC A; DEC A
    let mut gb = machine(Model::Dmg, &[0x37, 0x3E, 0xFF, 0x3C, 0x3D]);
    for _ in 0..3 {
        run_instruction(&mut gb);
    }
    assert_eq!(gb.cpu.regs.a, 0x00);
    assert_eq!(gb.cpu.regs.flags.bits(), Z | H | C);
    run_instruction(&mut gb);
    assert_eq!(gb.cpu.regs.a, 0xFF);
    assert_eq!(gb.cpu.regs.flags.bits(), N | H | C);

    let mut flags = Flags::default();
    assert_eq!(UnaryAlu::Inc16.apply(&mut flags, 0xFFFF), 0x0000);
    assert_eq!(flags, Flags::default());
}

#[test]
fn push_pop_round_trip_through_stack() {
    // LD BC,0x1234; PUSH BC; POP DE
    let mut gb = machine(Model::Dmg, &[0x01, 0x34, 0x12, 0xC5, 0xD1]);
    assert_eq!(run_instruction(&mut gb), 12);
    assert_eq!(run_instruction(&mut gb), 16);
    assert_eq!(gb.cpu.regs.sp, 0xFFFC);
    assert_eq!(gb.mmu.read_byte(0xFFFD), 0x12);
    assert_eq!(gb.mmu.read_byte(0xFFFC), 0x34);
    assert_eq!(run_instruction(&mut gb), 12);
    assert_eq!(gb.cpu.regs.de(), 0x1234);
    assert_eq!(gb.cpu.regs.sp, 0xFFFE);
}

#[test]
fn pop_af_drops_low_flag_bits() {
    // LD BC,0x12FF; PUSH BC; POP AF
    let mut gb = machine(Model::Dmg, &[0x01, 0xFF, 0x12, 0xC5, 0xF1]);
    for _ in 0..3 {
        run_instruction(&mut gb);
    }
    assert_eq!(gb.cpu.regs.af(), 0x12F0);
}

#[test]
fn call_and_ret() {
    // CALL 0x0110; ...; 0x0110: RET
    let mut program = vec![0xCD, 0x10, 0x01];
    program.resize(0x10, 0x00);
    program.push(0xC9);
    let mut gb = machine(Model::Dmg, &program);
    assert_eq!(run_instruction(&mut gb), 24);
    assert_eq!(gb.cpu.regs.pc, 0x0110);
    assert_eq!(gb.cpu.regs.sp, 0xFFFC);
    assert_eq!(run_instruction(&mut gb), 16);
    assert_eq!(gb.cpu.regs.pc, ENTRY + 3);
    assert_eq!(gb.cpu.regs.sp, 0xFFFE);
}

#[test]
fn conditional_jump_timing_follows_condition() {
    // JR NZ,+5
    let mut gb = machine(Model::Dmg, &[0x20, 0x05]);
    gb.cpu.regs.flags = Flags::from_bits(0);
    assert_eq!(run_instruction(&mut gb), 12);
    assert_eq!(gb.cpu.regs.pc, ENTRY + 7);

    let mut gb = machine(Model::Dmg, &[0x20, 0x05]);
    gb.cpu.regs.flags = Flags::from_bits(Z);
    assert_eq!(run_instruction(&mut gb), 8);
    assert_eq!(gb.cpu.regs.pc, ENTRY + 2);
}

#[test]
fn cb_prefixed_memory_operand() {
    // LD HL,0xC000; LD (HL),0x01; SET 7,(HL); BIT 7,(HL)
    let mut gb = machine(
        Model::Dmg,
        &[0x21, 0x00, 0xC0, 0x36, 0x01, 0xCB, 0xFE, 0xCB, 0x7E],
    );
    run_instruction(&mut gb);
    assert_eq!(run_instruction(&mut gb), 12);
    assert_eq!(run_instruction(&mut gb), 16);
    assert_eq!(gb.mmu.read_byte(0xC000), 0x81);
    assert_eq!(run_instruction(&mut gb), 12);
    assert!(!gb.cpu.regs.flags.z());
    assert!(gb.cpu.regs.flags.h());
}

#[test]
fn documented_cycle_costs() {
    let set = instruction_set();
    let base = [
        (0x00, 4, None),
        (0x01, 12, None),
        (0x02, 8, None),
        (0x03, 8, None),
        (0x08, 20, None),
        (0x09, 8, None),
        (0x18, 12, None),
        (0x20, 12, Some(8)),
        (0x22, 8, None),
        (0x34, 12, None),
        (0x36, 12, None),
        (0x76, 4, None),
        (0xC0, 20, Some(8)),
        (0xC1, 12, None),
        (0xC2, 16, Some(12)),
        (0xC3, 16, None),
        (0xC4, 24, Some(12)),
        (0xC5, 16, None),
        (0xC7, 16, None),
        (0xC9, 16, None),
        (0xCD, 24, None),
        (0xD9, 16, None),
        (0xE0, 12, None),
        (0xE2, 8, None),
        (0xE8, 16, None),
        (0xE9, 4, None),
        (0xEA, 16, None),
        (0xF0, 12, None),
        (0xF8, 12, None),
        (0xF9, 8, None),
        (0xFA, 16, None),
    ];
    for (opcode, cycles, not_taken) in base {
        let instruction = set.base(opcode).expect("legal opcode");
        assert_eq!(instruction.cycles(), cycles, "{instruction}");
        assert_eq!(instruction.cycles_not_taken(), not_taken, "{instruction}");
    }

    for (opcode, cycles) in [(0x00, 8), (0x06, 16), (0x46, 12), (0x86, 16), (0x7C, 8)] {
        let instruction = set.extended(opcode);
        assert_eq!(instruction.cycles(), cycles, "{instruction}");
    }
}

#[test]
fn executed_cycles_match_table() {
    for (program, opcode) in [
        (vec![0x01, 0x00, 0xC0], 0x01),
        (vec![0x08, 0x00, 0xC0], 0x08),
        (vec![0x09], 0x09),
        (vec![0xE8, 0x02], 0xE8),
        (vec![0xF8, 0x02], 0xF8),
        (vec![0xF9], 0xF9),
        (vec![0xC7], 0xC7),
        (vec![0xEA, 0x00, 0xC0], 0xEA),
    ] {
        let mut gb = machine(Model::Dmg, &program);
        let expected = instruction_set().base(opcode).map(|i| i.cycles());
        assert_eq!(Some(run_instruction(&mut gb)), expected, "{opcode:02X}");
    }
}

#[test]
fn stop_switches_speed_when_armed() {
    // LD A,1; LDH (0x4D),A; STOP
    let mut gb = machine(Model::Cgb, &[0x3E, 0x01, 0xE0, 0x4D, 0x10, 0x00]);
    run_instruction(&mut gb);
    assert_eq!(run_instruction(&mut gb), 12);
    assert_eq!(gb.mmu.read_byte(0xFF4D), 0x7F);
    assert_eq!(run_instruction(&mut gb), 8);
    assert_eq!(gb.mmu.read_byte(0xFF4D), 0xFE);
    assert_eq!(gb.mmu.speed(), 2);

    let pc = gb.cpu.regs.pc;
    run_ticks(&mut gb, 2);
    assert_eq!(gb.cpu.regs.pc, pc + 1);
}

#[test]
fn illegal_opcode_is_an_error() {
    let mut gb = machine(Model::Dmg, &[0xD3]);
    let result = (0..4).try_for_each(|_| gb.tick().map(|_| ()));
    assert!(result.is_err());
}
