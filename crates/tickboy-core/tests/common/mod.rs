#![allow(dead_code)]

use tickboy_core::cpu::CpuState;
use tickboy_core::{Cartridge, Config, GameBoy, Model, Sinks};

pub const ROM_SIZE: usize = 0x8000;
pub const ENTRY: u16 = 0x0100;

/// 32 KiB image filled with NOPs and `program` placed at the entry point.
pub fn rom_with(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0x00; ROM_SIZE];
    let start = usize::from(ENTRY);
    rom[start..start + program.len()].copy_from_slice(program);
    rom
}

pub fn machine_with_sinks(model: Model, program: &[u8], sinks: Sinks) -> GameBoy {
    let cartridge = Cartridge::from_bytes(rom_with(program)).expect("valid rom");
    let config = Config {
        model,
        skip_boot: true,
    };
    GameBoy::new(config, cartridge, sinks)
}

pub fn machine(model: Model, program: &[u8]) -> GameBoy {
    machine_with_sinks(model, program, Sinks::default())
}

pub fn run_ticks(gb: &mut GameBoy, ticks: u32) {
    for _ in 0..ticks {
        gb.tick().expect("cpu fault");
    }
}

/// Runs the instruction at PC to completion and returns the clocks it took.
/// Must be called on a machine-cycle boundary.
pub fn run_instruction(gb: &mut GameBoy) -> u32 {
    let mut ticks = 0;
    loop {
        gb.tick().expect("cpu fault");
        ticks += 1;
        if ticks % 4 == 0 && gb.cpu.state() == CpuState::OpCode {
            return ticks;
        }
        assert!(ticks < 64, "instruction did not finish");
    }
}

/// Runs whole instructions until PC reaches `pc`.
pub fn run_until_pc(gb: &mut GameBoy, pc: u16) {
    for _ in 0..100_000 {
        if gb.cpu.regs.pc == pc && gb.cpu.state() == CpuState::OpCode {
            return;
        }
        run_instruction(gb);
    }
    panic!("pc never reached {pc:#06x}");
}
