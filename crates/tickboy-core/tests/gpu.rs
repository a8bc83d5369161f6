mod common;

use std::thread;

use common::{machine, machine_with_sinks, run_ticks};
use tickboy_core::display::{DMG_PALETTE, FrameBufferDisplay, SCREEN_HEIGHT, SCREEN_WIDTH};
use tickboy_core::gpu::Mode;
use tickboy_core::hardware::{TICKS_PER_FRAME, TICKS_PER_LINE};
use tickboy_core::interrupts::IF_ADDR;
use tickboy_core::{Model, Sinks};

const STAT: u16 = 0xFF41;
const LY: u16 = 0xFF44;
const LYC: u16 = 0xFF45;

#[test]
fn frame_has_one_vblank_and_154_lines() {
    let mut gb = machine(Model::Dmg, &[]);
    let mut vblank_at = Vec::new();
    let mut new_lines = 0;
    for tick in 1..=TICKS_PER_FRAME {
        match gb.tick().expect("cpu fault") {
            Some(Mode::VBlank) => vblank_at.push(tick),
            Some(Mode::OamSearch) => new_lines += 1,
            _ => {}
        }
    }
    assert_eq!(vblank_at, [144 * TICKS_PER_LINE]);
    assert_eq!(new_lines, 144);
    assert_eq!(gb.mmu.read_byte(LY), 0);
    assert_eq!(gb.mmu.gpu.mode(), Mode::OamSearch);
}

#[test]
fn line_starts_with_80_dots_of_oam_search() {
    let mut gb = machine(Model::Dmg, &[]);
    run_ticks(&mut gb, 79);
    assert_eq!(gb.mmu.read_byte(STAT) & 0x03, Mode::OamSearch as u8);
    run_ticks(&mut gb, 1);
    assert_eq!(gb.mmu.read_byte(STAT) & 0x03, Mode::PixelTransfer as u8);
    run_ticks(&mut gb, TICKS_PER_LINE - 81);
    assert_eq!(gb.mmu.read_byte(STAT) & 0x03, Mode::HBlank as u8);
    assert_eq!(gb.mmu.read_byte(LY), 0);
    run_ticks(&mut gb, 1);
    assert_eq!(gb.mmu.read_byte(LY), 1);
}

#[test]
fn ly_wraps_early_on_last_line() {
    let mut gb = machine(Model::Dmg, &[]);
    run_ticks(&mut gb, 153 * TICKS_PER_LINE + 3);
    assert_eq!(gb.mmu.read_byte(LY), 153);
    run_ticks(&mut gb, 1);
    assert_eq!(gb.mmu.read_byte(LY), 0);
    assert_eq!(gb.mmu.gpu.mode(), Mode::VBlank);
}

#[test]
fn lyc_match_raises_stat_interrupt() {
    let mut gb = machine(Model::Dmg, &[]);
    gb.mmu.write_byte(LYC, 2);
    gb.mmu.write_byte(STAT, 0x40);
    gb.mmu.write_byte(IF_ADDR, 0x00);
    run_ticks(&mut gb, 2 * TICKS_PER_LINE - 1);
    assert_eq!(gb.mmu.read_byte(IF_ADDR) & 0x02, 0);
    assert_eq!(gb.mmu.read_byte(STAT) & 0x04, 0);
    run_ticks(&mut gb, 1);
    assert_eq!(gb.mmu.read_byte(IF_ADDR) & 0x02, 0x02);
    assert_eq!(gb.mmu.read_byte(STAT) & 0x04, 0x04);
}

#[test]
fn oam_stat_source_fires_on_new_line() {
    let mut gb = machine(Model::Dmg, &[]);
    gb.mmu.write_byte(STAT, 0x20);
    gb.mmu.write_byte(IF_ADDR, 0x00);
    run_ticks(&mut gb, TICKS_PER_LINE - 1);
    assert_eq!(gb.mmu.read_byte(IF_ADDR) & 0x02, 0);
    run_ticks(&mut gb, 1);
    assert_eq!(gb.mmu.read_byte(IF_ADDR) & 0x02, 0x02);
}

#[test]
fn vblank_interrupt_once_per_frame() {
    let mut gb = machine(Model::Dmg, &[]);
    gb.mmu.write_byte(IF_ADDR, 0x00);
    run_ticks(&mut gb, 144 * TICKS_PER_LINE - 1);
    assert_eq!(gb.mmu.read_byte(IF_ADDR) & 0x01, 0);
    run_ticks(&mut gb, 1);
    assert_eq!(gb.mmu.read_byte(IF_ADDR) & 0x01, 0x01);
}

#[test]
fn finished_frame_reaches_receiver() {
    let (display, frames) = FrameBufferDisplay::new();
    let sinks = Sinks {
        display: Box::new(display),
        ..Sinks::default()
    };
    let mut gb = machine_with_sinks(Model::Dmg, &[], sinks);
    // tile 0 solid color 3, the whole background map points at it
    for addr in 0x8000..0x8010 {
        gb.mmu.write_byte(addr, 0xFF);
    }

    let emulator = thread::spawn(move || gb.run_frame());
    let frame = frames.recv().expect("frame");
    emulator.join().expect("emulator thread").expect("cpu fault");

    assert_eq!(frame.len(), SCREEN_WIDTH * SCREEN_HEIGHT);
    assert!(frame.iter().all(|&rgb| rgb == DMG_PALETTE[3]));
}

#[test]
fn lcd_off_hands_over_blank_frame() {
    let (display, frames) = FrameBufferDisplay::new();
    let sinks = Sinks {
        display: Box::new(display),
        ..Sinks::default()
    };
    let mut gb = machine_with_sinks(Model::Dmg, &[], sinks);
    gb.mmu.write_byte(0xFF40, 0x11);
    gb.step().expect("cpu fault");
    let frame = frames.try_recv().expect("blank frame");
    assert!(frame.iter().all(|&rgb| rgb == DMG_PALETTE[0]));
    assert!(!gb.mmu.gpu.display().enabled());
}
