//! Register-level sound block. Channels are not synthesized; the output sink
//! is driven with silence at a fixed sample rate while the APU is powered.

use log::debug;

use crate::address_space::AddressSpace;
use crate::hardware::TICKS_PER_SEC;

pub const NR52_ADDR: u16 = 0xFF26;
const REGS_START: u16 = 0xFF10;
const WAVE_START: u16 = 0xFF30;
const WAVE_END: u16 = 0xFF3F;
const POWER: u8 = 0x80;

pub const SAMPLE_RATE: u32 = 44_100;

/// Audio sink.
pub trait SoundOutput: Send {
    fn start(&mut self);
    fn stop(&mut self);
    fn play(&mut self, left: u8, right: u8);
}

#[derive(Debug, Default)]
pub struct NullSoundOutput;

impl SoundOutput for NullSoundOutput {
    fn start(&mut self) {}

    fn stop(&mut self) {}

    fn play(&mut self, _left: u8, _right: u8) {}
}

pub struct Sound {
    regs: [u8; 0x30],
    output: Box<dyn SoundOutput>,
    sample_clock: u32,
}

impl Sound {
    pub fn new(output: Box<dyn SoundOutput>) -> Self {
        Self {
            regs: [0; 0x30],
            output,
            sample_clock: 0,
        }
    }

    pub fn is_powered(&self) -> bool {
        self.regs[usize::from(NR52_ADDR - REGS_START)] & POWER != 0
    }

    pub fn tick(&mut self) {
        if !self.is_powered() {
            return;
        }
        self.sample_clock += SAMPLE_RATE;
        if self.sample_clock >= TICKS_PER_SEC {
            self.sample_clock -= TICKS_PER_SEC;
            self.output.play(0, 0);
        }
    }

    fn read_mask(addr: u16) -> u8 {
        match addr {
            0xFF10 => 0x80,
            0xFF11 => 0x3F,
            0xFF12 => 0x00,
            0xFF13 => 0xFF,
            0xFF14 => 0xBF,
            0xFF16 => 0x3F,
            0xFF17 => 0x00,
            0xFF18 => 0xFF,
            0xFF19 => 0xBF,
            0xFF1A => 0x7F,
            0xFF1B => 0xFF,
            0xFF1C => 0x9F,
            0xFF1D => 0xFF,
            0xFF1E => 0xBF,
            0xFF20 => 0xFF,
            0xFF21 => 0x00,
            0xFF22 => 0x00,
            0xFF23 => 0xBF,
            0xFF24 => 0x00,
            0xFF25 => 0x00,
            0xFF26 => 0x70,
            WAVE_START..=WAVE_END => 0x00,
            _ => 0xFF,
        }
    }

    fn set_power(&mut self, on: bool) {
        if on == self.is_powered() {
            return;
        }
        if on {
            debug!("APU on");
            self.output.start();
        } else {
            debug!("APU off");
            self.regs[..usize::from(NR52_ADDR - REGS_START)].fill(0);
            self.sample_clock = 0;
            self.output.stop();
        }
    }
}

impl AddressSpace for Sound {
    fn accepts(&self, addr: u16) -> bool {
        matches!(
            addr,
            0xFF10..=0xFF14 | 0xFF16..=0xFF19 | 0xFF1A..=0xFF1E | 0xFF20..=0xFF26 | WAVE_START..=WAVE_END
        )
    }

    fn read(&self, addr: u16) -> u8 {
        self.regs[usize::from(addr - REGS_START)] | Self::read_mask(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        let idx = usize::from(addr - REGS_START);
        if addr == NR52_ADDR {
            self.set_power(value & POWER != 0);
            self.regs[idx] = value & POWER;
            return;
        }
        if !self.is_powered() && !(WAVE_START..=WAVE_END).contains(&addr) {
            return;
        }
        self.regs[idx] = value;
    }
}
