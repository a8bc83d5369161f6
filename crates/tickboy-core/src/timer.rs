use crate::address_space::AddressSpace;
use crate::interrupts::{Interrupt, Interrupts};

// Divider bit feeding the TIMA edge detector for each TAC clock select
// (gbdev.io/pandocs/Timer_Obscure_Behaviour.html).
const FREQ_TO_BIT: [u32; 4] = [9, 3, 5, 7];

// Clocks after an overflow at which the interrupt fires and TIMA reloads.
const OVERFLOW_IRQ_TICK: u8 = 4;
const OVERFLOW_RELOAD_TICK: u8 = 5;
const OVERFLOW_END_TICK: u8 = 6;

pub struct Timer {
    /// 16-bit internal divider counter. DIV register is the upper 8 bits.
    pub div: u16,
    /// Timer counter
    pub tima: u8,
    /// Timer modulo
    pub tma: u8,
    /// Timer control
    pub tac: u8,
    previous_bit: bool,
    /// TIMA wrapped and the reload has not completed yet
    overflow: bool,
    ticks_since_overflow: u8,
    /// Speed divisor seen on the last tick
    speed: u32,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            div: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            previous_bit: false,
            overflow: false,
            ticks_since_overflow: 0,
            speed: 1,
        }
    }

    pub fn tick(&mut self, speed: u32, interrupts: &mut Interrupts) {
        self.speed = speed;
        self.update_div(self.div.wrapping_add(1));
        if !self.overflow {
            return;
        }
        self.ticks_since_overflow += 1;
        match self.ticks_since_overflow {
            OVERFLOW_IRQ_TICK => interrupts.request(Interrupt::Timer),
            OVERFLOW_RELOAD_TICK => self.tima = self.tma,
            OVERFLOW_END_TICK => {
                self.tima = self.tma;
                self.overflow = false;
                self.ticks_since_overflow = 0;
            }
            _ => {}
        }
    }

    fn update_div(&mut self, div: u16) {
        self.div = div;
        // double speed taps one bit higher
        let bit_pos = FREQ_TO_BIT[usize::from(self.tac & 0x03)] + (self.speed - 1);
        let bit = self.div & (1u16 << bit_pos) != 0 && self.tac & 0x04 != 0;
        if !bit && self.previous_bit {
            self.inc_tima();
        }
        self.previous_bit = bit;
    }

    fn inc_tima(&mut self) {
        self.tima = self.tima.wrapping_add(1);
        if self.tima == 0 {
            self.overflow = true;
            self.ticks_since_overflow = 0;
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace for Timer {
    fn accepts(&self, addr: u16) -> bool {
        (0xFF04..=0xFF07).contains(&addr)
    }

    fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => (self.div >> 8) as u8,
            0xFF05 => self.tima,
            0xFF06 => self.tma,
            0xFF07 => self.tac | 0xF8,
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // any write clears the divider, which may clock TIMA
            0xFF04 => self.update_div(0),
            0xFF05 => {
                // ignored once the reload has started
                if self.ticks_since_overflow < OVERFLOW_RELOAD_TICK {
                    self.tima = value;
                    self.overflow = false;
                    self.ticks_since_overflow = 0;
                }
            }
            0xFF06 => self.tma = value,
            0xFF07 => self.tac = value,
            _ => {}
        }
    }
}
